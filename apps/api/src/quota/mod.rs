//! Free-tier usage gating.
//!
//! Each identity is either under the free-tier ceiling or at it. Active
//! subscribers bypass the ceiling and are never metered.
//!
//! Known limitation: the check happens before the model call and the increment
//! after it, so concurrent requests for one identity can each pass the check
//! and push the count past the ceiling by the number of requests in flight.
//! The increment itself is atomic in the store, so no use is ever lost.

pub mod postgres;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::usage::UsageRecord;

/// Per-identity usage counters.
#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn get_usage(&self, user_id: Uuid) -> Result<Option<UsageRecord>>;

    /// Creates the record with count 1 if absent, otherwise adds 1.
    /// Returns the new count.
    async fn increment_usage(&self, user_id: Uuid) -> Result<i32>;
}

/// Read-only view of subscription state, owned by the billing side.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn is_subscribed(&self, user_id: Uuid) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaState {
    UnderLimit,
    AtLimit,
}

/// Outcome of a quota check, kept by the pipeline so it can decide whether to meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaDecision {
    pub count: i32,
    pub state: QuotaState,
    pub subscribed: bool,
}

impl QuotaDecision {
    pub fn allowed(&self) -> bool {
        self.subscribed || self.state == QuotaState::UnderLimit
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageSummary {
    pub count: i32,
    pub limit: i32,
    pub remaining: i32,
    pub subscribed: bool,
    pub state: QuotaState,
}

pub struct QuotaGate {
    usage: Arc<dyn UsageStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    ceiling: i32,
}

impl QuotaGate {
    pub fn new(
        usage: Arc<dyn UsageStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        ceiling: i32,
    ) -> Self {
        Self {
            usage,
            subscriptions,
            ceiling,
        }
    }

    pub fn ceiling(&self) -> i32 {
        self.ceiling
    }

    /// Reads the current count and subscription flag for `user_id`.
    pub async fn evaluate(&self, user_id: Uuid) -> Result<QuotaDecision> {
        let count = self
            .usage
            .get_usage(user_id)
            .await?
            .map(|record| record.count)
            .unwrap_or(0);
        let subscribed = self.subscriptions.is_subscribed(user_id).await?;

        let state = if count < self.ceiling {
            QuotaState::UnderLimit
        } else {
            QuotaState::AtLimit
        };

        debug!(
            "Quota for user {user_id}: count={count}, ceiling={}, subscribed={subscribed}",
            self.ceiling
        );

        Ok(QuotaDecision {
            count,
            state,
            subscribed,
        })
    }

    /// Records one successful analysis against the free tier.
    pub async fn record_use(&self, user_id: Uuid) -> Result<i32> {
        let count = self.usage.increment_usage(user_id).await?;
        info!("Recorded free-tier use for user {user_id}: {count}/{}", self.ceiling);
        Ok(count)
    }

    pub async fn summary(&self, user_id: Uuid) -> Result<UsageSummary> {
        let decision = self.evaluate(user_id).await?;
        Ok(UsageSummary {
            count: decision.count,
            limit: self.ceiling,
            remaining: (self.ceiling - decision.count).max(0),
            subscribed: decision.subscribed,
            state: decision.state,
        })
    }
}
