use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::subscription::SubscriptionRow;
use crate::models::usage::UsageRecord;
use crate::quota::{SubscriptionStore, UsageStore};

/// Usage counters in `user_api_limits`, one row per user.
#[derive(Clone)]
pub struct PgUsageStore {
    pool: PgPool,
}

impl PgUsageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageStore for PgUsageStore {
    async fn get_usage(&self, user_id: Uuid) -> Result<Option<UsageRecord>> {
        let record = sqlx::query_as::<_, UsageRecord>(
            "SELECT user_id, count, created_at, updated_at FROM user_api_limits WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn increment_usage(&self, user_id: Uuid) -> Result<i32> {
        // Single statement so concurrent increments never overwrite each other
        let count: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO user_api_limits (user_id, count)
            VALUES ($1, 1)
            ON CONFLICT (user_id)
            DO UPDATE SET count = user_api_limits.count + 1, updated_at = now()
            RETURNING count
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

/// Subscription state in `user_subscriptions`, written by the billing webhook.
#[derive(Clone)]
pub struct PgSubscriptionStore {
    pool: PgPool,
}

impl PgSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    async fn is_subscribed(&self, user_id: Uuid) -> Result<bool> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT user_id, stripe_subscription_id, stripe_customer_id,
                   stripe_price_id, stripe_current_period_end
            FROM user_subscriptions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some_and(|sub| sub.is_active(Utc::now())))
    }
}
