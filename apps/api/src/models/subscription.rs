use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubscriptionRow {
    pub user_id: Uuid,
    pub stripe_subscription_id: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub stripe_price_id: Option<String>,
    pub stripe_current_period_end: Option<DateTime<Utc>>,
}

impl SubscriptionRow {
    /// Active means a price is attached and the paid period has not ended.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        let has_price = self
            .stripe_price_id
            .as_deref()
            .is_some_and(|price| !price.is_empty());
        let in_period = self
            .stripe_current_period_end
            .is_some_and(|period_end| period_end > now);
        has_price && in_period
    }
}
