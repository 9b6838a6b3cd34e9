use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::subscriptions;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscriptions)]
pub struct SubscriptionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_type: String,
    pub provider: String,
    pub provider_subscription_id: Option<String>,
    pub last_transaction_id: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub lifetime: bool,
    pub status: String,
    pub canceled_at: Option<DateTime<Utc>>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subscriptions)]
pub struct InsertSubscriptionEntity {
    pub user_id: Uuid,
    pub plan_type: String,
    pub provider: String,
    pub provider_subscription_id: Option<String>,
    pub last_transaction_id: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub lifetime: bool,
    pub status: String,
    pub canceled_at: Option<DateTime<Utc>>,
}

/// Changeset applied under an optimistic version check. `version` must always
/// be set to `expected_version + 1` by the caller.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = subscriptions)]
pub struct UpdateSubscriptionEntity {
    pub plan_type: Option<String>,
    pub provider: Option<String>,
    pub provider_subscription_id: Option<Option<String>>,
    pub last_transaction_id: Option<Option<String>>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<Option<DateTime<Utc>>>,
    pub lifetime: Option<bool>,
    pub status: Option<String>,
    pub canceled_at: Option<Option<DateTime<Utc>>>,
    pub version: Option<i32>,
    pub updated_at: Option<DateTime<Utc>>,
}
