use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entities::subscriptions::SubscriptionEntity,
    value_objects::enums::{
        plan_types::PlanType, providers::Provider, subscription_statuses::SubscriptionStatus,
    },
};

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_email: String,
    pub plan_type: String,
    pub provider: String,
    pub provider_subscription_id: Option<String>,
    pub last_transaction_id: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub lifetime: bool,
    pub status: String,
    pub canceled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionDto {
    pub fn from_entity(entity: SubscriptionEntity, user_email: String) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            user_email,
            plan_type: entity.plan_type,
            provider: entity.provider,
            provider_subscription_id: entity.provider_subscription_id,
            last_transaction_id: entity.last_transaction_id,
            starts_at: entity.starts_at,
            ends_at: entity.ends_at,
            lifetime: entity.lifetime,
            status: entity.status,
            canceled_at: entity.canceled_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionFilter {
    pub status: Option<SubscriptionStatus>,
    pub provider: Option<Provider>,
    pub plan_type: Option<PlanType>,
    /// Free-text search over the owning user's email and name.
    pub search: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionPage {
    pub items: Vec<SubscriptionDto>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

/// Manual grant made from the admin panel. `duration_days == None` together
/// with a `Lifetime` plan type means access never expires.
#[derive(Debug, Clone, Deserialize)]
pub struct NewManualSubscriptionModel {
    pub email: String,
    pub name: Option<String>,
    pub plan_type: PlanType,
    pub duration_days: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSubscriptionModel {
    pub status: Option<SubscriptionStatus>,
    pub plan_type: Option<PlanType>,
    pub ends_at: Option<DateTime<Utc>>,
    pub lifetime: Option<bool>,
}
