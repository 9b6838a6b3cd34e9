use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{subscriptions::SubscriptionEntity, users::UserEntity};

#[derive(Debug, Clone, Serialize)]
pub struct UserSummaryDto {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub subscription_status: Option<String>,
    pub plan_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserSummaryDto {
    pub fn from_entity(user: UserEntity, subscription: Option<SubscriptionEntity>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            subscription_status: subscription.as_ref().map(|sub| sub.status.clone()),
            plan_type: subscription.map(|sub| sub.plan_type),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub items: Vec<UserSummaryDto>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}
