use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::webhook_events;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = webhook_events)]
pub struct WebhookEventEntity {
    pub id: Uuid,
    pub provider: String,
    pub event_type: String,
    pub idempotency_key: String,
    pub payload: serde_json::Value,
    pub payer_email: Option<String>,
    pub status: String,
    pub attempts: i32,
    pub run_at: DateTime<Utc>,
    pub locked_at: Option<DateTime<Utc>>,
    pub locked_by: Option<String>,
    pub error: Option<String>,
    pub received_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = webhook_events)]
pub struct InsertWebhookEventEntity {
    pub provider: String,
    pub event_type: String,
    pub idempotency_key: String,
    pub payload: serde_json::Value,
    pub payer_email: Option<String>,
    pub status: String,
    pub attempts: i32,
    pub run_at: DateTime<Utc>,
}
