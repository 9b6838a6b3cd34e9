use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entities::webhook_events::WebhookEventEntity,
    value_objects::enums::{providers::Provider, webhook_event_statuses::WebhookEventStatus},
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEventFilter {
    pub provider: Option<Provider>,
    pub status: Option<WebhookEventStatus>,
    pub email: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Row shape for the admin webhook log list; the raw payload is only exposed
/// on the detail endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookEventSummaryDto {
    pub id: Uuid,
    pub provider: String,
    pub event_type: String,
    pub payer_email: Option<String>,
    pub status: String,
    pub attempts: i32,
    pub error: Option<String>,
    pub received_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<WebhookEventEntity> for WebhookEventSummaryDto {
    fn from(entity: WebhookEventEntity) -> Self {
        Self {
            id: entity.id,
            provider: entity.provider,
            event_type: entity.event_type,
            payer_email: entity.payer_email,
            status: entity.status,
            attempts: entity.attempts,
            error: entity.error,
            received_at: entity.received_at,
            processed_at: entity.processed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookEventDetailDto {
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

impl From<WebhookEventEntity> for WebhookEventDetailDto {
    fn from(entity: WebhookEventEntity) -> Self {
        Self {
            id: entity.id,
            provider: entity.provider,
            event_type: entity.event_type,
            idempotency_key: entity.idempotency_key,
            payload: entity.payload,
            payer_email: entity.payer_email,
            status: entity.status,
            attempts: entity.attempts,
            run_at: entity.run_at,
            locked_at: entity.locked_at,
            locked_by: entity.locked_by,
            error: entity.error,
            received_at: entity.received_at,
            processed_at: entity.processed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookEventPage {
    pub items: Vec<WebhookEventSummaryDto>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}
