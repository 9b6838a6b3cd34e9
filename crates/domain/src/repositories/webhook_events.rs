use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::entities::webhook_events::{InsertWebhookEventEntity, WebhookEventEntity};
use crate::value_objects::webhook_events::WebhookEventFilter;

#[async_trait]
#[automock]
pub trait WebhookEventRepository {
    /// Inserts the event unless one with the same `(provider,
    /// idempotency_key)` already exists. `None` signals a duplicate delivery.
    async fn insert_if_absent(
        &self,
        insert_webhook_event_entity: InsertWebhookEventEntity,
    ) -> Result<Option<Uuid>>;

    /// Claims the next due `pending` event with `FOR UPDATE SKIP LOCKED` so
    /// concurrent workers never grab the same row.
    async fn lock_next_pending(&self) -> Result<Option<WebhookEventEntity>>;

    async fn mark_processed(&self, event_id: Uuid, note: Option<&str>) -> Result<()>;

    /// Terminal failure: the event will never be retried.
    async fn mark_terminal_failure(&self, event_id: Uuid, error: &str) -> Result<()>;

    /// Retryable failure: requeues with backoff until `max_attempts` is
    /// reached, then marks the event dead.
    async fn mark_retryable_failure(
        &self,
        event_id: Uuid,
        error: &str,
        max_attempts: i32,
    ) -> Result<()>;

    /// Puts a settled event back in the queue for manual reprocessing.
    /// Returns `false` when the event does not exist or is still in flight.
    async fn reset_for_reprocess(&self, event_id: Uuid) -> Result<bool>;

    async fn find_by_id(&self, event_id: Uuid) -> Result<Option<WebhookEventEntity>>;

    async fn find_page(
        &self,
        filter: WebhookEventFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<WebhookEventEntity>, i64)>;
}
