use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use domain::{
    repositories::webhook_events::WebhookEventRepository,
    value_objects::webhook_events::{
        WebhookEventDetailDto, WebhookEventFilter, WebhookEventPage, WebhookEventSummaryDto,
    },
};

use crate::usecases::subscription_admin::page_bounds;

#[derive(Debug, Error)]
pub enum WebhookLogError {
    #[error("webhook event not found")]
    NotFound,
    #[error("event has not settled yet and cannot be reprocessed")]
    NotSettled,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl WebhookLogError {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            WebhookLogError::NotFound => StatusCode::NOT_FOUND,
            WebhookLogError::NotSettled => StatusCode::CONFLICT,
            WebhookLogError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct WebhookLogsUseCase<E>
where
    E: WebhookEventRepository + Send + Sync,
{
    webhook_event_repo: Arc<E>,
}

impl<E> WebhookLogsUseCase<E>
where
    E: WebhookEventRepository + Send + Sync,
{
    pub fn new(webhook_event_repo: Arc<E>) -> Self {
        Self { webhook_event_repo }
    }

    pub async fn list(
        &self,
        filter: WebhookEventFilter,
    ) -> Result<WebhookEventPage, WebhookLogError> {
        let (page, page_size, offset) = page_bounds(filter.page, filter.page_size);

        let (rows, total) = self
            .webhook_event_repo
            .find_page(filter, page_size, offset)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "webhook logs: failed to page events");
                WebhookLogError::Internal(err)
            })?;

        Ok(WebhookEventPage {
            items: rows.into_iter().map(WebhookEventSummaryDto::from).collect(),
            total,
            page,
            page_size,
        })
    }

    pub async fn get(&self, event_id: Uuid) -> Result<WebhookEventDetailDto, WebhookLogError> {
        let event = self
            .webhook_event_repo
            .find_by_id(event_id)
            .await
            .map_err(WebhookLogError::Internal)?
            .ok_or(WebhookLogError::NotFound)?;

        Ok(WebhookEventDetailDto::from(event))
    }

    /// Requeues a settled event. Events still pending or held by a worker are
    /// refused so the queue never gains a second in-flight copy.
    pub async fn reprocess(&self, event_id: Uuid) -> Result<(), WebhookLogError> {
        if self
            .webhook_event_repo
            .find_by_id(event_id)
            .await
            .map_err(WebhookLogError::Internal)?
            .is_none()
        {
            return Err(WebhookLogError::NotFound);
        }

        let reset = self
            .webhook_event_repo
            .reset_for_reprocess(event_id)
            .await
            .map_err(WebhookLogError::Internal)?;
        if !reset {
            return Err(WebhookLogError::NotSettled);
        }

        info!(%event_id, "webhook logs: event requeued for reprocessing");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::{
        entities::webhook_events::WebhookEventEntity,
        repositories::webhook_events::MockWebhookEventRepository,
    };

    fn dead_event(id: Uuid) -> WebhookEventEntity {
        WebhookEventEntity {
            id,
            provider: "hotmart".to_string(),
            event_type: "PURCHASE_APPROVED".to_string(),
            idempotency_key: "HP1".to_string(),
            payload: serde_json::json!({"event": "PURCHASE_APPROVED"}),
            payer_email: Some("buyer@example.com".to_string()),
            status: "dead".to_string(),
            attempts: 3,
            run_at: Utc::now(),
            locked_at: None,
            locked_by: None,
            error: Some("version conflict".to_string()),
            received_at: Utc::now(),
            processed_at: None,
        }
    }

    #[tokio::test]
    async fn reprocess_requeues_dead_event() {
        let event_id = Uuid::new_v4();
        let mut repo = MockWebhookEventRepository::new();
        repo.expect_find_by_id()
            .returning(move |id| Box::pin(async move { Ok(Some(dead_event(id))) }));
        repo.expect_reset_for_reprocess()
            .withf(move |id| *id == event_id)
            .returning(|_| Box::pin(async { Ok(true) }));

        let usecase = WebhookLogsUseCase::new(Arc::new(repo));
        assert!(usecase.reprocess(event_id).await.is_ok());
    }

    #[tokio::test]
    async fn reprocess_refuses_in_flight_event() {
        let mut repo = MockWebhookEventRepository::new();
        repo.expect_find_by_id()
            .returning(move |id| Box::pin(async move { Ok(Some(dead_event(id))) }));
        repo.expect_reset_for_reprocess()
            .returning(|_| Box::pin(async { Ok(false) }));

        let usecase = WebhookLogsUseCase::new(Arc::new(repo));
        let err = usecase.reprocess(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, WebhookLogError::NotSettled));
    }

    #[tokio::test]
    async fn reprocess_of_unknown_event_is_not_found() {
        let mut repo = MockWebhookEventRepository::new();
        repo.expect_find_by_id()
            .returning(|_| Box::pin(async { Ok(None) }));
        repo.expect_reset_for_reprocess().never();

        let usecase = WebhookLogsUseCase::new(Arc::new(repo));
        let err = usecase.reprocess(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, WebhookLogError::NotFound));
    }
}
