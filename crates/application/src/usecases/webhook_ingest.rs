use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use domain::{
    entities::webhook_events::InsertWebhookEventEntity,
    repositories::{
        integration_settings::IntegrationSettingsRepository,
        webhook_events::WebhookEventRepository,
    },
    value_objects::enums::{providers::Provider, webhook_event_statuses::WebhookEventStatus},
};

use crate::providers::{self, NormalizedWebhook, doppus, hotmart};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("webhook signature verification failed")]
    InvalidSignature,
    #[error("integration is not configured for this provider")]
    NotConfigured,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IngestError {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            IngestError::InvalidSignature => StatusCode::UNAUTHORIZED,
            IngestError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            IngestError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type IngestResult<T> = std::result::Result<T, IngestError>;

#[derive(Debug, PartialEq, Eq)]
pub enum IngestOutcome {
    Received { event_id: Uuid },
    /// The same delivery was already persisted; nothing was written.
    Duplicate,
}

/// Front door of the webhook pipeline: verify, persist exactly once, leave
/// the rest to the worker. Nothing in here mutates a subscription.
pub struct WebhookIngestUseCase<E, I>
where
    E: WebhookEventRepository + Send + Sync,
    I: IntegrationSettingsRepository + Send + Sync,
{
    webhook_event_repo: Arc<E>,
    settings_repo: Arc<I>,
}

impl<E, I> WebhookIngestUseCase<E, I>
where
    E: WebhookEventRepository + Send + Sync,
    I: IntegrationSettingsRepository + Send + Sync,
{
    pub fn new(webhook_event_repo: Arc<E>, settings_repo: Arc<I>) -> Self {
        Self {
            webhook_event_repo,
            settings_repo,
        }
    }

    pub async fn ingest(
        &self,
        provider: Provider,
        signature: Option<&str>,
        body: &[u8],
    ) -> IngestResult<IngestOutcome> {
        let settings = self
            .settings_repo
            .find_by_provider(provider.as_str())
            .await
            .map_err(IngestError::Internal)?;

        let secret = match settings {
            Some(ref settings) if settings.is_active => settings.webhook_secret.clone(),
            _ => None,
        };
        let Some(secret) = secret else {
            warn!(%provider, "webhooks: delivery for unconfigured integration rejected");
            return Err(IngestError::NotConfigured);
        };

        let verified = match provider {
            Provider::Hotmart => hotmart::verify_hottok(&secret, signature),
            Provider::Doppus => doppus::verify_signature(&secret, body, signature),
            Provider::Manual => false,
        };
        if !verified {
            warn!(
                %provider,
                status = IngestError::InvalidSignature.status_code().as_u16(),
                "webhooks: signature verification failed"
            );
            return Err(IngestError::InvalidSignature);
        }

        // The raw payload is persisted even when it cannot be normalized;
        // classification happens at processing time.
        let payload: serde_json::Value = serde_json::from_slice(body).unwrap_or_else(|_| {
            serde_json::json!({ "raw": String::from_utf8_lossy(body) })
        });

        let normalized = match provider {
            Provider::Hotmart => hotmart::parse(&payload).ok(),
            Provider::Doppus => doppus::parse(&payload).ok(),
            Provider::Manual => None,
        }
        .unwrap_or_else(NormalizedWebhook::default);

        let idempotency_key = normalized
            .transaction_id
            .clone()
            .unwrap_or_else(|| providers::fallback_idempotency_key(body));
        let event_type = if normalized.event_type.is_empty() {
            "unknown".to_string()
        } else {
            normalized.event_type.clone()
        };

        let insert_entity = InsertWebhookEventEntity {
            provider: provider.to_string(),
            event_type: event_type.clone(),
            idempotency_key: idempotency_key.clone(),
            payload,
            payer_email: normalized.payer_email.clone(),
            status: WebhookEventStatus::Pending.to_string(),
            attempts: 0,
            run_at: Utc::now(),
        };

        match self
            .webhook_event_repo
            .insert_if_absent(insert_entity)
            .await
            .map_err(IngestError::Internal)?
        {
            Some(event_id) => {
                info!(
                    %provider,
                    %event_id,
                    event_type,
                    idempotency_key,
                    "webhooks: delivery accepted and queued"
                );
                Ok(IngestOutcome::Received { event_id })
            }
            None => {
                info!(
                    %provider,
                    event_type,
                    idempotency_key,
                    "webhooks: duplicate delivery ignored"
                );
                Ok(IngestOutcome::Duplicate)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{
        entities::integration_settings::IntegrationSettingsEntity,
        repositories::{
            integration_settings::MockIntegrationSettingsRepository,
            webhook_events::MockWebhookEventRepository,
        },
    };

    fn hotmart_settings(secret: &str, is_active: bool) -> IntegrationSettingsEntity {
        IntegrationSettingsEntity {
            id: Uuid::new_v4(),
            provider: "hotmart".to_string(),
            client_id: Some("client".to_string()),
            client_secret: Some("secret".to_string()),
            webhook_secret: Some(secret.to_string()),
            is_active,
            updated_at: Utc::now(),
        }
    }

    fn body() -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "event": "PURCHASE_APPROVED",
            "data": {
                "purchase": { "transaction": "HP1" },
                "buyer": { "email": "buyer@example.com" },
                "product": { "id": 1 }
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn rejects_invalid_hottok() {
        let mut settings_repo = MockIntegrationSettingsRepository::new();
        settings_repo
            .expect_find_by_provider()
            .returning(|_| Box::pin(async { Ok(Some(hotmart_settings("right-token", true))) }));
        let mut event_repo = MockWebhookEventRepository::new();
        event_repo.expect_insert_if_absent().never();

        let usecase = WebhookIngestUseCase::new(Arc::new(event_repo), Arc::new(settings_repo));
        let result = usecase
            .ingest(Provider::Hotmart, Some("wrong-token"), &body())
            .await;

        assert!(matches!(result, Err(IngestError::InvalidSignature)));
    }

    #[tokio::test]
    async fn rejects_inactive_integration() {
        let mut settings_repo = MockIntegrationSettingsRepository::new();
        settings_repo
            .expect_find_by_provider()
            .returning(|_| Box::pin(async { Ok(Some(hotmart_settings("token", false))) }));
        let event_repo = MockWebhookEventRepository::new();

        let usecase = WebhookIngestUseCase::new(Arc::new(event_repo), Arc::new(settings_repo));
        let result = usecase.ingest(Provider::Hotmart, Some("token"), &body()).await;

        assert!(matches!(result, Err(IngestError::NotConfigured)));
    }

    #[tokio::test]
    async fn persists_first_delivery_under_transaction_key() {
        let mut settings_repo = MockIntegrationSettingsRepository::new();
        settings_repo
            .expect_find_by_provider()
            .returning(|_| Box::pin(async { Ok(Some(hotmart_settings("token", true))) }));

        let event_id = Uuid::new_v4();
        let mut event_repo = MockWebhookEventRepository::new();
        event_repo
            .expect_insert_if_absent()
            .withf(|entity| {
                entity.idempotency_key == "HP1"
                    && entity.provider == "hotmart"
                    && entity.status == "pending"
                    && entity.payer_email.as_deref() == Some("buyer@example.com")
            })
            .return_once(move |_| Box::pin(async move { Ok(Some(event_id)) }));

        let usecase = WebhookIngestUseCase::new(Arc::new(event_repo), Arc::new(settings_repo));
        let outcome = usecase
            .ingest(Provider::Hotmart, Some("token"), &body())
            .await
            .unwrap();

        assert_eq!(outcome, IngestOutcome::Received { event_id });
    }

    #[tokio::test]
    async fn duplicate_delivery_is_reported_not_requeued() {
        let mut settings_repo = MockIntegrationSettingsRepository::new();
        settings_repo
            .expect_find_by_provider()
            .returning(|_| Box::pin(async { Ok(Some(hotmart_settings("token", true))) }));
        let mut event_repo = MockWebhookEventRepository::new();
        event_repo
            .expect_insert_if_absent()
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = WebhookIngestUseCase::new(Arc::new(event_repo), Arc::new(settings_repo));
        let outcome = usecase
            .ingest(Provider::Hotmart, Some("token"), &body())
            .await
            .unwrap();

        assert_eq!(outcome, IngestOutcome::Duplicate);
    }
}
