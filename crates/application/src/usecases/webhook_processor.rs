use std::sync::Arc;

use anyhow::anyhow;
use chrono::{Duration, Utc};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use domain::{
    entities::{
        subscriptions::{InsertSubscriptionEntity, UpdateSubscriptionEntity},
        users::InsertUserEntity,
        webhook_events::WebhookEventEntity,
    },
    repositories::{
        product_mappings::ProductMappingRepository, subscriptions::SubscriptionRepository,
        users::UserRepository, webhook_events::WebhookEventRepository,
    },
    value_objects::{
        enums::{providers::Provider, subscription_statuses::SubscriptionStatus},
        lifecycle::{self, InvalidTransition, SubscriptionEvent},
    },
};

use crate::providers::{NormalizedWebhook, doppus, hotmart};

/// Attempts per event before the queue marks it dead.
pub const MAX_ATTEMPTS: i32 = 3;

/// Re-reads of the subscription row before a version conflict is handed back
/// to the queue as retryable.
const VERSION_RETRY_LIMIT: usize = 3;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("no payer email in payload")]
    MissingEmail,
    #[error("no user found for payer email {0}")]
    UnknownUser(String),
    #[error("no active product mapping for product {product_id} offer {offer_id:?}")]
    UnknownProduct {
        product_id: String,
        offer_id: Option<String>,
    },
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error("subscription row version conflict")]
    VersionConflict,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ProcessError {
    /// Terminal errors are recorded and never retried; everything else goes
    /// back to the queue with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProcessError::VersionConflict | ProcessError::Internal(_)
        )
    }
}

pub type ProcessResult<T> = std::result::Result<T, ProcessError>;

#[derive(Debug, PartialEq, Eq)]
pub enum ProcessOutcome {
    Applied(SubscriptionStatus),
    /// Informational event; nothing to reconcile.
    Skipped(String),
}

/// Single authority for turning persisted webhook events into subscription
/// state. Runs only inside the worker binary.
pub struct WebhookProcessorUseCase<E, U, S, M>
where
    E: WebhookEventRepository + Send + Sync,
    U: UserRepository + Send + Sync,
    S: SubscriptionRepository + Send + Sync,
    M: ProductMappingRepository + Send + Sync,
{
    webhook_event_repo: Arc<E>,
    user_repo: Arc<U>,
    subscription_repo: Arc<S>,
    product_mapping_repo: Arc<M>,
}

impl<E, U, S, M> WebhookProcessorUseCase<E, U, S, M>
where
    E: WebhookEventRepository + Send + Sync,
    U: UserRepository + Send + Sync,
    S: SubscriptionRepository + Send + Sync,
    M: ProductMappingRepository + Send + Sync,
{
    pub fn new(
        webhook_event_repo: Arc<E>,
        user_repo: Arc<U>,
        subscription_repo: Arc<S>,
        product_mapping_repo: Arc<M>,
    ) -> Self {
        Self {
            webhook_event_repo,
            user_repo,
            subscription_repo,
            product_mapping_repo,
        }
    }

    /// Claims and settles one queued event. Returns `None` when the queue is
    /// empty so the worker loop can sleep.
    pub async fn run_once(&self) -> anyhow::Result<Option<Uuid>> {
        let Some(event) = self.webhook_event_repo.lock_next_pending().await? else {
            return Ok(None);
        };
        let event_id = event.id;

        match self.process_event(&event).await {
            Ok(ProcessOutcome::Applied(status)) => {
                info!(
                    %event_id,
                    provider = event.provider,
                    event_type = event.event_type,
                    new_status = %status,
                    "webhook processor: event applied"
                );
                self.webhook_event_repo.mark_processed(event_id, None).await?;
            }
            Ok(ProcessOutcome::Skipped(reason)) => {
                info!(
                    %event_id,
                    provider = event.provider,
                    event_type = event.event_type,
                    reason,
                    "webhook processor: event skipped"
                );
                self.webhook_event_repo
                    .mark_processed(event_id, Some(&reason))
                    .await?;
            }
            Err(err) if err.is_retryable() => {
                warn!(
                    %event_id,
                    attempts = event.attempts,
                    error = %err,
                    "webhook processor: retryable failure"
                );
                self.webhook_event_repo
                    .mark_retryable_failure(event_id, &err.to_string(), MAX_ATTEMPTS)
                    .await?;
            }
            Err(err) => {
                warn!(
                    %event_id,
                    error = %err,
                    "webhook processor: terminal failure"
                );
                self.webhook_event_repo
                    .mark_terminal_failure(event_id, &err.to_string())
                    .await?;
            }
        }

        Ok(Some(event_id))
    }

    pub async fn process_event(&self, event: &WebhookEventEntity) -> ProcessResult<ProcessOutcome> {
        let provider = Provider::from_str(&event.provider)
            .ok_or_else(|| ProcessError::InvalidPayload(format!("unknown provider {}", event.provider)))?;

        let normalized = match provider {
            Provider::Hotmart => hotmart::parse(&event.payload),
            Provider::Doppus => doppus::parse(&event.payload),
            Provider::Manual => Err(anyhow!("manual events never reach the queue")),
        }
        .map_err(|err| ProcessError::InvalidPayload(err.to_string()))?;

        let Some(action) = normalized.action else {
            return Ok(ProcessOutcome::Skipped(format!(
                "event type {} is informational",
                normalized.event_type
            )));
        };

        let email = normalized
            .payer_email
            .clone()
            .ok_or(ProcessError::MissingEmail)?;

        match action {
            SubscriptionEvent::PurchaseApproved => {
                self.apply_purchase(provider, &email, &normalized).await
            }
            _ => self.apply_lifecycle_event(action, &email, &normalized).await,
        }
    }

    async fn apply_purchase(
        &self,
        provider: Provider,
        email: &str,
        normalized: &NormalizedWebhook,
    ) -> ProcessResult<ProcessOutcome> {
        let product_id = normalized
            .product_id
            .clone()
            .ok_or_else(|| ProcessError::InvalidPayload("purchase without product id".to_string()))?;

        let mapping = self
            .product_mapping_repo
            .find_active(provider.as_str(), &product_id, normalized.offer_id.as_deref())
            .await
            .map_err(ProcessError::Internal)?
            .ok_or_else(|| ProcessError::UnknownProduct {
                product_id: product_id.clone(),
                offer_id: normalized.offer_id.clone(),
            })?;

        let user = self
            .user_repo
            .upsert_by_email(InsertUserEntity {
                email: email.to_string(),
                name: normalized.payer_name.clone(),
            })
            .await
            .map_err(ProcessError::Internal)?;

        let now = Utc::now();
        let ends_at = mapping
            .duration_days
            .map(|days| now + Duration::days(days.into()));
        let lifetime = mapping.duration_days.is_none();

        for _ in 0..VERSION_RETRY_LIMIT {
            let current = self
                .subscription_repo
                .find_by_user_id(user.id)
                .await
                .map_err(ProcessError::Internal)?;

            let current_status = match current.as_ref() {
                Some(subscription) => Some(parse_stored_status(&subscription.status)?),
                None => None,
            };
            let next = lifecycle::next_status(current_status, SubscriptionEvent::PurchaseApproved)?;

            match current {
                None => {
                    self.subscription_repo
                        .insert(InsertSubscriptionEntity {
                            user_id: user.id,
                            plan_type: mapping.plan_type.clone(),
                            provider: provider.to_string(),
                            provider_subscription_id: normalized.provider_subscription_id.clone(),
                            last_transaction_id: normalized.transaction_id.clone(),
                            starts_at: now,
                            ends_at,
                            lifetime,
                            status: next.to_string(),
                            canceled_at: None,
                        })
                        .await
                        .map_err(ProcessError::Internal)?;
                    return Ok(ProcessOutcome::Applied(next));
                }
                Some(subscription) => {
                    let changeset = UpdateSubscriptionEntity {
                        plan_type: Some(mapping.plan_type.clone()),
                        provider: Some(provider.to_string()),
                        provider_subscription_id: Some(
                            normalized.provider_subscription_id.clone(),
                        ),
                        last_transaction_id: Some(normalized.transaction_id.clone()),
                        starts_at: Some(now),
                        ends_at: Some(ends_at),
                        lifetime: Some(lifetime),
                        status: Some(next.to_string()),
                        canceled_at: Some(None),
                        version: Some(subscription.version + 1),
                        updated_at: Some(now),
                    };

                    let updated = self
                        .subscription_repo
                        .update_with_version(subscription.id, subscription.version, changeset)
                        .await
                        .map_err(ProcessError::Internal)?;
                    if updated {
                        return Ok(ProcessOutcome::Applied(next));
                    }
                    // Lost the race; re-read and try again.
                }
            }
        }

        Err(ProcessError::VersionConflict)
    }

    async fn apply_lifecycle_event(
        &self,
        event: SubscriptionEvent,
        email: &str,
        normalized: &NormalizedWebhook,
    ) -> ProcessResult<ProcessOutcome> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await
            .map_err(ProcessError::Internal)?
            .ok_or_else(|| ProcessError::UnknownUser(email.to_string()))?;

        for _ in 0..VERSION_RETRY_LIMIT {
            let subscription = self
                .subscription_repo
                .find_by_user_id(user.id)
                .await
                .map_err(ProcessError::Internal)?
                .ok_or(InvalidTransition { from: None, event })?;

            let current_status = parse_stored_status(&subscription.status)?;
            let next = lifecycle::next_status(Some(current_status), event)?;
            let now = Utc::now();

            let canceled_at = match next {
                SubscriptionStatus::Canceled => Some(Some(now)),
                _ => None,
            };

            let changeset = UpdateSubscriptionEntity {
                status: Some(next.to_string()),
                canceled_at,
                last_transaction_id: normalized
                    .transaction_id
                    .clone()
                    .map(|transaction| Some(transaction)),
                version: Some(subscription.version + 1),
                updated_at: Some(now),
                ..Default::default()
            };

            let updated = self
                .subscription_repo
                .update_with_version(subscription.id, subscription.version, changeset)
                .await
                .map_err(ProcessError::Internal)?;
            if updated {
                return Ok(ProcessOutcome::Applied(next));
            }
        }

        Err(ProcessError::VersionConflict)
    }
}

fn parse_stored_status(value: &str) -> ProcessResult<SubscriptionStatus> {
    SubscriptionStatus::from_str(value)
        .ok_or_else(|| ProcessError::Internal(anyhow!("subscription row has unknown status {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{
        entities::{
            product_mappings::ProductMappingEntity, subscriptions::SubscriptionEntity,
            users::UserEntity,
        },
        repositories::{
            product_mappings::MockProductMappingRepository,
            subscriptions::MockSubscriptionRepository, users::MockUserRepository,
            webhook_events::MockWebhookEventRepository,
        },
    };
    use serde_json::json;

    fn purchase_event(payload: serde_json::Value) -> WebhookEventEntity {
        WebhookEventEntity {
            id: Uuid::new_v4(),
            provider: "hotmart".to_string(),
            event_type: "PURCHASE_APPROVED".to_string(),
            idempotency_key: "HP1".to_string(),
            payload,
            payer_email: Some("buyer@example.com".to_string()),
            status: "processing".to_string(),
            attempts: 0,
            run_at: Utc::now(),
            locked_at: Some(Utc::now()),
            locked_by: Some("worker-test".to_string()),
            error: None,
            received_at: Utc::now(),
            processed_at: None,
        }
    }

    fn approved_payload() -> serde_json::Value {
        json!({
            "event": "PURCHASE_APPROVED",
            "data": {
                "purchase": { "transaction": "HP1", "offer": { "code": "off-1" } },
                "buyer": { "email": "buyer@example.com", "name": "Buyer" },
                "product": { "id": 42 }
            }
        })
    }

    fn monthly_mapping() -> ProductMappingEntity {
        ProductMappingEntity {
            id: Uuid::new_v4(),
            provider: "hotmart".to_string(),
            product_id: "42".to_string(),
            offer_id: Some("off-1".to_string()),
            plan_type: "monthly".to_string(),
            duration_days: Some(30),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn user(id: Uuid) -> UserEntity {
        UserEntity {
            id,
            email: "buyer@example.com".to_string(),
            name: Some("Buyer".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn active_subscription(user_id: Uuid, version: i32) -> SubscriptionEntity {
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id,
            plan_type: "monthly".to_string(),
            provider: "hotmart".to_string(),
            provider_subscription_id: None,
            last_transaction_id: Some("HP0".to_string()),
            starts_at: Utc::now() - Duration::days(10),
            ends_at: Some(Utc::now() + Duration::days(20)),
            lifetime: false,
            status: "active".to_string(),
            canceled_at: None,
            version,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn usecase(
        user_repo: MockUserRepository,
        subscription_repo: MockSubscriptionRepository,
        product_mapping_repo: MockProductMappingRepository,
    ) -> WebhookProcessorUseCase<
        MockWebhookEventRepository,
        MockUserRepository,
        MockSubscriptionRepository,
        MockProductMappingRepository,
    > {
        WebhookProcessorUseCase::new(
            Arc::new(MockWebhookEventRepository::new()),
            Arc::new(user_repo),
            Arc::new(subscription_repo),
            Arc::new(product_mapping_repo),
        )
    }

    #[tokio::test]
    async fn purchase_creates_subscription_for_new_user() {
        let user_id = Uuid::new_v4();

        let mut mapping_repo = MockProductMappingRepository::new();
        mapping_repo
            .expect_find_active()
            .returning(|_, _, _| Box::pin(async { Ok(Some(monthly_mapping())) }));

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_upsert_by_email()
            .withf(|entity| entity.email == "buyer@example.com")
            .returning(move |_| Box::pin(async move { Ok(user(user_id)) }));

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_by_user_id()
            .returning(|_| Box::pin(async { Ok(None) }));
        subscription_repo
            .expect_insert()
            .withf(|entity| {
                entity.status == "active"
                    && entity.plan_type == "monthly"
                    && !entity.lifetime
                    && entity.ends_at.is_some()
                    && entity.last_transaction_id.as_deref() == Some("HP1")
            })
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));

        let usecase = usecase(user_repo, subscription_repo, mapping_repo);
        let outcome = usecase
            .process_event(&purchase_event(approved_payload()))
            .await
            .unwrap();

        assert_eq!(outcome, ProcessOutcome::Applied(SubscriptionStatus::Active));
    }

    #[tokio::test]
    async fn purchase_without_mapping_is_terminal() {
        let mut mapping_repo = MockProductMappingRepository::new();
        mapping_repo
            .expect_find_active()
            .returning(|_, _, _| Box::pin(async { Ok(None) }));

        let mut user_repo = MockUserRepository::new();
        user_repo.expect_upsert_by_email().never();

        let usecase = usecase(user_repo, MockSubscriptionRepository::new(), mapping_repo);
        let err = usecase
            .process_event(&purchase_event(approved_payload()))
            .await
            .unwrap_err();

        assert!(matches!(err, ProcessError::UnknownProduct { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn cancellation_without_subscription_is_terminal() {
        let user_id = Uuid::new_v4();
        let payload = json!({
            "event": "SUBSCRIPTION_CANCELLATION",
            "data": { "buyer": { "email": "buyer@example.com" } }
        });
        let mut event = purchase_event(payload);
        event.event_type = "SUBSCRIPTION_CANCELLATION".to_string();

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .returning(move |_| Box::pin(async move { Ok(Some(user(user_id))) }));

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_by_user_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = usecase(user_repo, subscription_repo, MockProductMappingRepository::new());
        let err = usecase.process_event(&event).await.unwrap_err();

        assert!(matches!(err, ProcessError::InvalidTransition(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn cancellation_marks_subscription_canceled() {
        let user_id = Uuid::new_v4();
        let payload = json!({
            "event": "SUBSCRIPTION_CANCELLATION",
            "data": {
                "purchase": { "transaction": "HP2" },
                "buyer": { "email": "buyer@example.com" }
            }
        });
        let mut event = purchase_event(payload);
        event.event_type = "SUBSCRIPTION_CANCELLATION".to_string();

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .returning(move |_| Box::pin(async move { Ok(Some(user(user_id))) }));

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_by_user_id()
            .returning(move |_| Box::pin(async move { Ok(Some(active_subscription(user_id, 3))) }));
        subscription_repo
            .expect_update_with_version()
            .withf(|_, expected_version, changeset| {
                *expected_version == 3
                    && changeset.status.as_deref() == Some("canceled")
                    && changeset.version == Some(4)
                    && matches!(changeset.canceled_at, Some(Some(_)))
            })
            .returning(|_, _, _| Box::pin(async { Ok(true) }));

        let usecase = usecase(user_repo, subscription_repo, MockProductMappingRepository::new());
        let outcome = usecase.process_event(&event).await.unwrap();

        assert_eq!(outcome, ProcessOutcome::Applied(SubscriptionStatus::Canceled));
    }

    #[tokio::test]
    async fn version_conflict_is_retried_with_fresh_row() {
        let user_id = Uuid::new_v4();

        let mut mapping_repo = MockProductMappingRepository::new();
        mapping_repo
            .expect_find_active()
            .returning(|_, _, _| Box::pin(async { Ok(Some(monthly_mapping())) }));

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_upsert_by_email()
            .returning(move |_| Box::pin(async move { Ok(user(user_id)) }));

        let mut subscription_repo = MockSubscriptionRepository::new();
        let mut version = 0;
        subscription_repo
            .expect_find_by_user_id()
            .times(2)
            .returning(move |_| {
                version += 1;
                let subscription = active_subscription(user_id, version);
                Box::pin(async move { Ok(Some(subscription)) })
            });
        let mut calls = 0;
        subscription_repo
            .expect_update_with_version()
            .times(2)
            .returning(move |_, _, _| {
                calls += 1;
                let updated = calls > 1;
                Box::pin(async move { Ok(updated) })
            });

        let usecase = usecase(user_repo, subscription_repo, mapping_repo);
        let outcome = usecase
            .process_event(&purchase_event(approved_payload()))
            .await
            .unwrap();

        assert_eq!(outcome, ProcessOutcome::Applied(SubscriptionStatus::Active));
    }

    #[tokio::test]
    async fn informational_event_is_skipped() {
        let payload = json!({
            "event": "PURCHASE_OUT_OF_SHOPPING_CART",
            "data": { "buyer": { "email": "buyer@example.com" } }
        });
        let mut event = purchase_event(payload);
        event.event_type = "PURCHASE_OUT_OF_SHOPPING_CART".to_string();

        let usecase = usecase(
            MockUserRepository::new(),
            MockSubscriptionRepository::new(),
            MockProductMappingRepository::new(),
        );
        let outcome = usecase.process_event(&event).await.unwrap();

        assert!(matches!(outcome, ProcessOutcome::Skipped(_)));
    }
}
