use std::sync::Arc;

use chrono::{Duration, Utc};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use domain::{
    entities::{
        subscriptions::{InsertSubscriptionEntity, UpdateSubscriptionEntity},
        users::InsertUserEntity,
    },
    repositories::{subscriptions::SubscriptionRepository, users::UserRepository},
    value_objects::{
        enums::{
            plan_types::PlanType, providers::Provider,
            subscription_statuses::SubscriptionStatus,
        },
        lifecycle::{self, InvalidTransition, SubscriptionEvent},
        subscriptions::{
            NewManualSubscriptionModel, SubscriptionDto, SubscriptionFilter, SubscriptionPage,
            UpdateSubscriptionModel,
        },
        users::{UserFilter, UserPage, UserSummaryDto},
    },
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("subscription not found")]
    NotFound,
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error("subscription was modified concurrently, retry")]
    Conflict,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AdminError {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            AdminError::NotFound => StatusCode::NOT_FOUND,
            AdminError::InvalidInput(_) | AdminError::InvalidTransition(_) => {
                StatusCode::BAD_REQUEST
            }
            AdminError::Conflict => StatusCode::CONFLICT,
            AdminError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type AdminResult<T> = std::result::Result<T, AdminError>;

pub fn page_bounds(page: Option<i64>, page_size: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, page_size, (page - 1) * page_size)
}

pub struct SubscriptionAdminUseCase<S, U>
where
    S: SubscriptionRepository + Send + Sync,
    U: UserRepository + Send + Sync,
{
    subscription_repo: Arc<S>,
    user_repo: Arc<U>,
}

impl<S, U> SubscriptionAdminUseCase<S, U>
where
    S: SubscriptionRepository + Send + Sync,
    U: UserRepository + Send + Sync,
{
    pub fn new(subscription_repo: Arc<S>, user_repo: Arc<U>) -> Self {
        Self {
            subscription_repo,
            user_repo,
        }
    }

    pub async fn list(&self, filter: SubscriptionFilter) -> AdminResult<SubscriptionPage> {
        let (page, page_size, offset) = page_bounds(filter.page, filter.page_size);

        let (rows, total) = self
            .subscription_repo
            .find_page(filter, page_size, offset)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "admin subscriptions: failed to page subscriptions");
                AdminError::Internal(err)
            })?;

        Ok(SubscriptionPage {
            items: rows
                .into_iter()
                .map(|(entity, email)| SubscriptionDto::from_entity(entity, email))
                .collect(),
            total,
            page,
            page_size,
        })
    }

    pub async fn get(&self, subscription_id: Uuid) -> AdminResult<SubscriptionDto> {
        let subscription = self
            .subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(AdminError::Internal)?
            .ok_or(AdminError::NotFound)?;

        let email = self
            .user_repo
            .find_by_id(subscription.user_id)
            .await
            .map_err(AdminError::Internal)?
            .map(|user| user.email)
            .unwrap_or_default();

        Ok(SubscriptionDto::from_entity(subscription, email))
    }

    /// Grants access from the admin panel without a payment event. Reuses the
    /// purchase transition so a manual grant obeys the same lifecycle rules
    /// as a webhook purchase.
    pub async fn grant_manual(
        &self,
        model: NewManualSubscriptionModel,
    ) -> AdminResult<SubscriptionDto> {
        let email = model.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AdminError::InvalidInput(
                "a valid user email is required".to_string(),
            ));
        }

        let duration_days = match (model.plan_type, model.duration_days) {
            (PlanType::Lifetime, _) => None,
            (_, Some(days)) if days > 0 => Some(days),
            (_, Some(_)) => {
                return Err(AdminError::InvalidInput(
                    "duration_days must be positive".to_string(),
                ));
            }
            (_, None) => {
                return Err(AdminError::InvalidInput(
                    "duration_days is required for non-lifetime plans".to_string(),
                ));
            }
        };

        let user = self
            .user_repo
            .upsert_by_email(InsertUserEntity {
                email: email.clone(),
                name: model.name.clone(),
            })
            .await
            .map_err(AdminError::Internal)?;

        let now = Utc::now();
        let ends_at = duration_days.map(|days| now + Duration::days(days.into()));
        let lifetime = duration_days.is_none();

        let existing = self
            .subscription_repo
            .find_by_user_id(user.id)
            .await
            .map_err(AdminError::Internal)?;

        let current_status = existing
            .as_ref()
            .and_then(|subscription| SubscriptionStatus::from_str(&subscription.status));
        let next = lifecycle::next_status(current_status, SubscriptionEvent::PurchaseApproved)?;

        let subscription_id = match existing {
            None => {
                self.subscription_repo
                    .insert(InsertSubscriptionEntity {
                        user_id: user.id,
                        plan_type: model.plan_type.to_string(),
                        provider: Provider::Manual.to_string(),
                        provider_subscription_id: None,
                        last_transaction_id: None,
                        starts_at: now,
                        ends_at,
                        lifetime,
                        status: next.to_string(),
                        canceled_at: None,
                    })
                    .await
                    .map_err(AdminError::Internal)?
            }
            Some(subscription) => {
                let changeset = UpdateSubscriptionEntity {
                    plan_type: Some(model.plan_type.to_string()),
                    provider: Some(Provider::Manual.to_string()),
                    provider_subscription_id: Some(None),
                    last_transaction_id: Some(None),
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
                    .map_err(AdminError::Internal)?;
                if !updated {
                    warn!(
                        subscription_id = %subscription.id,
                        "admin subscriptions: manual grant lost a concurrent write"
                    );
                    return Err(AdminError::Conflict);
                }
                subscription.id
            }
        };

        info!(
            %subscription_id,
            user_email = email,
            plan_type = %model.plan_type,
            "admin subscriptions: manual grant applied"
        );

        self.get(subscription_id).await
    }

    pub async fn update(
        &self,
        subscription_id: Uuid,
        model: UpdateSubscriptionModel,
    ) -> AdminResult<SubscriptionDto> {
        let subscription = self
            .subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(AdminError::Internal)?
            .ok_or(AdminError::NotFound)?;

        let now = Utc::now();
        let mut changeset = UpdateSubscriptionEntity {
            version: Some(subscription.version + 1),
            updated_at: Some(now),
            ..Default::default()
        };

        if let Some(target) = model.status {
            let current = SubscriptionStatus::from_str(&subscription.status);
            if current != Some(target) {
                let next = lifecycle::next_status(current, event_for_target(target))?;
                changeset.status = Some(next.to_string());
                changeset.canceled_at = match next {
                    SubscriptionStatus::Canceled => Some(Some(now)),
                    _ => Some(None),
                };
            }
        }
        if let Some(plan_type) = model.plan_type {
            changeset.plan_type = Some(plan_type.to_string());
        }
        if let Some(ends_at) = model.ends_at {
            changeset.ends_at = Some(Some(ends_at));
            changeset.lifetime = Some(false);
        }
        if model.lifetime == Some(true) {
            changeset.ends_at = Some(None);
            changeset.lifetime = Some(true);
        }

        let updated = self
            .subscription_repo
            .update_with_version(subscription.id, subscription.version, changeset)
            .await
            .map_err(AdminError::Internal)?;
        if !updated {
            return Err(AdminError::Conflict);
        }

        info!(%subscription_id, "admin subscriptions: subscription updated");
        self.get(subscription_id).await
    }

    pub async fn delete(&self, subscription_id: Uuid) -> AdminResult<()> {
        let deleted = self
            .subscription_repo
            .delete(subscription_id)
            .await
            .map_err(AdminError::Internal)?;
        if !deleted {
            return Err(AdminError::NotFound);
        }
        info!(%subscription_id, "admin subscriptions: subscription deleted");
        Ok(())
    }

    pub async fn list_users(&self, filter: UserFilter) -> AdminResult<UserPage> {
        let (page, page_size, offset) = page_bounds(filter.page, filter.page_size);

        let (rows, total) = self
            .user_repo
            .list_with_subscription(filter, page_size, offset)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "admin subscriptions: failed to page users");
                AdminError::Internal(err)
            })?;

        Ok(UserPage {
            items: rows
                .into_iter()
                .map(|(user, subscription)| UserSummaryDto::from_entity(user, subscription))
                .collect(),
            total,
            page,
            page_size,
        })
    }
}

/// The admin panel edits status directly; each target status corresponds to
/// exactly one lifecycle event so the shared transition table still applies.
fn event_for_target(target: SubscriptionStatus) -> SubscriptionEvent {
    match target {
        SubscriptionStatus::Active => SubscriptionEvent::PurchaseApproved,
        SubscriptionStatus::PastDue => SubscriptionEvent::PaymentOverdue,
        SubscriptionStatus::Canceled => SubscriptionEvent::Canceled,
        SubscriptionStatus::Expired => SubscriptionEvent::Expired,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{
        entities::{subscriptions::SubscriptionEntity, users::UserEntity},
        repositories::{subscriptions::MockSubscriptionRepository, users::MockUserRepository},
    };

    fn subscription(user_id: Uuid, status: &str, version: i32) -> SubscriptionEntity {
        SubscriptionEntity {
            id: Uuid::new_v4(),
            user_id,
            plan_type: "monthly".to_string(),
            provider: "hotmart".to_string(),
            provider_subscription_id: None,
            last_transaction_id: None,
            starts_at: Utc::now(),
            ends_at: Some(Utc::now() + Duration::days(30)),
            lifetime: false,
            status: status.to_string(),
            canceled_at: None,
            version,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn manual_grant_requires_valid_email() {
        let usecase = SubscriptionAdminUseCase::new(
            Arc::new(MockSubscriptionRepository::new()),
            Arc::new(MockUserRepository::new()),
        );

        let err = usecase
            .grant_manual(NewManualSubscriptionModel {
                email: "not-an-email".to_string(),
                name: None,
                plan_type: PlanType::Monthly,
                duration_days: Some(30),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AdminError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn manual_lifetime_grant_ignores_duration() {
        let user_id = Uuid::new_v4();
        let subscription_id = Uuid::new_v4();

        let mut user_repo = MockUserRepository::new();
        user_repo.expect_upsert_by_email().returning(move |entity| {
            Box::pin(async move {
                Ok(UserEntity {
                    id: user_id,
                    email: entity.email,
                    name: entity.name,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                })
            })
        });
        user_repo.expect_find_by_id().returning(move |_| {
            Box::pin(async move {
                Ok(Some(UserEntity {
                    id: user_id,
                    email: "vip@example.com".to_string(),
                    name: None,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                }))
            })
        });

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_by_user_id()
            .returning(|_| Box::pin(async { Ok(None) }));
        subscription_repo
            .expect_insert()
            .withf(|entity| entity.lifetime && entity.ends_at.is_none() && entity.provider == "manual")
            .returning(move |_| Box::pin(async move { Ok(subscription_id) }));
        let mut granted = subscription(user_id, "active", 0);
        granted.id = subscription_id;
        granted.lifetime = true;
        granted.ends_at = None;
        subscription_repo
            .expect_find_by_id()
            .returning(move |_| {
                let granted = granted.clone();
                Box::pin(async move { Ok(Some(granted)) })
            });

        let usecase =
            SubscriptionAdminUseCase::new(Arc::new(subscription_repo), Arc::new(user_repo));
        let dto = usecase
            .grant_manual(NewManualSubscriptionModel {
                email: "VIP@example.com".to_string(),
                name: None,
                plan_type: PlanType::Lifetime,
                duration_days: Some(30),
            })
            .await
            .unwrap();

        assert!(dto.lifetime);
        assert_eq!(dto.user_email, "vip@example.com");
    }

    #[tokio::test]
    async fn status_update_goes_through_the_state_machine() {
        let user_id = Uuid::new_v4();
        let existing = subscription(user_id, "expired", 1);
        let existing_id = existing.id;

        let mut subscription_repo = MockSubscriptionRepository::new();
        let lookup = existing.clone();
        subscription_repo
            .expect_find_by_id()
            .returning(move |_| {
                let lookup = lookup.clone();
                Box::pin(async move { Ok(Some(lookup)) })
            });
        subscription_repo.expect_update_with_version().never();

        let usecase = SubscriptionAdminUseCase::new(
            Arc::new(subscription_repo),
            Arc::new(MockUserRepository::new()),
        );

        // expired -> past_due is not a transition the lifecycle allows.
        let err = usecase
            .update(
                existing_id,
                UpdateSubscriptionModel {
                    status: Some(SubscriptionStatus::PastDue),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AdminError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn concurrent_update_is_reported_as_conflict() {
        let user_id = Uuid::new_v4();
        let existing = subscription(user_id, "active", 5);
        let existing_id = existing.id;

        let mut subscription_repo = MockSubscriptionRepository::new();
        subscription_repo
            .expect_find_by_id()
            .returning(move |_| {
                let existing = existing.clone();
                Box::pin(async move { Ok(Some(existing)) })
            });
        subscription_repo
            .expect_update_with_version()
            .withf(|_, expected_version, _| *expected_version == 5)
            .returning(|_, _, _| Box::pin(async { Ok(false) }));

        let usecase = SubscriptionAdminUseCase::new(
            Arc::new(subscription_repo),
            Arc::new(MockUserRepository::new()),
        );

        let err = usecase
            .update(
                existing_id,
                UpdateSubscriptionModel {
                    status: Some(SubscriptionStatus::Canceled),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AdminError::Conflict));
    }
}
