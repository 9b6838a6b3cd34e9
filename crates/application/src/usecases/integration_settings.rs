use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use domain::{
    entities::integration_settings::InsertIntegrationSettingsEntity,
    repositories::integration_settings::IntegrationSettingsRepository,
    value_objects::{
        enums::providers::Provider,
        integration_settings::{IntegrationSettingsDto, UpdateIntegrationSettingsModel},
    },
};

#[derive(Debug, Error)]
pub enum IntegrationSettingsError {
    #[error("no settings stored for this provider")]
    NotFound,
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntegrationSettingsError {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            IntegrationSettingsError::NotFound => StatusCode::NOT_FOUND,
            IntegrationSettingsError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            IntegrationSettingsError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct IntegrationSettingsUseCase<I>
where
    I: IntegrationSettingsRepository + Send + Sync,
{
    settings_repo: Arc<I>,
}

impl<I> IntegrationSettingsUseCase<I>
where
    I: IntegrationSettingsRepository + Send + Sync,
{
    pub fn new(settings_repo: Arc<I>) -> Self {
        Self { settings_repo }
    }

    /// Returns the stored settings with every secret masked down to its last
    /// four characters.
    pub async fn get(
        &self,
        provider: Provider,
    ) -> Result<IntegrationSettingsDto, IntegrationSettingsError> {
        let settings = self
            .settings_repo
            .find_by_provider(provider.as_str())
            .await
            .map_err(IntegrationSettingsError::Internal)?
            .ok_or(IntegrationSettingsError::NotFound)?;

        Ok(IntegrationSettingsDto::from(settings))
    }

    /// Secret fields omitted from the request keep their stored values, so
    /// `is_active` can be toggled without re-entering credentials.
    pub async fn update(
        &self,
        provider: Provider,
        model: UpdateIntegrationSettingsModel,
    ) -> Result<IntegrationSettingsDto, IntegrationSettingsError> {
        if provider == Provider::Manual {
            return Err(IntegrationSettingsError::InvalidInput(
                "manual subscriptions have no payment integration".to_string(),
            ));
        }

        let stored = self
            .settings_repo
            .find_by_provider(provider.as_str())
            .await
            .map_err(|err| {
                error!(%provider, db_error = ?err, "integration settings: lookup failed");
                IntegrationSettingsError::Internal(err)
            })?;

        let merged = InsertIntegrationSettingsEntity {
            provider: provider.to_string(),
            client_id: model
                .client_id
                .or_else(|| stored.as_ref().and_then(|s| s.client_id.clone())),
            client_secret: model
                .client_secret
                .or_else(|| stored.as_ref().and_then(|s| s.client_secret.clone())),
            webhook_secret: model
                .webhook_secret
                .or_else(|| stored.as_ref().and_then(|s| s.webhook_secret.clone())),
            is_active: model
                .is_active
                .unwrap_or_else(|| stored.as_ref().map(|s| s.is_active).unwrap_or(false)),
        };

        let updated = self
            .settings_repo
            .upsert(merged)
            .await
            .map_err(IntegrationSettingsError::Internal)?;

        info!(%provider, is_active = updated.is_active, "integration settings: updated");
        Ok(IntegrationSettingsDto::from(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::{
        entities::integration_settings::IntegrationSettingsEntity,
        repositories::integration_settings::MockIntegrationSettingsRepository,
    };
    use uuid::Uuid;

    fn stored_settings() -> IntegrationSettingsEntity {
        IntegrationSettingsEntity {
            id: Uuid::new_v4(),
            provider: "hotmart".to_string(),
            client_id: Some("client-abcd".to_string()),
            client_secret: Some("secret-efgh".to_string()),
            webhook_secret: Some("hottok-1234".to_string()),
            is_active: true,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn get_masks_every_secret() {
        let mut repo = MockIntegrationSettingsRepository::new();
        repo.expect_find_by_provider()
            .returning(|_| Box::pin(async { Ok(Some(stored_settings())) }));

        let usecase = IntegrationSettingsUseCase::new(Arc::new(repo));
        let dto = usecase.get(Provider::Hotmart).await.unwrap();

        assert_eq!(dto.webhook_secret.as_deref(), Some("*******1234"));
        assert_eq!(dto.client_secret.as_deref(), Some("*******efgh"));
    }

    #[tokio::test]
    async fn update_keeps_omitted_secrets() {
        let mut repo = MockIntegrationSettingsRepository::new();
        repo.expect_find_by_provider()
            .returning(|_| Box::pin(async { Ok(Some(stored_settings())) }));
        repo.expect_upsert()
            .withf(|entity| {
                entity.webhook_secret.as_deref() == Some("hottok-1234") && !entity.is_active
            })
            .returning(|entity| {
                Box::pin(async move {
                    Ok(IntegrationSettingsEntity {
                        id: Uuid::new_v4(),
                        provider: entity.provider,
                        client_id: entity.client_id,
                        client_secret: entity.client_secret,
                        webhook_secret: entity.webhook_secret,
                        is_active: entity.is_active,
                        updated_at: Utc::now(),
                    })
                })
            });

        let usecase = IntegrationSettingsUseCase::new(Arc::new(repo));
        let dto = usecase
            .update(
                Provider::Hotmart,
                UpdateIntegrationSettingsModel {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!dto.is_active);
    }

    #[tokio::test]
    async fn manual_provider_cannot_be_configured() {
        let usecase =
            IntegrationSettingsUseCase::new(Arc::new(MockIntegrationSettingsRepository::new()));
        let err = usecase
            .update(Provider::Manual, UpdateIntegrationSettingsModel::default())
            .await
            .unwrap_err();
        assert!(matches!(err, IntegrationSettingsError::InvalidInput(_)));
    }
}
