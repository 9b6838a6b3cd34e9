use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use domain::{
    entities::product_mappings::{InsertProductMappingEntity, UpdateProductMappingEntity},
    repositories::product_mappings::ProductMappingRepository,
    value_objects::{
        enums::{plan_types::PlanType, providers::Provider},
        product_mappings::{NewProductMappingModel, ProductMappingDto, UpdateProductMappingModel},
    },
};

#[derive(Debug, Error)]
pub enum ProductMappingError {
    #[error("product mapping not found")]
    NotFound,
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ProductMappingError {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            ProductMappingError::NotFound => StatusCode::NOT_FOUND,
            ProductMappingError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ProductMappingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn validate_duration(
    plan_type: PlanType,
    duration_days: Option<i32>,
) -> Result<(), ProductMappingError> {
    match (plan_type, duration_days) {
        (PlanType::Lifetime, Some(_)) => Err(ProductMappingError::InvalidInput(
            "lifetime mappings must not carry duration_days".to_string(),
        )),
        (PlanType::Lifetime, None) => Ok(()),
        (_, Some(days)) if days > 0 => Ok(()),
        (_, Some(_)) => Err(ProductMappingError::InvalidInput(
            "duration_days must be positive".to_string(),
        )),
        (_, None) => Err(ProductMappingError::InvalidInput(
            "duration_days is required for non-lifetime plans".to_string(),
        )),
    }
}

pub struct ProductMappingsUseCase<M>
where
    M: ProductMappingRepository + Send + Sync,
{
    mapping_repo: Arc<M>,
}

impl<M> ProductMappingsUseCase<M>
where
    M: ProductMappingRepository + Send + Sync,
{
    pub fn new(mapping_repo: Arc<M>) -> Self {
        Self { mapping_repo }
    }

    pub async fn list(
        &self,
        provider: Provider,
    ) -> Result<Vec<ProductMappingDto>, ProductMappingError> {
        let mappings = self
            .mapping_repo
            .list_by_provider(provider.as_str())
            .await
            .map_err(ProductMappingError::Internal)?;

        Ok(mappings.into_iter().map(ProductMappingDto::from).collect())
    }

    pub async fn create(
        &self,
        provider: Provider,
        model: NewProductMappingModel,
    ) -> Result<Uuid, ProductMappingError> {
        if model.product_id.trim().is_empty() {
            return Err(ProductMappingError::InvalidInput(
                "product_id is required".to_string(),
            ));
        }
        validate_duration(model.plan_type, model.duration_days)?;

        let mapping_id = self
            .mapping_repo
            .insert(InsertProductMappingEntity {
                provider: provider.to_string(),
                product_id: model.product_id.trim().to_string(),
                offer_id: model.offer_id,
                plan_type: model.plan_type.to_string(),
                duration_days: model.duration_days,
                is_active: model.is_active,
            })
            .await
            .map_err(ProductMappingError::Internal)?;

        info!(%provider, %mapping_id, "product mappings: mapping created");
        Ok(mapping_id)
    }

    pub async fn update(
        &self,
        mapping_id: Uuid,
        model: UpdateProductMappingModel,
    ) -> Result<(), ProductMappingError> {
        if let Some(plan_type) = model.plan_type {
            // A plan change must carry a consistent duration in the same
            // request; merging against the stored row would hide mismatches.
            let duration = model.duration_days.unwrap_or(None);
            validate_duration(plan_type, duration)?;
        }

        let changeset = UpdateProductMappingEntity {
            product_id: model.product_id,
            offer_id: model.offer_id,
            plan_type: model.plan_type.map(|plan| plan.to_string()),
            duration_days: model.duration_days,
            is_active: model.is_active,
            updated_at: Some(Utc::now()),
        };

        let updated = self
            .mapping_repo
            .update(mapping_id, changeset)
            .await
            .map_err(ProductMappingError::Internal)?;
        if !updated {
            return Err(ProductMappingError::NotFound);
        }

        info!(%mapping_id, "product mappings: mapping updated");
        Ok(())
    }

    pub async fn delete(&self, mapping_id: Uuid) -> Result<(), ProductMappingError> {
        let deleted = self
            .mapping_repo
            .delete(mapping_id)
            .await
            .map_err(ProductMappingError::Internal)?;
        if !deleted {
            return Err(ProductMappingError::NotFound);
        }

        info!(%mapping_id, "product mappings: mapping deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::repositories::product_mappings::MockProductMappingRepository;

    #[tokio::test]
    async fn lifetime_mapping_rejects_duration() {
        let usecase = ProductMappingsUseCase::new(Arc::new(MockProductMappingRepository::new()));
        let err = usecase
            .create(
                Provider::Hotmart,
                NewProductMappingModel {
                    product_id: "123".to_string(),
                    offer_id: None,
                    plan_type: PlanType::Lifetime,
                    duration_days: Some(30),
                    is_active: true,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProductMappingError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn monthly_mapping_requires_duration() {
        let usecase = ProductMappingsUseCase::new(Arc::new(MockProductMappingRepository::new()));
        let err = usecase
            .create(
                Provider::Doppus,
                NewProductMappingModel {
                    product_id: "prod-1".to_string(),
                    offer_id: None,
                    plan_type: PlanType::Monthly,
                    duration_days: None,
                    is_active: true,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProductMappingError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn create_trims_product_id() {
        let mapping_id = Uuid::new_v4();
        let mut repo = MockProductMappingRepository::new();
        repo.expect_insert()
            .withf(|entity| entity.product_id == "123" && entity.plan_type == "annual")
            .return_once(move |_| Box::pin(async move { Ok(mapping_id) }));

        let usecase = ProductMappingsUseCase::new(Arc::new(repo));
        let created = usecase
            .create(
                Provider::Hotmart,
                NewProductMappingModel {
                    product_id: " 123 ".to_string(),
                    offer_id: Some("offer-9".to_string()),
                    plan_type: PlanType::Annual,
                    duration_days: Some(365),
                    is_active: true,
                },
            )
            .await
            .unwrap();
        assert_eq!(created, mapping_id);
    }

    #[tokio::test]
    async fn update_of_missing_mapping_is_not_found() {
        let mut repo = MockProductMappingRepository::new();
        repo.expect_update()
            .returning(|_, _| Box::pin(async { Ok(false) }));

        let usecase = ProductMappingsUseCase::new(Arc::new(repo));
        let err = usecase
            .update(Uuid::new_v4(), UpdateProductMappingModel::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProductMappingError::NotFound));
    }
}
