use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde_json::json;
use uuid::Uuid;

use application::usecases::product_mappings::{ProductMappingError, ProductMappingsUseCase};
use domain::{
    repositories::product_mappings::ProductMappingRepository,
    value_objects::{
        enums::providers::Provider,
        product_mappings::{NewProductMappingModel, UpdateProductMappingModel},
    },
};
use infra::postgres::{
    postgres_connection::PgPoolSquad, repositories::product_mappings::ProductMappingsPostgres,
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let product_mapping_repository = ProductMappingsPostgres::new(Arc::clone(&db_pool));
    let product_mappings_usecase =
        ProductMappingsUseCase::new(Arc::new(product_mapping_repository));

    Router::new()
        .route("/:provider/mappings", get(list))
        .route("/:provider/mappings", post(create))
        .route("/:provider/mappings/:mapping_id", put(update))
        .route("/:provider/mappings/:mapping_id", delete(remove))
        .with_state(Arc::new(product_mappings_usecase))
}

fn parse_provider(provider: &str) -> Result<Provider, ProductMappingError> {
    Provider::from_str(provider).ok_or_else(|| {
        ProductMappingError::InvalidInput(format!("unknown provider: {provider}"))
    })
}

pub async fn list<M>(
    State(product_mappings_usecase): State<Arc<ProductMappingsUseCase<M>>>,
    Path(provider): Path<String>,
) -> impl IntoResponse
where
    M: ProductMappingRepository + Send + Sync,
{
    let result = match parse_provider(&provider) {
        Ok(provider) => product_mappings_usecase.list(provider).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(mappings) => (StatusCode::OK, Json(mappings)).into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}

pub async fn create<M>(
    State(product_mappings_usecase): State<Arc<ProductMappingsUseCase<M>>>,
    Path(provider): Path<String>,
    Json(new_product_mapping_model): Json<NewProductMappingModel>,
) -> impl IntoResponse
where
    M: ProductMappingRepository + Send + Sync,
{
    let result = match parse_provider(&provider) {
        Ok(provider) => {
            product_mappings_usecase
                .create(provider, new_product_mapping_model)
                .await
        }
        Err(err) => Err(err),
    };
    match result {
        Ok(mapping_id) => {
            (StatusCode::CREATED, Json(json!({ "id": mapping_id }))).into_response()
        }
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}

pub async fn update<M>(
    State(product_mappings_usecase): State<Arc<ProductMappingsUseCase<M>>>,
    Path((provider, mapping_id)): Path<(String, Uuid)>,
    Json(update_product_mapping_model): Json<UpdateProductMappingModel>,
) -> impl IntoResponse
where
    M: ProductMappingRepository + Send + Sync,
{
    let result = match parse_provider(&provider) {
        Ok(_) => {
            product_mappings_usecase
                .update(mapping_id, update_product_mapping_model)
                .await
        }
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}

pub async fn remove<M>(
    State(product_mappings_usecase): State<Arc<ProductMappingsUseCase<M>>>,
    Path((provider, mapping_id)): Path<(String, Uuid)>,
) -> impl IntoResponse
where
    M: ProductMappingRepository + Send + Sync,
{
    let result = match parse_provider(&provider) {
        Ok(_) => product_mappings_usecase.delete(mapping_id).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}
