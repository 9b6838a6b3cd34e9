use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};

use application::usecases::integration_settings::{
    IntegrationSettingsError, IntegrationSettingsUseCase,
};
use domain::{
    repositories::integration_settings::IntegrationSettingsRepository,
    value_objects::{
        enums::providers::Provider, integration_settings::UpdateIntegrationSettingsModel,
    },
};
use infra::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::integration_settings::IntegrationSettingsPostgres,
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let settings_repository = IntegrationSettingsPostgres::new(Arc::clone(&db_pool));
    let integration_settings_usecase =
        IntegrationSettingsUseCase::new(Arc::new(settings_repository));

    Router::new()
        .route("/:provider", get(get_one))
        .route("/:provider", put(update))
        .with_state(Arc::new(integration_settings_usecase))
}

fn parse_provider(provider: &str) -> Result<Provider, IntegrationSettingsError> {
    Provider::from_str(provider).ok_or_else(|| {
        IntegrationSettingsError::InvalidInput(format!("unknown provider: {provider}"))
    })
}

pub async fn get_one<I>(
    State(integration_settings_usecase): State<Arc<IntegrationSettingsUseCase<I>>>,
    Path(provider): Path<String>,
) -> impl IntoResponse
where
    I: IntegrationSettingsRepository + Send + Sync,
{
    let result = match parse_provider(&provider) {
        Ok(provider) => integration_settings_usecase.get(provider).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}

pub async fn update<I>(
    State(integration_settings_usecase): State<Arc<IntegrationSettingsUseCase<I>>>,
    Path(provider): Path<String>,
    Json(update_integration_settings_model): Json<UpdateIntegrationSettingsModel>,
) -> impl IntoResponse
where
    I: IntegrationSettingsRepository + Send + Sync,
{
    let result = match parse_provider(&provider) {
        Ok(provider) => {
            integration_settings_usecase
                .update(provider, update_integration_settings_model)
                .await
        }
        Err(err) => Err(err),
    };
    match result {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}
