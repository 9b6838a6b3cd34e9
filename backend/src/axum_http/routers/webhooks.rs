use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use serde_json::json;

use application::usecases::webhook_ingest::{IngestOutcome, WebhookIngestUseCase};
use domain::{
    repositories::{
        integration_settings::IntegrationSettingsRepository,
        webhook_events::WebhookEventRepository,
    },
    value_objects::enums::providers::Provider,
};
use infra::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::{
        integration_settings::IntegrationSettingsPostgres, webhook_events::WebhookEventsPostgres,
    },
};

pub const HOTMART_SIGNATURE_HEADER: &str = "x-hotmart-hottok";
pub const DOPPUS_SIGNATURE_HEADER: &str = "x-doppus-signature";

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let webhook_event_repository = WebhookEventsPostgres::new(Arc::clone(&db_pool));
    let settings_repository = IntegrationSettingsPostgres::new(Arc::clone(&db_pool));
    let webhook_ingest_usecase = WebhookIngestUseCase::new(
        Arc::new(webhook_event_repository),
        Arc::new(settings_repository),
    );

    Router::new()
        .route("/hotmart", post(receive_hotmart))
        .route("/doppus", post(receive_doppus))
        .with_state(Arc::new(webhook_ingest_usecase))
}

pub async fn receive_hotmart<E, I>(
    State(webhook_ingest_usecase): State<Arc<WebhookIngestUseCase<E, I>>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse
where
    E: WebhookEventRepository + Send + Sync,
    I: IntegrationSettingsRepository + Send + Sync,
{
    receive(
        webhook_ingest_usecase,
        Provider::Hotmart,
        header_value(&headers, HOTMART_SIGNATURE_HEADER),
        body,
    )
    .await
}

pub async fn receive_doppus<E, I>(
    State(webhook_ingest_usecase): State<Arc<WebhookIngestUseCase<E, I>>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse
where
    E: WebhookEventRepository + Send + Sync,
    I: IntegrationSettingsRepository + Send + Sync,
{
    receive(
        webhook_ingest_usecase,
        Provider::Doppus,
        header_value(&headers, DOPPUS_SIGNATURE_HEADER),
        body,
    )
    .await
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

async fn receive<E, I>(
    webhook_ingest_usecase: Arc<WebhookIngestUseCase<E, I>>,
    provider: Provider,
    signature: Option<String>,
    body: Bytes,
) -> axum::response::Response
where
    E: WebhookEventRepository + Send + Sync,
    I: IntegrationSettingsRepository + Send + Sync,
{
    match webhook_ingest_usecase
        .ingest(provider, signature.as_deref(), &body)
        .await
    {
        Ok(IngestOutcome::Received { event_id }) => (
            StatusCode::OK,
            Json(json!({ "status": "received", "event_id": event_id })),
        )
            .into_response(),
        Ok(IngestOutcome::Duplicate) => {
            (StatusCode::OK, Json(json!({ "status": "duplicate" }))).into_response()
        }
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}
