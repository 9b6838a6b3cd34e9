use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use uuid::Uuid;

use application::usecases::webhook_logs::WebhookLogsUseCase;
use domain::{
    repositories::webhook_events::WebhookEventRepository,
    value_objects::webhook_events::WebhookEventFilter,
};
use infra::postgres::{
    postgres_connection::PgPoolSquad, repositories::webhook_events::WebhookEventsPostgres,
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let webhook_event_repository = WebhookEventsPostgres::new(Arc::clone(&db_pool));
    let webhook_logs_usecase = WebhookLogsUseCase::new(Arc::new(webhook_event_repository));

    Router::new()
        .route("/", get(list))
        .route("/:event_id", get(get_one))
        .route("/:event_id/reprocess", post(reprocess))
        .with_state(Arc::new(webhook_logs_usecase))
}

pub async fn list<E>(
    State(webhook_logs_usecase): State<Arc<WebhookLogsUseCase<E>>>,
    Query(filter): Query<WebhookEventFilter>,
) -> impl IntoResponse
where
    E: WebhookEventRepository + Send + Sync,
{
    match webhook_logs_usecase.list(filter).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}

pub async fn get_one<E>(
    State(webhook_logs_usecase): State<Arc<WebhookLogsUseCase<E>>>,
    Path(event_id): Path<Uuid>,
) -> impl IntoResponse
where
    E: WebhookEventRepository + Send + Sync,
{
    match webhook_logs_usecase.get(event_id).await {
        Ok(event) => (StatusCode::OK, Json(event)).into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}

pub async fn reprocess<E>(
    State(webhook_logs_usecase): State<Arc<WebhookLogsUseCase<E>>>,
    Path(event_id): Path<Uuid>,
) -> impl IntoResponse
where
    E: WebhookEventRepository + Send + Sync,
{
    match webhook_logs_usecase.reprocess(event_id).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "requeued" }))).into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}
