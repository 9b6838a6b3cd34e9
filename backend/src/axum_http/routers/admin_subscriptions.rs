use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use uuid::Uuid;

use application::usecases::subscription_admin::SubscriptionAdminUseCase;
use domain::{
    repositories::{subscriptions::SubscriptionRepository, users::UserRepository},
    value_objects::subscriptions::{
        NewManualSubscriptionModel, SubscriptionFilter, UpdateSubscriptionModel,
    },
};
use infra::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::{subscriptions::SubscriptionsPostgres, users::UsersPostgres},
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let subscription_repository = SubscriptionsPostgres::new(Arc::clone(&db_pool));
    let user_repository = UsersPostgres::new(Arc::clone(&db_pool));
    let subscription_admin_usecase = SubscriptionAdminUseCase::new(
        Arc::new(subscription_repository),
        Arc::new(user_repository),
    );

    Router::new()
        .route("/", get(list))
        .route("/", post(grant_manual))
        .route("/:subscription_id", get(get_one))
        .route("/:subscription_id", put(update))
        .route("/:subscription_id", delete(remove))
        .with_state(Arc::new(subscription_admin_usecase))
}

pub async fn list<S, U>(
    State(subscription_admin_usecase): State<Arc<SubscriptionAdminUseCase<S, U>>>,
    Query(filter): Query<SubscriptionFilter>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync,
    U: UserRepository + Send + Sync,
{
    match subscription_admin_usecase.list(filter).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}

pub async fn get_one<S, U>(
    State(subscription_admin_usecase): State<Arc<SubscriptionAdminUseCase<S, U>>>,
    Path(subscription_id): Path<Uuid>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync,
    U: UserRepository + Send + Sync,
{
    match subscription_admin_usecase.get(subscription_id).await {
        Ok(subscription) => (StatusCode::OK, Json(subscription)).into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}

pub async fn grant_manual<S, U>(
    State(subscription_admin_usecase): State<Arc<SubscriptionAdminUseCase<S, U>>>,
    Json(new_manual_subscription_model): Json<NewManualSubscriptionModel>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync,
    U: UserRepository + Send + Sync,
{
    match subscription_admin_usecase
        .grant_manual(new_manual_subscription_model)
        .await
    {
        Ok(subscription) => (StatusCode::CREATED, Json(subscription)).into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}

pub async fn update<S, U>(
    State(subscription_admin_usecase): State<Arc<SubscriptionAdminUseCase<S, U>>>,
    Path(subscription_id): Path<Uuid>,
    Json(update_subscription_model): Json<UpdateSubscriptionModel>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync,
    U: UserRepository + Send + Sync,
{
    match subscription_admin_usecase
        .update(subscription_id, update_subscription_model)
        .await
    {
        Ok(subscription) => (StatusCode::OK, Json(subscription)).into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}

pub async fn remove<S, U>(
    State(subscription_admin_usecase): State<Arc<SubscriptionAdminUseCase<S, U>>>,
    Path(subscription_id): Path<Uuid>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync,
    U: UserRepository + Send + Sync,
{
    match subscription_admin_usecase.delete(subscription_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}
