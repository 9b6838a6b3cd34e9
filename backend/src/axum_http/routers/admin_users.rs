use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use application::usecases::subscription_admin::SubscriptionAdminUseCase;
use domain::{
    repositories::{subscriptions::SubscriptionRepository, users::UserRepository},
    value_objects::users::UserFilter,
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
        .with_state(Arc::new(subscription_admin_usecase))
}

pub async fn list<S, U>(
    State(subscription_admin_usecase): State<Arc<SubscriptionAdminUseCase<S, U>>>,
    Query(filter): Query<UserFilter>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync,
    U: UserRepository + Send + Sync,
{
    match subscription_admin_usecase.list_users(filter).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}
