use std::sync::Arc;

use anyhow::Result;
use infra::{
    observability::init_observability,
    postgres::{
        postgres_connection,
        repositories::{
            product_mappings::ProductMappingsPostgres, subscriptions::SubscriptionsPostgres,
            users::UsersPostgres, webhook_events::WebhookEventsPostgres,
        },
    },
};
use tracing::{error, info};
use worker::{axum_http, background_worker, config};

use application::usecases::webhook_processor::WebhookProcessorUseCase;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(err) = run().await {
        error!("Worker exited with error: {}", err);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    init_observability("worker")?;

    let dotenvy_env = Arc::new(config::config_loader::load()?);
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("Postgres connection has been established");

    let db_pool_arc = Arc::new(postgres_pool);

    let webhook_event_repository =
        Arc::new(WebhookEventsPostgres::new(Arc::clone(&db_pool_arc)));
    let user_repository = Arc::new(UsersPostgres::new(Arc::clone(&db_pool_arc)));
    let subscription_repository =
        Arc::new(SubscriptionsPostgres::new(Arc::clone(&db_pool_arc)));
    let product_mapping_repository =
        Arc::new(ProductMappingsPostgres::new(Arc::clone(&db_pool_arc)));

    let webhook_processor_usecase = Arc::new(WebhookProcessorUseCase::new(
        webhook_event_repository,
        user_repository,
        Arc::clone(&subscription_repository),
        product_mapping_repository,
    ));

    let webhook_worker_loop = tokio::spawn(background_worker::webhook_worker::run(
        webhook_processor_usecase,
        dotenvy_env.worker.poll_interval_secs,
    ));

    let expiry_worker_loop = tokio::spawn(background_worker::expiry_worker::run(
        subscription_repository,
        dotenvy_env.worker.expiry_sweep_interval_secs,
    ));

    let server_config = Arc::clone(&dotenvy_env);
    let health_server =
        tokio::spawn(async move { axum_http::http_serve::start(server_config).await });

    tokio::select! {
        result = webhook_worker_loop => result??,
        result = expiry_worker_loop => result??,
        result = health_server => result??,
    };

    Ok(())
}
