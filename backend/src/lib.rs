pub mod axum_http;
pub mod config;

use std::sync::Arc;

use anyhow::Result;
use infra::{observability::init_observability, postgres::postgres_connection};
use tracing::info;

pub async fn run() -> Result<()> {
    init_observability("backend")?;

    let dotenvy_env = config::config_loader::load()?;
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("Postgres connection has been established");

    axum_http::http_serve::start(Arc::new(dotenvy_env), Arc::new(postgres_pool)).await?;

    Ok(())
}
