use anyhow::{Ok, Result};

use super::config_model::DotEnvyConfig;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let worker_server = super::config_model::WorkerServer {
        port: std::env::var("SERVER_PORT_WORKER")
            .expect("SERVER_PORT_WORKER is invalid")
            .parse()?,
    };

    let worker = super::config_model::Worker {
        poll_interval_secs: std::env::var("WORKER_POLL_INTERVAL")
            .unwrap_or_else(|_| "5".to_string())
            .parse()?,
        expiry_sweep_interval_secs: std::env::var("WORKER_EXPIRY_SWEEP_INTERVAL")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()?,
    };

    let database = super::config_model::Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    Ok(DotEnvyConfig {
        worker_server,
        worker,
        database,
    })
}
