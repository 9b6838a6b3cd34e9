#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub worker_server: WorkerServer,
    pub worker: Worker,
    pub database: Database,
}

#[derive(Debug, Clone)]
pub struct WorkerServer {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct Worker {
    pub poll_interval_secs: u64,
    pub expiry_sweep_interval_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}
