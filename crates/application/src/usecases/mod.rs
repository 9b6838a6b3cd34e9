pub mod integration_settings;
pub mod product_mappings;
pub mod subscription_admin;
pub mod webhook_ingest;
pub mod webhook_logs;
pub mod webhook_processor;
