pub mod admin_subscriptions;
pub mod admin_users;
pub mod integration_settings;
pub mod product_mappings;
pub mod webhook_logs;
pub mod webhooks;
