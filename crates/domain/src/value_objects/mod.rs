pub mod enums;
pub mod integration_settings;
pub mod lifecycle;
pub mod product_mappings;
pub mod subscriptions;
pub mod users;
pub mod webhook_events;
