pub mod plan_types;
pub mod providers;
pub mod subscription_statuses;
pub mod webhook_event_statuses;
