pub mod expiry_worker;
pub mod webhook_worker;
