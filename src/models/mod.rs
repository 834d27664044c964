pub mod analytics;
pub mod audit_log;
pub mod pending_plan;
pub mod platform;
pub mod webhook_log;
