pub mod analytics;
pub mod export;
pub mod health;
pub mod pending_plans;
pub mod webhook;
pub mod webhook_logs;
