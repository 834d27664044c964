pub mod analytics_service;
pub mod audit_service;
pub mod export_service;
pub mod normalizer;
pub mod pending_plan_service;
pub mod reconciliation_service;
pub mod rpc_service;
pub mod webhook_service;
