pub mod analytics_dto;
pub mod gateway_dto;
pub mod pending_plan_dto;
pub mod webhook_dto;
