use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::pending_plan::PendingPlan;
use crate::services::reconciliation_service::ActivationReport;
use crate::utils::money::format_brl;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PendingPlanQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdatePendingPlanPayload {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingPlanResponse {
    pub id: Uuid,
    pub email: String,
    pub plan_id: String,
    pub amount: Option<i64>,
    pub amount_display: Option<String>,
    pub status: String,
    pub webhook_log_id: Option<Uuid>,
    pub activated_user_id: Option<Uuid>,
    pub activated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivationResponse {
    pub activated_count: i64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchActivationResponse {
    pub message: String,
    #[serde(flatten)]
    pub report: ActivationReport,
}

impl From<PendingPlan> for PendingPlanResponse {
    fn from(value: PendingPlan) -> Self {
        Self {
            id: value.id,
            email: value.email,
            plan_id: value.plan_id,
            amount: value.amount,
            amount_display: value.amount.map(format_brl),
            status: value.status,
            webhook_log_id: value.webhook_log_id,
            activated_user_id: value.activated_user_id,
            activated_at: value.activated_at,
            created_at: value.created_at,
        }
    }
}
