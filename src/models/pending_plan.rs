use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

pub const PENDING_PLAN_COLUMNS: &str = "id, email, plan_id, amount, status, webhook_log_id, \
     activated_user_id, activated_at, created_at, updated_at";

/// A payment that has not been linked to a registered user yet.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PendingPlan {
    pub id: Uuid,
    pub email: String,
    pub plan_id: String,
    pub amount: Option<i64>,
    pub status: String,
    pub webhook_log_id: Option<Uuid>,
    pub activated_user_id: Option<Uuid>,
    pub activated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PendingPlanStatus {
    Pending,
    Activated,
    Expired,
}

impl PendingPlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PendingPlanStatus::Pending => "pending",
            PendingPlanStatus::Activated => "activated",
            PendingPlanStatus::Expired => "expired",
        }
    }
}

impl Display for PendingPlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PendingPlanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(PendingPlanStatus::Pending),
            "activated" => Ok(PendingPlanStatus::Activated),
            "expired" => Ok(PendingPlanStatus::Expired),
            other => Err(format!("unknown pending plan status '{}'", other)),
        }
    }
}
