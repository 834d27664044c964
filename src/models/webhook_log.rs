use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

pub const WEBHOOK_LOG_COLUMNS: &str = "id, platform, event_type, payload, customer_email, amount, status, \
     processed_user_id, error_message, processed_at, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WebhookLog {
    pub id: Uuid,
    pub platform: String,
    pub event_type: Option<String>,
    pub payload: JsonValue,
    pub customer_email: Option<String>,
    /// Integer cents.
    pub amount: Option<i64>,
    pub status: String,
    pub processed_user_id: Option<Uuid>,
    pub error_message: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStatus {
    Received,
    Success,
    Pending,
    Failed,
}

impl WebhookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookStatus::Received => "received",
            WebhookStatus::Success => "success",
            WebhookStatus::Pending => "pending",
            WebhookStatus::Failed => "failed",
        }
    }
}

impl Display for WebhookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WebhookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "received" => Ok(WebhookStatus::Received),
            "success" => Ok(WebhookStatus::Success),
            "pending" => Ok(WebhookStatus::Pending),
            "failed" => Ok(WebhookStatus::Failed),
            other => Err(format!("unknown webhook status '{}'", other)),
        }
    }
}
