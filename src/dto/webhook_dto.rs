use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

use crate::models::platform::Platform;
use crate::models::webhook_log::{WebhookLog, WebhookStatus};
use crate::services::normalizer::{self, NormalizedPayment};
use crate::services::reconciliation_service::ReprocessReport;
use crate::utils::money::format_brl;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WebhookLogQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub platform: Option<String>,
    pub status: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateWebhookLogPayload {
    #[validate(email)]
    pub customer_email: Option<String>,
    pub status: Option<WebhookStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BatchIdsPayload {
    #[validate(length(min = 1, max = 500))]
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookLogSummary {
    pub id: Uuid,
    pub platform: String,
    pub event_type: Option<String>,
    pub customer_email: Option<String>,
    pub amount: Option<i64>,
    pub amount_display: Option<String>,
    pub status: String,
    pub product_titles: Vec<String>,
    pub processed_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookLogDetail {
    pub log: WebhookLog,
    pub amount_display: Option<String>,
    pub normalized: NormalizedPayment,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReprocessResponse {
    pub success: bool,
    pub message: String,
    pub log: WebhookLog,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReprocessResponse {
    pub message: String,
    #[serde(flatten)]
    pub report: ReprocessReport,
}

#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct WebhookStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_platform: BTreeMap<String, usize>,
    /// Sum of amounts of successfully processed logs, in cents.
    pub processed_amount: i64,
    pub processed_amount_display: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub id: Uuid,
    pub status: String,
}

fn normalized_view(log: &WebhookLog) -> NormalizedPayment {
    normalizer::normalize(log.platform.parse::<Platform>().ok(), &log.payload)
}

impl From<WebhookLog> for WebhookLogSummary {
    fn from(value: WebhookLog) -> Self {
        let normalized = normalized_view(&value);
        Self {
            id: value.id,
            platform: value.platform,
            event_type: value.event_type,
            customer_email: value.customer_email.or(normalized.email),
            amount: value.amount.or(normalized.amount),
            amount_display: value.amount.or(normalized.amount).map(format_brl),
            status: value.status,
            product_titles: normalized.products.into_iter().map(|p| p.title).collect(),
            processed_user_id: value.processed_user_id,
            created_at: value.created_at,
        }
    }
}

impl From<WebhookLog> for WebhookLogDetail {
    fn from(value: WebhookLog) -> Self {
        Self {
            amount_display: value.amount.map(format_brl),
            normalized: normalized_view(&value),
            log: value,
        }
    }
}
