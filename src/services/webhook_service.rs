use chrono::NaiveDate;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::webhook_dto::{UpdateWebhookLogPayload, WebhookLogQuery, WebhookStats};
use crate::error::{Error, Result};
use crate::models::platform::Platform;
use crate::models::webhook_log::{WebhookLog, WebhookStatus, WEBHOOK_LOG_COLUMNS};
use crate::services::normalizer::NormalizedPayment;
use crate::services::rpc_service::ProcessOutcome;
use crate::utils::money::format_brl;
use crate::utils::pagination::{paginate, Page};
use crate::utils::time::within_dates;

#[derive(Clone)]
pub struct WebhookService {
    pool: PgPool,
    fetch_limit: i64,
}

/// In-memory filter applied to fetched webhook rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhookFilter {
    pub platform: Option<String>,
    pub status: Option<WebhookStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub email: Option<String>,
}

impl WebhookFilter {
    /// Empty values and `all` mean "no filter", except for the email search
    /// where `all` is a literal substring.
    pub fn from_query(query: &WebhookLogQuery) -> Result<Self> {
        let status = selector(query.status.as_deref())
            .map(|s| s.parse::<WebhookStatus>().map_err(Error::BadRequest))
            .transpose()?;

        Ok(Self {
            platform: selector(query.platform.as_deref()),
            status,
            from: query.from,
            to: query.to,
            email: search_term(query.email.as_deref()),
        })
    }

    pub fn matches(&self, log: &WebhookLog) -> bool {
        if let Some(platform) = &self.platform {
            if !log.platform.eq_ignore_ascii_case(platform) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if !log.status.eq_ignore_ascii_case(status.as_str()) {
                return false;
            }
        }
        if !within_dates(log.created_at, self.from, self.to) {
            return false;
        }
        if let Some(needle) = &self.email {
            let haystack = log.customer_email.as_deref().unwrap_or_default().to_lowercase();
            if !haystack.contains(needle.as_str()) {
                return false;
            }
        }
        true
    }
}

pub(crate) fn selector(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
        .map(str::to_lowercase)
}

pub(crate) fn search_term(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

/// Counts per status and platform; the processed amount only includes `success` rows.
pub fn webhook_stats(logs: &[WebhookLog]) -> WebhookStats {
    let mut stats = WebhookStats {
        total: logs.len(),
        ..Default::default()
    };
    for log in logs {
        *stats.by_status.entry(log.status.to_lowercase()).or_insert(0) += 1;
        *stats
            .by_platform
            .entry(log.platform.to_lowercase())
            .or_insert(0) += 1;
        if log.status.eq_ignore_ascii_case(WebhookStatus::Success.as_str()) {
            stats.processed_amount += log.amount.unwrap_or(0);
        }
    }
    stats.processed_amount_display = format_brl(stats.processed_amount);
    stats
}

impl WebhookService {
    pub fn new(pool: PgPool, fetch_limit: i64) -> Self {
        Self {
            pool,
            fetch_limit: fetch_limit.max(1),
        }
    }

    pub async fn record(
        &self,
        platform: Platform,
        event_type: Option<&str>,
        payload: &JsonValue,
        normalized: &NormalizedPayment,
    ) -> Result<WebhookLog> {
        let sql = format!(
            "INSERT INTO webhook_logs (platform, event_type, payload, customer_email, amount, status)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            WEBHOOK_LOG_COLUMNS
        );
        let log = sqlx::query_as::<_, WebhookLog>(&sql)
            .bind(platform.as_str())
            .bind(event_type)
            .bind(payload)
            .bind(normalized.email.as_deref())
            .bind(normalized.amount)
            .bind(WebhookStatus::Received.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(log)
    }

    /// Most recent rows first, capped at the configured fetch limit.
    pub async fn fetch_recent(&self) -> Result<Vec<WebhookLog>> {
        let sql = format!(
            "SELECT {} FROM webhook_logs ORDER BY created_at DESC LIMIT $1",
            WEBHOOK_LOG_COLUMNS
        );
        let rows = sqlx::query_as::<_, WebhookLog>(&sql)
            .bind(self.fetch_limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn filtered(&self, filter: &WebhookFilter) -> Result<Vec<WebhookLog>> {
        let rows = self.fetch_recent().await?;
        Ok(rows.into_iter().filter(|log| filter.matches(log)).collect())
    }

    pub async fn list(&self, query: &WebhookLogQuery) -> Result<Page<WebhookLog>> {
        let filter = WebhookFilter::from_query(query)?;
        let rows = self.filtered(&filter).await?;
        Ok(paginate(rows, query.page, query.per_page))
    }

    pub async fn stats(&self) -> Result<WebhookStats> {
        let rows = self.fetch_recent().await?;
        Ok(webhook_stats(&rows))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<WebhookLog> {
        let sql = format!("SELECT {} FROM webhook_logs WHERE id = $1", WEBHOOK_LOG_COLUMNS);
        let log = sqlx::query_as::<_, WebhookLog>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(log)
    }

    pub async fn update(&self, id: Uuid, payload: &UpdateWebhookLogPayload) -> Result<WebhookLog> {
        let email = payload
            .customer_email
            .as_deref()
            .map(|e| e.trim().to_lowercase());
        let sql = format!(
            "UPDATE webhook_logs
             SET customer_email = COALESCE($2, customer_email),
                 status = COALESCE($3, status),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            WEBHOOK_LOG_COLUMNS
        );
        let log = sqlx::query_as::<_, WebhookLog>(&sql)
            .bind(id)
            .bind(email)
            .bind(payload.status.map(|s| s.as_str()))
            .fetch_one(&self.pool)
            .await?;
        Ok(log)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM webhook_logs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound("Webhook log not found".into()));
        }
        Ok(())
    }

    /// Stores what a processing procedure reported for this log.
    pub async fn apply_outcome(&self, id: Uuid, outcome: &ProcessOutcome) -> Result<WebhookLog> {
        let status = outcome.webhook_status();
        let error_message = match status {
            WebhookStatus::Success => None,
            _ => outcome.message.clone(),
        };
        let sql = format!(
            "UPDATE webhook_logs
             SET status = $2,
                 processed_user_id = COALESCE($3, processed_user_id),
                 error_message = $4,
                 processed_at = NOW(),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            WEBHOOK_LOG_COLUMNS
        );
        let log = sqlx::query_as::<_, WebhookLog>(&sql)
            .bind(id)
            .bind(status.as_str())
            .bind(outcome.user_id)
            .bind(error_message)
            .fetch_one(&self.pool)
            .await?;
        Ok(log)
    }

    pub async fn mark_failed(&self, id: Uuid, message: &str) -> Result<()> {
        sqlx::query(
            "UPDATE webhook_logs SET status = 'failed', error_message = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
