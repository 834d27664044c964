use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::webhook_log::WebhookStatus;

/// Result of `process_webhook_payment` / `reprocess_webhook_manual`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessOutcome {
    pub status: String,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ProcessOutcome {
    /// Unknown statuses count as failures.
    pub fn webhook_status(&self) -> WebhookStatus {
        self.status.parse().unwrap_or(WebhookStatus::Failed)
    }

    pub fn succeeded(&self) -> bool {
        self.webhook_status() == WebhookStatus::Success
    }
}

/// Result of `activate_pending_plans_batch` for one chunk of ids.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BatchActivation {
    #[serde(default)]
    pub activated_count: i64,
    #[serde(default)]
    pub failed_count: i64,
}

/// Stored procedures owned by the backend. Their business logic (idempotency,
/// transactional activation) lives in the database.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackendRpc: Send + Sync {
    async fn process_webhook_payment(&self, webhook_id: Uuid) -> Result<ProcessOutcome>;

    async fn reprocess_webhook_manual(&self, webhook_id: Uuid) -> Result<ProcessOutcome>;

    /// Activates every pending plan registered under `email`; returns how many were activated.
    async fn activate_pending_plans(&self, email: &str) -> Result<i64>;

    async fn activate_pending_plans_batch(&self, ids: &[Uuid]) -> Result<BatchActivation>;
}

#[derive(Clone)]
pub struct PgRpc {
    pool: PgPool,
}

impl PgRpc {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn call_for_outcome(&self, procedure: &str, webhook_id: Uuid) -> Result<ProcessOutcome> {
        let sql = format!("SELECT {}($1)", procedure);
        let value = sqlx::query_scalar::<_, JsonValue>(&sql)
            .bind(webhook_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::rpc(procedure, e))?;

        serde_json::from_value(value)
            .map_err(|e| Error::rpc(procedure, format!("unexpected result: {}", e)))
    }
}

#[async_trait]
impl BackendRpc for PgRpc {
    #[tracing::instrument(skip(self))]
    async fn process_webhook_payment(&self, webhook_id: Uuid) -> Result<ProcessOutcome> {
        self.call_for_outcome("process_webhook_payment", webhook_id)
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn reprocess_webhook_manual(&self, webhook_id: Uuid) -> Result<ProcessOutcome> {
        self.call_for_outcome("reprocess_webhook_manual", webhook_id)
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn activate_pending_plans(&self, email: &str) -> Result<i64> {
        let activated = sqlx::query_scalar::<_, Option<i32>>("SELECT activate_pending_plans($1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::rpc("activate_pending_plans", e))?;
        Ok(i64::from(activated.unwrap_or(0)))
    }

    #[tracing::instrument(skip(self, ids), fields(ids = ids.len()))]
    async fn activate_pending_plans_batch(&self, ids: &[Uuid]) -> Result<BatchActivation> {
        let value = sqlx::query_scalar::<_, JsonValue>("SELECT activate_pending_plans_batch($1)")
            .bind(ids.to_vec())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::rpc("activate_pending_plans_batch", e))?;

        serde_json::from_value(value).map_err(|e| {
            Error::rpc(
                "activate_pending_plans_batch",
                format!("unexpected result: {}", e),
            )
        })
    }
}
