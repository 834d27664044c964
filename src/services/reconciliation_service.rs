use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::services::rpc_service::{BackendRpc, BatchActivation, ProcessOutcome};

/// Tally of one batch activation request.
/// `activated_count + failed_count == submitted` holds after every chunk.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ActivationReport {
    pub submitted: usize,
    pub activated_count: usize,
    pub failed_count: usize,
    pub errors: Vec<String>,
}

impl ActivationReport {
    fn record(&mut self, chunk_len: usize, outcome: Result<BatchActivation>) {
        self.submitted += chunk_len;
        match outcome {
            Ok(result) => {
                let activated = usize::try_from(result.activated_count.max(0))
                    .unwrap_or(usize::MAX)
                    .min(chunk_len);
                self.activated_count += activated;
                self.failed_count += chunk_len - activated;
            }
            Err(err) => {
                self.failed_count += chunk_len;
                self.errors.push(err.to_string());
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReprocessItem {
    pub webhook_id: Uuid,
    pub success: bool,
    pub outcome: Option<ProcessOutcome>,
    pub error: Option<String>,
}

/// `succeeded + failed == submitted`.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ReprocessReport {
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<ReprocessItem>,
}

/// Drives the reconciliation procedures one call at a time, pausing between calls.
#[derive(Clone)]
pub struct ReconciliationService {
    rpc: Arc<dyn BackendRpc>,
    delay: Duration,
    chunk_size: usize,
}

impl ReconciliationService {
    pub fn new(rpc: Arc<dyn BackendRpc>, delay: Duration, chunk_size: usize) -> Self {
        Self {
            rpc,
            delay,
            chunk_size: chunk_size.max(1),
        }
    }

    pub async fn activate_by_email(&self, email: &str) -> Result<i64> {
        let activated = self.rpc.activate_pending_plans(email).await?;
        tracing::info!(email, activated, "pending plans activated by email");
        Ok(activated)
    }

    /// Duplicate ids are submitted once.
    pub async fn activate_batch(&self, ids: &[Uuid]) -> ActivationReport {
        let ids = dedup(ids);
        let mut report = ActivationReport::default();

        for (index, chunk) in ids.chunks(self.chunk_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.delay).await;
            }
            let outcome = self.rpc.activate_pending_plans_batch(chunk).await;
            if let Err(err) = &outcome {
                tracing::warn!(error = %err, chunk = index, size = chunk.len(), "batch activation chunk failed");
            }
            report.record(chunk.len(), outcome);
        }

        tracing::info!(
            submitted = report.submitted,
            activated = report.activated_count,
            failed = report.failed_count,
            "batch activation finished"
        );
        report
    }

    pub async fn reprocess_one(&self, webhook_id: Uuid) -> Result<ProcessOutcome> {
        let outcome = self.rpc.reprocess_webhook_manual(webhook_id).await?;
        tracing::info!(%webhook_id, status = %outcome.status, "webhook reprocessed");
        Ok(outcome)
    }

    pub async fn reprocess_batch(&self, ids: &[Uuid]) -> ReprocessReport {
        let ids = dedup(ids);
        let mut report = ReprocessReport {
            submitted: ids.len(),
            ..Default::default()
        };

        for (index, webhook_id) in ids.iter().copied().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.delay).await;
            }
            let item = match self.rpc.reprocess_webhook_manual(webhook_id).await {
                Ok(outcome) => ReprocessItem {
                    webhook_id,
                    success: outcome.succeeded(),
                    error: None,
                    outcome: Some(outcome),
                },
                Err(err) => {
                    tracing::warn!(error = %err, %webhook_id, "webhook reprocess failed");
                    ReprocessItem {
                        webhook_id,
                        success: false,
                        outcome: None,
                        error: Some(err.to_string()),
                    }
                }
            };
            if item.success {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
            report.items.push(item);
        }

        tracing::info!(
            submitted = report.submitted,
            succeeded = report.succeeded,
            failed = report.failed,
            "batch reprocess finished"
        );
        report
    }
}

fn dedup(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
