use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::webhook_dto::{
        BatchIdsPayload, BatchReprocessResponse, ReprocessResponse, UpdateWebhookLogPayload,
        WebhookLogDetail, WebhookLogQuery, WebhookLogSummary, WebhookStats,
    },
    error::Result,
    middleware::auth::Claims,
    utils::pagination::Page,
    AppState,
};

const ENTITY: &str = "webhook_log";

pub async fn list_webhooks(
    State(state): State<AppState>,
    Query(query): Query<WebhookLogQuery>,
) -> Result<Json<Page<WebhookLogSummary>>> {
    let page = state.webhook_service.list(&query).await?;
    Ok(Json(page.map(WebhookLogSummary::from)))
}

pub async fn webhook_stats(State(state): State<AppState>) -> Result<Json<WebhookStats>> {
    let stats = state.webhook_service.stats().await?;
    Ok(Json(stats))
}

pub async fn get_webhook(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WebhookLogDetail>> {
    let log = state.webhook_service.get_by_id(id).await?;
    Ok(Json(WebhookLogDetail::from(log)))
}

pub async fn update_webhook(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWebhookLogPayload>,
) -> Result<Json<WebhookLogDetail>> {
    payload.validate()?;
    let log = state.webhook_service.update(id, &payload).await?;
    state
        .audit_service
        .record(
            claims.user_id(),
            "webhook_log.update",
            ENTITY,
            id,
            Some(serde_json::to_value(&payload)?),
        )
        .await;
    Ok(Json(WebhookLogDetail::from(log)))
}

pub async fn delete_webhook(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.webhook_service.delete(id).await?;
    tracing::info!(webhook_id = %id, sub = %claims.sub, "webhook log deleted");
    state
        .audit_service
        .record(claims.user_id(), "webhook_log.delete", ENTITY, id, None)
        .await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reprocess_webhook(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReprocessResponse>> {
    // 404 before calling the procedure for an unknown id.
    state.webhook_service.get_by_id(id).await?;

    let outcome = state.reconciliation_service.reprocess_one(id).await?;
    let log = state.webhook_service.apply_outcome(id, &outcome).await?;
    state
        .audit_service
        .record(
            claims.user_id(),
            "webhook_log.reprocess",
            ENTITY,
            id,
            Some(json!({ "status": outcome.status })),
        )
        .await;

    let success = outcome.succeeded();
    let message = outcome.message.clone().unwrap_or_else(|| {
        if success {
            "Webhook reprocessado com sucesso".to_string()
        } else {
            format!("Webhook reprocessado com status {}", outcome.status)
        }
    });
    Ok(Json(ReprocessResponse {
        success,
        message,
        log,
    }))
}

pub async fn reprocess_webhooks(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<BatchIdsPayload>,
) -> Result<Json<BatchReprocessResponse>> {
    payload.validate()?;
    let report = state.reconciliation_service.reprocess_batch(&payload.ids).await;

    for item in &report.items {
        if let Some(outcome) = &item.outcome {
            if let Err(e) = state
                .webhook_service
                .apply_outcome(item.webhook_id, outcome)
                .await
            {
                tracing::warn!(webhook_id = %item.webhook_id, error = %e, "could not store reprocess outcome");
            }
        }
    }

    state
        .audit_service
        .record(
            claims.user_id(),
            "webhook_log.reprocess_batch",
            ENTITY,
            Uuid::nil(),
            Some(json!({
                "submitted": report.submitted,
                "succeeded": report.succeeded,
                "failed": report.failed,
            })),
        )
        .await;

    let message = format!(
        "{} de {} webhooks reprocessados com sucesso",
        report.succeeded, report.submitted
    );
    Ok(Json(BatchReprocessResponse { message, report }))
}
