use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::{
    config::get_config,
    dto::webhook_dto::IngestResponse,
    error::{Error, Result},
    models::platform::Platform,
    models::webhook_log::WebhookStatus,
    services::normalizer,
    utils::signature::{secrets_match, verify_signature},
    AppState,
};

/// Gateway notification endpoint. Always answers 202 once the log is stored,
/// even when processing fails, so the gateway does not redeliver it.
pub async fn ingest(
    State(state): State<AppState>,
    Path(platform): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<IngestResponse>)> {
    verify_request(&headers, &body)?;
    let platform: Platform = platform.parse().map_err(Error::BadRequest)?;
    let raw: JsonValue = serde_json::from_slice(&body)?;

    let normalized = normalizer::normalize(Some(platform), &raw);
    let log = state
        .webhook_service
        .record(platform, event_type(&raw).as_deref(), &raw, &normalized)
        .await?;
    tracing::info!(
        webhook_id = %log.id,
        %platform,
        payment_status = ?normalized.status,
        products = normalized.products.len(),
        "webhook received"
    );

    let status = match state.rpc.process_webhook_payment(log.id).await {
        Ok(outcome) => {
            let stored = state
                .webhook_service
                .apply_outcome(log.id, &outcome)
                .await
                .map(|updated| updated.status);
            reported_status(log.id, stored, outcome.webhook_status())
        }
        Err(e) => {
            tracing::error!(webhook_id = %log.id, error = %e, "webhook processing failed");
            let stored = state
                .webhook_service
                .mark_failed(log.id, &e.to_string())
                .await
                .map(|()| WebhookStatus::Failed.to_string());
            reported_status(log.id, stored, WebhookStatus::Failed)
        }
    };

    Ok((
        StatusCode::ACCEPTED,
        Json(IngestResponse { id: log.id, status }),
    ))
}

/// The log row already exists, so a failed status write is logged and the
/// gateway still gets its 202.
fn reported_status(webhook_id: Uuid, stored: Result<String>, fallback: WebhookStatus) -> String {
    stored.unwrap_or_else(|e| {
        tracing::error!(webhook_id = %webhook_id, error = %e, "failed to store webhook status");
        fallback.to_string()
    })
}

fn event_type(raw: &JsonValue) -> Option<String> {
    ["event", "type", "event_type"]
        .iter()
        .find_map(|key| raw.get(*key).and_then(JsonValue::as_str))
        .map(str::to_string)
}

fn verify_request(headers: &HeaderMap, body: &[u8]) -> Result<()> {
    let expected = &get_config().webhook_secret;

    if let Some(secret_hdr) = headers.get("x-webhook-secret") {
        let provided = secret_hdr
            .to_str()
            .map_err(|_| Error::Unauthorized("invalid_secret_header".into()))?;
        return if secrets_match(provided, expected) {
            Ok(())
        } else {
            Err(Error::Unauthorized("invalid_webhook_secret".into()))
        };
    }

    if let Some(signature_hdr) = headers.get("x-signature") {
        let signature = signature_hdr
            .to_str()
            .map_err(|_| Error::Unauthorized("invalid_signature_header".into()))?;
        return if verify_signature(body, signature, expected) {
            Ok(())
        } else {
            Err(Error::Unauthorized("invalid_signature".into()))
        };
    }

    Err(Error::Unauthorized("missing_webhook_secret".into()))
}
