use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::{
    dto::webhook_dto::WebhookLogQuery,
    error::Result,
    services::export_service::{ExportService, XLSX_CONTENT_TYPE},
    services::webhook_service::WebhookFilter,
    AppState,
};

/// Export the filtered webhook logs as XLSX. Pagination parameters are ignored.
pub async fn export_webhooks(
    State(state): State<AppState>,
    Query(query): Query<WebhookLogQuery>,
) -> Result<impl IntoResponse> {
    let filter = WebhookFilter::from_query(&query)?;
    let logs = state.webhook_service.filtered(&filter).await?;

    let buffer = ExportService::generate_webhook_logs_xlsx(&logs)?;
    tracing::info!(rows = logs.len(), bytes = buffer.len(), "webhook export generated");

    let filename = format!("webhooks_{}.xlsx", chrono::Utc::now().format("%Y%m%d"));
    let disposition = format!("attachment; filename=\"{}\"", filename);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    ))
}
