pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::services::{
    analytics_service::AnalyticsService,
    audit_service::AuditService,
    pending_plan_service::PendingPlanService,
    reconciliation_service::ReconciliationService,
    rpc_service::{BackendRpc, PgRpc},
    webhook_service::WebhookService,
};

/// Gateway payloads are small; anything larger is rejected before parsing.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub rpc: Arc<dyn BackendRpc>,
    pub webhook_service: WebhookService,
    pub pending_plan_service: PendingPlanService,
    pub reconciliation_service: ReconciliationService,
    pub analytics_service: AnalyticsService,
    pub audit_service: AuditService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let rpc: Arc<dyn BackendRpc> = Arc::new(PgRpc::new(pool.clone()));

        let webhook_service = WebhookService::new(pool.clone(), config.list_fetch_limit);
        let pending_plan_service = PendingPlanService::new(pool.clone(), config.list_fetch_limit);
        let reconciliation_service = ReconciliationService::new(
            rpc.clone(),
            Duration::from_millis(config.batch_delay_ms),
            config.batch_chunk_size,
        );
        let analytics_service = AnalyticsService::new(pool.clone());
        let audit_service = AuditService::new(pool.clone());

        Self {
            pool,
            rpc,
            webhook_service,
            pending_plan_service,
            reconciliation_service,
            analytics_service,
            audit_service,
        }
    }
}

/// Full HTTP surface: health, gateway ingestion and the admin API.
pub fn app_router(state: AppState) -> Router {
    let config = crate::config::get_config();

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let ingest_api = Router::new()
        .route("/api/webhooks/:platform", post(routes::webhook::ingest))
        .layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::new_rps_state(config.ingest_rps),
            middleware::rate_limit::rps_middleware,
        ));

    let admin_api = Router::new()
        .route(
            "/api/admin/webhooks",
            get(routes::webhook_logs::list_webhooks),
        )
        .route(
            "/api/admin/webhooks/stats",
            get(routes::webhook_logs::webhook_stats),
        )
        .route(
            "/api/admin/webhooks/export",
            get(routes::export::export_webhooks),
        )
        .route(
            "/api/admin/webhooks/reprocess",
            post(routes::webhook_logs::reprocess_webhooks),
        )
        .route(
            "/api/admin/webhooks/:id",
            get(routes::webhook_logs::get_webhook)
                .patch(routes::webhook_logs::update_webhook)
                .delete(routes::webhook_logs::delete_webhook),
        )
        .route(
            "/api/admin/webhooks/:id/reprocess",
            post(routes::webhook_logs::reprocess_webhook),
        )
        .route(
            "/api/admin/pending-plans",
            get(routes::pending_plans::list_pending_plans),
        )
        .route(
            "/api/admin/pending-plans/activate",
            post(routes::pending_plans::activate_pending_plans),
        )
        .route(
            "/api/admin/pending-plans/:id",
            get(routes::pending_plans::get_pending_plan)
                .patch(routes::pending_plans::update_pending_plan),
        )
        .route(
            "/api/admin/pending-plans/:id/activate",
            post(routes::pending_plans::activate_pending_plan),
        )
        .route(
            "/api/admin/analytics/overview",
            get(routes::analytics::overview),
        )
        .route_layer(axum::middleware::from_fn(middleware::auth::require_admin))
        .layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::new_rps_state(config.admin_rps),
            middleware::rate_limit::rps_middleware,
        ));

    base_routes
        .merge(ingest_api)
        .merge(admin_api)
        .with_state(state)
        .layer(middleware::cors::admin_cors())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
