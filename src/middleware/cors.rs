use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// The admin panel is served from another origin and sends bearer tokens.
pub fn admin_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(Any)
        .expose_headers([header::CONTENT_DISPOSITION])
}
