//! SelempangKu API - REST backend for custom graduation sash orders.
//!
//! Customers register with an emailed OTP, order personalised sashes and
//! upload bank transfer proofs; admins verify payments, move orders through
//! production and shipping, and read sales reports.
//!
//! # Architecture
//!
//! - Axum JSON API with bearer-token (HS256 JWT) authentication
//! - `PostgreSQL` via sqlx runtime queries
//! - Order and payment state machines in `selempangku-core`
//! - Uploaded images on local disk, served under `/uploads`

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, Method, Request, StatusCode, header},
    routing::get,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use state::AppState;

/// Largest accepted request body: a 5 MB image plus form fields.
pub const MAX_BODY_BYTES: usize = 6 * 1024 * 1024;

/// CORS restricted to the browser client's origin.
fn cors_layer(frontend_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!(error = %e, "FRONTEND_URL is not a valid origin; CORS disabled");
            layer
        }
    }
}

/// Build the full application router.
///
/// Sentry layers are added by the binary so tests can use the router alone.
pub fn app(state: AppState) -> Router {
    let uploads = ServeDir::new(state.uploads().root());
    let cors = cors_layer(&state.config().frontend_url);

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes(state.config().trust_proxy_headers))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .layer(cors)
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
