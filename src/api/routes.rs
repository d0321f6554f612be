//! Route configuration.

use crate::api::{handlers, middleware};
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

/// Creates the API router.
///
/// The two gated endpoints are POST-only; other methods answer 405. The
/// rate-limit layer runs inside the security-header layer so even 429s
/// carry the security headers.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Chart analysis
        .route("/api/analyze", post(handlers::analyze_chart))
        // License activation
        .route("/api/activate", post(handlers::activate_license))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit_middleware,
        ))
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .with_state(state)
}
