//! API routes

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers::{self, AppState};
use super::middleware::require_basic_auth;

/// Create the API router with the webhook mounted at `webhook_path`
pub fn create_router(state: AppState, webhook_path: &str) -> Router {
    let webhook = Router::new()
        .route(webhook_path, post(handlers::receive_alert))
        .route_layer(from_fn_with_state(state.clone(), require_basic_auth));

    Router::new()
        // Health
        .route("/health", get(handlers::health))

        // Self-monitoring
        .route("/metrics", get(handlers::metrics))

        // Alertmanager webhook
        .merge(webhook)

        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
