//! API handlers for the HTTP endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use bytes::Bytes;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::AuthConfig;
use crate::dispatch::DispatchQueue;
use crate::models::WebhookPayload;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Background dispatch queue
    pub queue: DispatchQueue,
    /// Webhook basic authentication settings
    pub auth: Arc<AuthConfig>,
    /// Prometheus recorder handle, when installed
    pub metrics: Option<PrometheusHandle>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Accept an Alertmanager webhook.
///
/// Answers `204` as soon as the payload decodes and is queued. Sending
/// happens afterwards on a dispatch worker, so provider failures never reach
/// the caller.
pub async fn receive_alert(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, (StatusCode, String)> {
    metrics::counter!("smsrelay_webhooks_received_total").increment(1);

    let payload = WebhookPayload::from_slice(&body).map_err(|e| {
        error!(error = %e, "Failed to parse content");
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;

    let alerts = payload.alerts.len();
    state.queue.submit(payload).map_err(|e| {
        warn!(error = %e, alerts, "Webhook not queued");
        (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
    })?;

    info!(alerts, "Webhook accepted");
    Ok(StatusCode::NO_CONTENT)
}

/// Prometheus exposition of the relay's counters
pub async fn metrics(State(state): State<AppState>) -> Result<String, (StatusCode, String)> {
    state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .ok_or((
            StatusCode::NOT_FOUND,
            "Metrics recorder not installed".to_string(),
        ))
}
