//! Prometheus metrics endpoint handler.
//!
//! # Security
//!
//! Served on the public listener without authentication. No token ids or
//! bound values are ever used as labels.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
///
/// Returns Prometheus text format:
/// ```text
/// # TYPE auth_tokens_issued_total counter
/// auth_tokens_issued_total{action="join"} 42
/// ```
#[tracing::instrument(skip_all, name = "auth.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
