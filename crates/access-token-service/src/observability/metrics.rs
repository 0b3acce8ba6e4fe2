//! Metrics definitions for the access token service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `auth_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `action`: 2 values (create, join)
//! - `outcome`: 2 values (granted, denied)
//! - `endpoint`: registered route templates, everything else is `/other`
//! - `status`: 3 values (success, error, timeout)
//!
//! Token ids and bound values are never used as labels.

use crate::models::TokenAction;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("auth_http_request".to_string()),
            &[
                0.001, 0.002, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `auth_http_requests_total`, `auth_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status` / `status_code`
///
/// `endpoint` must already be a route template (see `http_metrics_middleware`).
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let status = categorize_status_code(status_code);

    histogram!("auth_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("auth_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => endpoint.to_string(),
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

// ============================================================================
// Token Lifecycle Metrics
// ============================================================================

/// Record a token issuance.
///
/// Metric: `auth_tokens_issued_total`
/// Labels: `action`
pub fn record_token_issued(action: TokenAction) {
    counter!("auth_tokens_issued_total", "action" => action.as_str()).increment(1);
}

/// Record the outcome of an authorisation check.
///
/// Metric: `auth_token_authorisations_total`
/// Labels: `action`, `outcome` (granted, denied)
///
/// The denial reason is deliberately not a label; it is only visible in
/// debug logs.
pub fn record_authorisation(action: TokenAction, granted: bool) {
    let outcome = if granted { "granted" } else { "denied" };
    counter!("auth_token_authorisations_total",
        "action" => action.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record tokens removed by an expiry sweep.
///
/// Metric: `auth_tokens_swept_total`
pub fn record_tokens_swept(count: usize) {
    if count > 0 {
        counter!("auth_tokens_swept_total").increment(count as u64);
    }
}

/// Set the number of tokens currently held.
///
/// Metric: `auth_tokens_live`
pub fn set_live_tokens(count: usize) {
    gauge!("auth_tokens_live").set(count as f64);
}
