//! HTTP metrics middleware for capturing all request/response metrics
//!
//! Captures metrics for every HTTP response, including framework-level
//! rejections that never reach a handler (404 for unknown paths).

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::observability::metrics::record_http_request;

/// Label used for requests that did not match a registered route.
const UNMATCHED_ENDPOINT: &str = "/other";

/// Middleware that records HTTP request metrics for all responses
///
/// The endpoint label is the matched route template, so label cardinality is
/// bounded by the number of registered routes.
pub async fn http_metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ENDPOINT.to_string());

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status_code = response.status().as_u16();
    record_http_request(&method, &endpoint, status_code, duration);

    response
}
