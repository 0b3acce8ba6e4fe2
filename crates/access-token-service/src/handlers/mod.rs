//! HTTP request handlers for the access token service.

pub mod health;
pub mod metrics;
pub mod tokens;

pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;
pub use tokens::{generate_token, register_token_endpoints, TokenEndpointState};
