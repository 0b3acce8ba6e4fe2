//! Observability module for the access token service.
//!
//! Provides metrics definitions and instrumentation helpers.

pub mod metrics;
