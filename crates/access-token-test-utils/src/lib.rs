//! # Access Token Test Utilities
//!
//! Shared test utilities for the access token service.
//!
//! This crate provides:
//! - Server test harness (`TestTokenServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use access_token_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestTokenServer::spawn().await?;
//!
//!     let token = server.request_token("create", "alice").await?;
//!     assert!(server.authenticator().authorise_create(&token, "alice"));
//!     Ok(())
//! }
//! ```

pub mod server_harness;

// Re-export commonly used items
pub use server_harness::*;
