//! Service layer for the access token service.
//!
//! # Components
//!
//! - `authenticator` - Token issuance and the create/join authorisation checks
//! - `token_id` - CSPRNG-backed stamped token identifiers

pub mod authenticator;
pub mod token_id;

pub use authenticator::{Authenticator, DocumentAccessAuthoriser};
