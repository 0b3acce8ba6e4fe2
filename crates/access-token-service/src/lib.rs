//! Access Token Service Library
//!
//! Short-lived, single-use authorisation tokens for the collaborative
//! document system. A trusted backend mints a token bound to a user id
//! (document creation) or a document id (joining); the synchronization
//! engine later redeems it exactly once.
//!
//! # Modules
//!
//! - `clock` - Time source abstraction
//! - `config` - Service configuration
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers
//! - `middleware` - HTTP middleware
//! - `models` - Request and response types
//! - `observability` - Prometheus metrics
//! - `repositories` - In-memory token store
//! - `routes` - Router assembly and endpoint registration
//! - `services` - Authenticator and token id generation
//! - `tasks` - Background expiry sweeper

pub mod clock;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod tasks;
