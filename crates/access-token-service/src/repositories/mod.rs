//! Repository layer for the access token service.
//!
//! Follows the Handler -> Service -> Repository architecture. Tokens live
//! only in process memory; nothing here touches persistent storage.

pub mod token_store;

pub use token_store::{TokenEntry, TokenStore};
