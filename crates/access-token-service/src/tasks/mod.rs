//! Background tasks for the access token service.
//!
//! # Tasks
//!
//! - `token_sweeper` - Periodically drops expired tokens so unredeemed ones
//!   do not accumulate between issuances

pub mod token_sweeper;

pub use token_sweeper::start_token_sweeper;
