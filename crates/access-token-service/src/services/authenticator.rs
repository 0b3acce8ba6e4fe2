//! Token authenticator.
//!
//! Binds the [`TokenStore`] to configuration and exposes issuance plus the
//! two authorisation checks used by the document session flow.
//!
//! # Security
//!
//! - Token ids come from the system CSPRNG (see `token_id`)
//! - Every token is single use and bound to one action and one identifier
//! - Authorisation outcomes are plain booleans; "unknown", "expired",
//!   "mismatch" and "creation disabled" are indistinguishable to callers

use crate::clock::Clock;
use crate::config::{ConfigError, TokenAuthConfig};
use crate::errors::AuthError;
use crate::models::TokenAction;
use crate::observability::metrics;
use crate::repositories::token_store::TokenStore;
use crate::services::token_id::generate_token_id;
use chrono::Duration;
use ring::rand::SystemRandom;
use std::sync::Arc;
use tracing::{debug, info};

/// Authorisation checks consumed by the document session flow.
///
/// The synchronization engine calls these before admitting a client; it
/// only ever sees a yes/no answer.
pub trait DocumentAccessAuthoriser: Send + Sync {
    /// Consume `token` to authorise `user_id` creating a new document.
    fn authorise_create(&self, token: &str, user_id: &str) -> bool;

    /// Consume `token` to authorise joining document `document_id`.
    fn authorise_join(&self, token: &str, document_id: &str) -> bool;
}

/// Issues and redeems single-use access tokens.
pub struct Authenticator {
    config: TokenAuthConfig,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    store: TokenStore,
    rng: SystemRandom,
}

impl Authenticator {
    /// Create an authenticator with its own empty store.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidExpiryPeriod` if the configured expiry
    /// period is out of range.
    pub fn new(config: TokenAuthConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;
        let ttl = i64::try_from(config.expiry_period_s)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                ConfigError::InvalidExpiryPeriod(format!(
                    "expiry period of {} seconds is not representable",
                    config.expiry_period_s
                ))
            })?;

        info!(
            target: "auth.services.authenticator",
            path = %config.path,
            expiry_period_s = config.expiry_period_s,
            allow_create = config.allow_create,
            "Token authenticator initialised"
        );

        Ok(Self {
            config,
            ttl,
            store: TokenStore::new(clock.clone()),
            clock,
            rng: SystemRandom::new(),
        })
    }

    /// Authenticator settings.
    pub fn config(&self) -> &TokenAuthConfig {
        &self.config
    }

    /// Mint a token for `action` bound to `bound_value`.
    ///
    /// Runs an opportunistic expiry sweep after the insert.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if a token id cannot be generated.
    pub fn generate_token(&self, action: TokenAction, bound_value: &str) -> Result<String, AuthError> {
        let token = generate_token_id(&self.rng, self.clock.now())?;

        self.store.put(&token, action, bound_value, self.ttl);
        metrics::record_token_issued(action);

        self.sweep_expired();

        Ok(token)
    }

    /// Remove expired tokens, returning how many were dropped.
    pub fn sweep_expired(&self) -> usize {
        let removed = self.store.sweep_expired(self.clock.now());
        metrics::record_tokens_swept(removed);
        metrics::set_live_tokens(self.store.len());

        if removed > 0 {
            debug!(
                target: "auth.services.authenticator",
                removed,
                "Swept expired tokens"
            );
        }
        removed
    }

    /// Number of tokens currently held.
    pub fn live_tokens(&self) -> usize {
        self.store.len()
    }

    fn consume(&self, token: &str, action: TokenAction, expected_value: &str) -> bool {
        let granted = self.store.try_consume(token, action, expected_value);
        metrics::record_authorisation(action, granted);
        if granted {
            metrics::set_live_tokens(self.store.len());
        }
        granted
    }
}

impl DocumentAccessAuthoriser for Authenticator {
    fn authorise_create(&self, token: &str, user_id: &str) -> bool {
        if !self.config.allow_create {
            debug!(
                target: "auth.services.authenticator",
                "Document creation is disabled, refusing create authorisation"
            );
            metrics::record_authorisation(TokenAction::Create, false);
            return false;
        }

        self.consume(token, TokenAction::Create, user_id)
    }

    fn authorise_join(&self, token: &str, document_id: &str) -> bool {
        self.consume(token, TokenAction::Join, document_id)
    }
}
