//! Access token service configuration.
//!
//! Configuration is loaded from environment variables. The token settings
//! are also exposed as a serde struct so a host process can embed them in
//! its own configuration file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Default public bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default admin (privileged routes) bind address.
pub const DEFAULT_ADMIN_BIND_ADDRESS: &str = "127.0.0.1:8081";

/// Default token time-to-live in seconds.
pub const DEFAULT_EXPIRY_PERIOD_SECONDS: u64 = 60;

/// Upper bound on the token time-to-live (one day).
pub const MAX_EXPIRY_PERIOD_SECONDS: u64 = 86_400;

/// Default background sweep interval in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 30;

/// Token authenticator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenAuthConfig {
    /// Route prefix under which `create` and `join` are mounted.
    pub path: String,

    /// Token time-to-live in seconds.
    pub expiry_period_s: u64,

    /// Whether document creation may be authorised at all.
    pub allow_create: bool,
}

impl TokenAuthConfig {
    /// Check the settings that are not enforced by their types.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidExpiryPeriod` if `expiry_period_s`
    /// exceeds [`MAX_EXPIRY_PERIOD_SECONDS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.expiry_period_s > MAX_EXPIRY_PERIOD_SECONDS {
            return Err(ConfigError::InvalidExpiryPeriod(format!(
                "expiry period must not exceed {} seconds, got {}",
                MAX_EXPIRY_PERIOD_SECONDS, self.expiry_period_s
            )));
        }
        Ok(())
    }
}

impl Default for TokenAuthConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            expiry_period_s: DEFAULT_EXPIRY_PERIOD_SECONDS,
            allow_create: true,
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Public listener address (health, readiness, metrics).
    pub bind_address: String,

    /// Admin listener address (token generation routes).
    pub admin_bind_address: String,

    /// Token authenticator settings.
    pub token_auth: TokenAuthConfig,

    /// Interval between background expiry sweeps.
    pub sweep_interval_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid expiry period configuration: {0}")]
    InvalidExpiryPeriod(String),

    #[error("Invalid allow_create configuration: {0}")]
    InvalidAllowCreate(String),

    #[error("Invalid sweep interval configuration: {0}")]
    InvalidSweepInterval(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let admin_bind_address = vars
            .get("ADMIN_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_ADMIN_BIND_ADDRESS.to_string());

        let path = vars.get("AUTH_PATH").cloned().unwrap_or_default();

        // Parse token TTL with validation
        let expiry_period_s = if let Some(value_str) = vars.get("AUTH_EXPIRY_PERIOD_S") {
            value_str.parse().map_err(|e| {
                ConfigError::InvalidExpiryPeriod(format!(
                    "AUTH_EXPIRY_PERIOD_S must be a non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?
        } else {
            DEFAULT_EXPIRY_PERIOD_SECONDS
        };

        let allow_create = match vars.get("AUTH_ALLOW_CREATE") {
            Some(value_str) => parse_bool(value_str).ok_or_else(|| {
                ConfigError::InvalidAllowCreate(format!(
                    "AUTH_ALLOW_CREATE must be true or false, got '{}'",
                    value_str
                ))
            })?,
            None => true,
        };

        // Parse sweep interval with validation
        let sweep_interval_seconds =
            if let Some(value_str) = vars.get("AUTH_SWEEP_INTERVAL_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidSweepInterval(format!(
                        "AUTH_SWEEP_INTERVAL_SECONDS must be a valid positive integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value == 0 {
                    return Err(ConfigError::InvalidSweepInterval(
                        "AUTH_SWEEP_INTERVAL_SECONDS must be greater than 0".to_string(),
                    ));
                }

                value
            } else {
                DEFAULT_SWEEP_INTERVAL_SECONDS
            };

        let token_auth = TokenAuthConfig {
            path,
            expiry_period_s,
            allow_create,
        };
        token_auth.validate()?;

        Ok(Config {
            bind_address,
            admin_bind_address,
            token_auth,
            sweep_interval_seconds,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
