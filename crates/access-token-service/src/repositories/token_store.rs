//! In-memory token store.
//!
//! Holds every issued, unconsumed token keyed by its id. All mutation goes
//! through a single `RwLock`:
//!
//! - `put` and `try_consume` take the write lock for their whole duration.
//!   `try_consume` checks and removes in one critical section, so two callers
//!   racing on the same id can never both observe a valid entry.
//! - `sweep_expired` collects expired ids under the read lock and deletes
//!   them under the write lock. An id consumed between the two phases is
//!   simply absent at delete time, and each id is re-checked before removal
//!   so an entry overwritten in between is left alone.

use crate::clock::Clock;
use crate::models::TokenAction;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// A single live token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenEntry {
    /// Action the token was minted for.
    pub action: TokenAction,

    /// Identifier the token is bound to (user id or document id).
    pub bound_value: String,

    /// Instant at which the token stops authorising.
    pub expires_at: DateTime<Utc>,
}

impl TokenEntry {
    /// An entry is expired once `now` has reached `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Why a consumption attempt was refused. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Unknown,
    Expired,
    ActionMismatch,
    ValueMismatch,
}

impl Rejection {
    fn as_str(self) -> &'static str {
        match self {
            Rejection::Unknown => "unknown",
            Rejection::Expired => "expired",
            Rejection::ActionMismatch => "action_mismatch",
            Rejection::ValueMismatch => "value_mismatch",
        }
    }
}

/// Concurrency-safe holder of the token mapping.
pub struct TokenStore {
    clock: Arc<dyn Clock>,
    tokens: RwLock<HashMap<String, TokenEntry>>,
}

impl TokenStore {
    /// Create an empty store reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a token expiring `ttl` from now, saturating at the latest
    /// representable instant.
    ///
    /// Ids are freshly generated so collisions are not expected; if one does
    /// occur the new entry replaces the old one.
    pub fn put(&self, id: &str, action: TokenAction, bound_value: &str, ttl: Duration) {
        let entry = TokenEntry {
            action,
            bound_value: bound_value.to_string(),
            expires_at: self
                .clock
                .now()
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        if tokens.insert(id.to_string(), entry).is_some() {
            warn!(
                target: "auth.store",
                token = %redact(id),
                "Token id collision, previous entry replaced"
            );
        }
    }

    /// Atomically validate and remove a token.
    ///
    /// Returns `true` only if `id` is present, unexpired, minted for
    /// `action` and bound to exactly `expected_value`; the entry is removed
    /// in the same critical section. Expired entries are dropped when seen.
    /// Entries that fail on action or value stay in place.
    pub fn try_consume(&self, id: &str, action: TokenAction, expected_value: &str) -> bool {
        let now = self.clock.now();
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);

        let rejection = match tokens.get(id) {
            None => Some(Rejection::Unknown),
            Some(entry) if entry.is_expired(now) => Some(Rejection::Expired),
            Some(entry) if entry.action != action => Some(Rejection::ActionMismatch),
            Some(entry) if entry.bound_value != expected_value => Some(Rejection::ValueMismatch),
            Some(_) => None,
        };

        match rejection {
            None => {
                tokens.remove(id);
                true
            }
            Some(reason) => {
                if reason == Rejection::Expired {
                    tokens.remove(id);
                }
                debug!(
                    target: "auth.store",
                    token = %redact(id),
                    action = %action,
                    reason = reason.as_str(),
                    "Token consumption refused"
                );
                false
            }
        }
    }

    /// Remove every entry expired at `now`, returning how many were removed.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let expired: Vec<String> = {
            let tokens = self.tokens.read().unwrap_or_else(PoisonError::into_inner);
            tokens
                .iter()
                .filter(|(_, entry)| entry.is_expired(now))
                .map(|(id, _)| id.clone())
                .collect()
        };

        if expired.is_empty() {
            return 0;
        }

        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        let mut removed = 0;
        for id in &expired {
            let still_expired = tokens.get(id).is_some_and(|entry| entry.is_expired(now));
            if still_expired {
                tokens.remove(id);
                removed += 1;
            }
        }
        removed
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shorten a token id for logging.
///
/// Stamped ids start with a time component; only that prefix is logged.
pub(crate) fn redact(id: &str) -> &str {
    let end = id.find('-').unwrap_or(0);
    id.get(..end).unwrap_or("")
}
