//! Access token service models.
//!
//! Contains data types shared by the store, the authenticator and the
//! HTTP handlers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The privileged action a token was minted for.
///
/// Recorded at issuance from the route the token was requested on and
/// checked again at consumption, so a token minted for one action can never
/// be redeemed through the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenAction {
    /// Creating a new document; the bound value is a user identifier.
    Create,

    /// Joining an existing document; the bound value is a document identifier.
    Join,
}

impl TokenAction {
    /// Returns the string representation of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenAction::Create => "create",
            TokenAction::Join => "join",
        }
    }
}

impl fmt::Display for TokenAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Token API Models
// ============================================================================

/// Request body for the token generation endpoints.
///
/// `key_value` carries the user id (create) or document id (join) the
/// token is bound to. A missing field deserializes to an empty string and
/// is rejected by the handler.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateTokenRequest {
    #[serde(default)]
    pub key_value: String,
}

/// Response body for the token generation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateTokenResponse {
    /// Issued token identifier.
    pub token: String,
}

/// Readiness check response.
///
/// Returned by the `/ready` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Service status ("ready").
    pub status: String,

    /// Number of tokens currently held in memory (including expired ones
    /// not yet swept).
    pub live_tokens: usize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_action_as_str() {
        assert_eq!(TokenAction::Create.as_str(), "create");
        assert_eq!(TokenAction::Join.as_str(), "join");
        assert_eq!(TokenAction::Join.to_string(), "join");
    }

    #[test]
    fn test_generate_token_request_missing_key_defaults_to_empty() {
        let request: GenerateTokenRequest = serde_json::from_str("{}").unwrap();
        assert!(request.key_value.is_empty());
    }

    #[test]
    fn test_generate_token_request_ignores_unknown_fields() {
        let request: GenerateTokenRequest =
            serde_json::from_str(r#"{"key_value":"doc42","extra":true}"#).unwrap();
        assert_eq!(request.key_value, "doc42");
    }

    #[test]
    fn test_generate_token_request_rejects_wrong_type() {
        let result: Result<GenerateTokenRequest, _> = serde_json::from_str(r#"{"key_value":42}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_generate_token_response_shape() {
        let response = GenerateTokenResponse {
            token: "abc".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, serde_json::json!({"token": "abc"}));
    }
}
