//! Token generation handlers.
//!
//! Implements the privileged token endpoints:
//!
//! - `POST <path>/create` - Mint a token bound to a user id
//! - `POST <path>/join` - Mint a token bound to a document id
//!
//! # Security
//!
//! - Registered as private routes only; they are served on the admin
//!   listener and never on the public one
//! - Error messages are generic; causes are logged server-side
//! - Issued tokens are never logged in full

use crate::errors::AuthError;
use crate::models::{GenerateTokenRequest, GenerateTokenResponse, TokenAction};
use crate::repositories::token_store::redact;
use crate::routes::registrar::{join_route, EndpointRegistrar, RegistrarError};
use crate::services::Authenticator;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// State bound to one token endpoint.
#[derive(Clone)]
pub struct TokenEndpointState {
    pub authenticator: Arc<Authenticator>,

    /// Action every token minted through this endpoint is tagged with.
    pub action: TokenAction,
}

/// Handler for `<path>/create` and `<path>/join`.
///
/// Mounted with `any` so that non-POST requests get the same JSON error
/// shape as every other failure instead of axum's bare 405.
///
/// # Response
///
/// - 200 OK: `{"token": "<id>"}`
/// - 400 Bad Request: Unreadable or unparseable body, or empty `key_value`
/// - 405 Method Not Allowed: Anything other than POST
/// - 500 Internal Server Error: Token id generation or response encoding failed
#[instrument(skip_all, name = "auth.token.generate")]
pub async fn generate_token(
    State(state): State<TokenEndpointState>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, AuthError> {
    if method != Method::POST {
        tracing::error!(target: "auth.handlers.tokens", method = %method, "Token request with wrong method");
        return Err(AuthError::MethodNotAllowed("POST endpoint only".to_string()));
    }

    let body = body.map_err(|e| {
        tracing::error!(target: "auth.handlers.tokens", error = %e, "Failed to read request body");
        AuthError::BadRequest("could not read body".to_string())
    })?;

    let request: GenerateTokenRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!(target: "auth.handlers.tokens", error = %e, "Failed to parse request body");
        AuthError::BadRequest("could not parse body".to_string())
    })?;

    if request.key_value.is_empty() {
        tracing::error!(target: "auth.handlers.tokens", "Key value not found in request body");
        return Err(AuthError::BadRequest("no key value found".to_string()));
    }

    let token = state
        .authenticator
        .generate_token(state.action, &request.key_value)?;

    // Encoding needs the issued token. If it fails the token is never
    // handed out and is dropped by the sweep once it expires.
    let response_body = serde_json::to_vec(&GenerateTokenResponse {
        token: token.clone(),
    })
    .map_err(|e| {
        tracing::error!(target: "auth.handlers.tokens", error = %e, "Failed to generate JSON response");
        AuthError::Internal("response encoding failed".to_string())
    })?;

    info!(
        target: "auth.handlers.tokens",
        token = %redact(&token),
        action = %state.action,
        "Issued access token"
    );

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        response_body,
    )
        .into_response())
}

/// Register the create and join token endpoints as private routes under
/// the configured path prefix.
///
/// # Errors
///
/// Returns `RegistrarError` if either path is malformed or already taken.
pub fn register_token_endpoints<R: EndpointRegistrar + ?Sized>(
    authenticator: Arc<Authenticator>,
    registrar: &mut R,
) -> Result<(), RegistrarError> {
    let prefix = authenticator.config().path.clone();

    registrar.register_private(
        &join_route(&prefix, "create"),
        r#"Generate an authentication token for creating a new document, POST: {"key_value":"<user_id>"}"#,
        any(generate_token).with_state(TokenEndpointState {
            authenticator: authenticator.clone(),
            action: TokenAction::Create,
        }),
    )?;

    registrar.register_private(
        &join_route(&prefix, "join"),
        r#"Generate an authentication token for joining an existing document, POST: {"key_value":"<document_id>"}"#,
        any(generate_token).with_state(TokenEndpointState {
            authenticator,
            action: TokenAction::Join,
        }),
    )
}
