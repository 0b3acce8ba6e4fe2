//! Health check handlers.
//!
//! - `/health`: Liveness probe - returns OK if the process is running
//! - `/ready`: Readiness probe - reports the in-memory token count
//!
//! The service has no external dependencies, so readiness only confirms the
//! token store is reachable (its lock is not wedged).

use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;

/// Liveness probe handler.
///
/// Does NOT check anything; failure means the process is hung.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
#[tracing::instrument(skip_all, name = "auth.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> Json<ReadinessResponse> {
    Json(ReadinessResponse {
        status: "ready".to_string(),
        live_tokens: state.authenticator.live_tokens(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::config::TokenAuthConfig;
    use crate::models::TokenAction;
    use crate::services::Authenticator;

    #[tokio::test]
    async fn test_health_check_returns_ok() {
        assert_eq!(health_check().await, "OK");
    }

    #[tokio::test]
    async fn test_readiness_reports_live_tokens() {
        let authenticator = Arc::new(Authenticator::new(
            TokenAuthConfig::default(),
            Arc::new(MockClock::starting_now()),
        )
        .unwrap());
        authenticator
            .generate_token(TokenAction::Join, "doc42")
            .unwrap();

        let state = Arc::new(AppState { authenticator });
        let Json(response) = readiness_check(State(state)).await;

        assert_eq!(response.status, "ready");
        assert_eq!(response.live_tokens, 1);
    }
}
