//! HTTP routes for the access token service.
//!
//! Defines the application state and assembles the two routers: the public
//! one (health, readiness, metrics) and the admin one carrying the
//! privileged token generation routes.

pub mod registrar;

use crate::handlers;
use crate::middleware::http_metrics_middleware;
use crate::services::Authenticator;
use axum::{middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use registrar::{AxumRegistrar, EndpointDescription, EndpointRegistrar, RegistrarError};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub use crate::observability::metrics::init_metrics_recorder;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Token authenticator.
    pub authenticator: Arc<Authenticator>,
}

/// The assembled routers, one per listener.
pub struct ServiceRouters {
    /// Served on the public bind address.
    pub public: Router,

    /// Served on the admin bind address; trusted callers only.
    pub admin: Router,

    /// Everything that was registered, for startup logging.
    pub endpoints: Vec<EndpointDescription>,
}

/// Build the application routes.
///
/// Public router:
/// - `/health` - Liveness probe (simple "OK")
/// - `/ready` - Readiness probe (JSON)
/// - `/metrics` - Prometheus metrics endpoint
///
/// Admin router:
/// - `<path>/create`, `<path>/join` - Token generation
///
/// Both get TraceLayer, a 30 second request timeout and the HTTP metrics
/// middleware (outermost).
///
/// # Errors
///
/// Returns `RegistrarError` if the configured token path collides or is
/// malformed.
pub fn build_routes(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
) -> Result<ServiceRouters, RegistrarError> {
    let mut registrar = AxumRegistrar::new();

    registrar.register_public("/health", "Liveness probe", get(handlers::health_check))?;
    registrar.register_public(
        "/ready",
        "Readiness probe",
        get(handlers::readiness_check).with_state(state.clone()),
    )?;
    registrar.register_public(
        "/metrics",
        "Prometheus metrics",
        get(handlers::metrics_handler).with_state(metrics_handle),
    )?;

    handlers::register_token_endpoints(state.authenticator.clone(), &mut registrar)?;

    let routes = registrar.finish();

    Ok(ServiceRouters {
        public: with_common_layers(routes.public),
        admin: with_common_layers(routes.private),
        endpoints: routes.endpoints,
    })
}

/// Layer order (bottom-to-top execution):
/// 1. TimeoutLayer - Timeout the request (innermost)
/// 2. TraceLayer - Log request details
/// 3. http_metrics_middleware - Record ALL responses (outermost)
fn with_common_layers(router: Router) -> Router {
    router
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::config::TokenAuthConfig;
    use crate::routes::registrar::Visibility;
    use axum::{body::Body, http::Request, http::StatusCode};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    fn routers(config: TokenAuthConfig) -> ServiceRouters {
        let authenticator = Arc::new(Authenticator::new(
            config,
            Arc::new(MockClock::starting_now()),
        )
        .unwrap());
        let handle = PrometheusBuilder::new().build_recorder().handle();
        build_routes(Arc::new(AppState { authenticator }), handle).unwrap()
    }

    async fn status(router: Router, method: &str, uri: &str, body: &str) -> StatusCode {
        router
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[tokio::test]
    async fn test_token_routes_only_on_admin_router() {
        let routers = routers(TokenAuthConfig::default());
        let body = r#"{"key_value":"alice"}"#;

        assert_eq!(
            status(routers.admin.clone(), "POST", "/create", body).await,
            StatusCode::OK
        );
        assert_eq!(
            status(routers.public.clone(), "POST", "/create", body).await,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(routers.public.clone(), "POST", "/join", body).await,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(routers.admin, "GET", "/health", "").await,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_public_operational_routes() {
        let routers = routers(TokenAuthConfig::default());

        assert_eq!(
            status(routers.public.clone(), "GET", "/health", "").await,
            StatusCode::OK
        );
        assert_eq!(
            status(routers.public.clone(), "GET", "/ready", "").await,
            StatusCode::OK
        );
        assert_eq!(
            status(routers.public, "GET", "/metrics", "").await,
            StatusCode::OK
        );
    }

    #[test]
    fn test_endpoint_listing() {
        let routers = routers(TokenAuthConfig {
            path: "/auth".to_string(),
            ..TokenAuthConfig::default()
        });

        let private: Vec<&str> = routers
            .endpoints
            .iter()
            .filter(|e| e.visibility == Visibility::Private)
            .map(|e| e.path.as_str())
            .collect();
        assert_eq!(private, vec!["/auth/create", "/auth/join"]);

        let public_count = routers
            .endpoints
            .iter()
            .filter(|e| e.visibility == Visibility::Public)
            .count();
        assert_eq!(public_count, 3);
    }

    #[test]
    fn test_token_path_colliding_with_public_route_is_fine() {
        // Public and private surfaces are separate listeners.
        let routers = routers(TokenAuthConfig {
            path: "/health".to_string(),
            ..TokenAuthConfig::default()
        });
        assert_eq!(routers.endpoints.len(), 5);
    }
}
