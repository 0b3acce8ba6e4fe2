//! Test server harness for E2E testing
//!
//! Provides `TestTokenServer` for spawning real access token service
//! instances in tests. Both listeners bind to random ports and the
//! authenticator runs on a [`MockClock`], so tests control expiry.

use access_token_service::clock::MockClock;
use access_token_service::config::Config;
use access_token_service::routes::{self, AppState};
use access_token_service::services::Authenticator;
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Test harness for spawning the access token service in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_join_flow_e2e() -> Result<(), anyhow::Error> {
///     let server = TestTokenServer::spawn().await?;
///
///     let token = server.request_token("join", "doc42").await?;
///     assert!(server.authenticator().authorise_join(&token, "doc42"));
///     Ok(())
/// }
/// ```
pub struct TestTokenServer {
    public_addr: SocketAddr,
    admin_addr: SocketAddr,
    config: Config,
    authenticator: Arc<Authenticator>,
    clock: Arc<MockClock>,
    client: reqwest::Client,
    public_handle: JoinHandle<()>,
    admin_handle: JoinHandle<()>,
}

impl TestTokenServer {
    /// Spawn a server with default token settings.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(HashMap::new()).await
    }

    /// Spawn a server with extra configuration variables.
    ///
    /// `vars` are layered over the test defaults (both bind addresses on
    /// `127.0.0.1:0`), so only the settings under test need to be given.
    ///
    /// # Returns
    /// * `Ok(TestTokenServer)` - Running server instance
    /// * `Err(anyhow::Error)` - If configuration or binding fails
    pub async fn spawn_with_vars(vars: HashMap<String, String>) -> Result<Self, anyhow::Error> {
        let mut all_vars = HashMap::from([
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("ADMIN_BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
        ]);
        all_vars.extend(vars);

        let config = Config::from_vars(&all_vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let clock = Arc::new(MockClock::starting_now());
        let authenticator = Arc::new(
            Authenticator::new(config.token_auth.clone(), clock.clone())
                .map_err(|e| anyhow::anyhow!("Failed to create authenticator: {}", e))?,
        );

        // The global recorder can only be installed once per process.
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();

        let state = Arc::new(AppState {
            authenticator: authenticator.clone(),
        });
        let routers = routes::build_routes(state, metrics_handle)
            .map_err(|e| anyhow::anyhow!("Failed to build routes: {}", e))?;

        let (public_addr, public_handle) = serve(&config.bind_address, routers.public).await?;
        let (admin_addr, admin_handle) = serve(&config.admin_bind_address, routers.admin).await?;

        Ok(Self {
            public_addr,
            admin_addr,
            config,
            authenticator,
            clock,
            client: reqwest::Client::new(),
            public_handle,
            admin_handle,
        })
    }

    /// Base URL of the public listener.
    pub fn public_url(&self) -> String {
        format!("http://{}", self.public_addr)
    }

    /// Base URL of the admin listener, including the configured token path.
    pub fn admin_url(&self) -> String {
        let path = self.config.token_auth.path.trim_end_matches('/');
        if path.is_empty() || path.starts_with('/') {
            format!("http://{}{}", self.admin_addr, path)
        } else {
            format!("http://{}/{}", self.admin_addr, path)
        }
    }

    pub fn public_addr(&self) -> SocketAddr {
        self.public_addr
    }

    pub fn admin_addr(&self) -> SocketAddr {
        self.admin_addr
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The authenticator behind the running server, for redeeming tokens
    /// the way the synchronization engine would.
    pub fn authenticator(&self) -> Arc<Authenticator> {
        self.authenticator.clone()
    }

    /// Clock driving token expiry.
    pub fn clock(&self) -> Arc<MockClock> {
        self.clock.clone()
    }

    /// POST `{"key_value": ...}` to `<admin_url>/<leaf>`.
    pub async fn post_token_request(
        &self,
        leaf: &str,
        key_value: &str,
    ) -> Result<reqwest::Response, anyhow::Error> {
        let response = self
            .client
            .post(format!("{}/{}", self.admin_url(), leaf))
            .json(&serde_json::json!({ "key_value": key_value }))
            .send()
            .await?;
        Ok(response)
    }

    /// Request a token and return it, failing on any non-200 response.
    pub async fn request_token(&self, leaf: &str, key_value: &str) -> Result<String, anyhow::Error> {
        let response = self.post_token_request(leaf, key_value).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Token request to {leaf} failed with {status}: {body}");
        }

        let body: serde_json::Value = response.json().await?;
        body["token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Response has no token field: {body}"))
    }

    /// Advance the server clock.
    pub fn advance_clock(&self, delta: chrono::Duration) {
        self.clock.advance(delta);
    }
}

async fn serve(
    bind_address: &str,
    app: Router,
) -> Result<(SocketAddr, JoinHandle<()>), anyhow::Error> {
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

    let addr = listener
        .local_addr()
        .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("Test server error: {}", e);
        }
    });

    Ok((addr, handle))
}

impl Drop for TestTokenServer {
    fn drop(&mut self) {
        self.public_handle.abort();
        self.admin_handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_spawns_successfully() -> Result<(), anyhow::Error> {
        let server = TestTokenServer::spawn().await?;

        assert!(server.public_url().starts_with("http://127.0.0.1:"));
        assert!(server.admin_url().starts_with("http://127.0.0.1:"));

        let response = reqwest::get(format!("{}/health", server.public_url())).await?;
        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await?, "OK");

        Ok(())
    }

    #[tokio::test]
    async fn test_listeners_on_different_ports() -> Result<(), anyhow::Error> {
        let server = TestTokenServer::spawn().await?;

        assert_ne!(server.public_addr(), server.admin_addr());
        assert!(server.admin_addr().ip().is_loopback());

        Ok(())
    }

    #[tokio::test]
    async fn test_admin_url_includes_path() -> Result<(), anyhow::Error> {
        let server = TestTokenServer::spawn_with_vars(HashMap::from([(
            "AUTH_PATH".to_string(),
            "auth/".to_string(),
        )]))
        .await?;

        assert_eq!(
            server.admin_url(),
            format!("http://{}/auth", server.admin_addr())
        );

        let token = server.request_token("create", "alice").await?;
        assert!(!token.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_vars_override_defaults() -> Result<(), anyhow::Error> {
        let server = TestTokenServer::spawn_with_vars(HashMap::from([(
            "AUTH_EXPIRY_PERIOD_S".to_string(),
            "5".to_string(),
        )]))
        .await?;

        assert_eq!(server.config().token_auth.expiry_period_s, 5);

        Ok(())
    }
}
