//! Access Token Service
//!
//! Runs two HTTP listeners:
//! - Public (default 0.0.0.0:8080): health, readiness, metrics
//! - Admin (default 127.0.0.1:8081): privileged token generation routes
//!
//! plus the background expiry sweeper. SIGINT or SIGTERM cancels a shared
//! token that stops all three.

use access_token_service::clock::SystemClock;
use access_token_service::config::Config;
use access_token_service::routes::{self, init_metrics_recorder, AppState};
use access_token_service::services::Authenticator;
use access_token_service::tasks::start_token_sweeper;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "access_token_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Access Token Service");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        admin_bind_address = %config.admin_bind_address,
        path = %config.token_auth.path,
        expiry_period_s = config.token_auth.expiry_period_s,
        allow_create = config.token_auth.allow_create,
        sweep_interval_seconds = config.sweep_interval_seconds,
        "Configuration loaded successfully"
    );

    // Must happen before any metrics are recorded
    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!(error = %e, "Failed to install Prometheus metrics recorder");
        e
    })?;

    let authenticator = Arc::new(
        Authenticator::new(config.token_auth.clone(), Arc::new(SystemClock)).map_err(|e| {
            error!(error = %e, "Failed to create token authenticator");
            e
        })?,
    );

    let state = Arc::new(AppState {
        authenticator: authenticator.clone(),
    });

    let routers = routes::build_routes(state, metrics_handle).map_err(|e| {
        error!(error = %e, "Failed to register endpoints");
        e
    })?;

    for endpoint in &routers.endpoints {
        info!(
            path = %endpoint.path,
            visibility = ?endpoint.visibility,
            description = %endpoint.description,
            "Registered endpoint"
        );
    }

    let public_addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;
    let admin_addr: SocketAddr = config.admin_bind_address.parse().map_err(|e| {
        error!("Invalid admin bind address: {}", e);
        e
    })?;

    let public_listener = tokio::net::TcpListener::bind(public_addr)
        .await
        .map_err(|e| {
            error!(error = %e, addr = %public_addr, "Failed to bind public listener");
            e
        })?;
    let admin_listener = tokio::net::TcpListener::bind(admin_addr)
        .await
        .map_err(|e| {
            error!(error = %e, addr = %admin_addr, "Failed to bind admin listener");
            e
        })?;

    let shutdown_token = CancellationToken::new();

    let sweeper = tokio::spawn(start_token_sweeper(
        authenticator,
        config.sweep_interval_seconds,
        shutdown_token.child_token(),
    ));

    info!("Public listener on {}", public_addr);
    let public_server = spawn_server(
        "public",
        public_listener,
        routers.public,
        shutdown_token.child_token(),
    );

    info!("Admin listener on {}", admin_addr);
    let admin_server = spawn_server(
        "admin",
        admin_listener,
        routers.admin,
        shutdown_token.child_token(),
    );

    shutdown_signal().await;

    info!("Shutdown signal received, initiating graceful shutdown...");
    shutdown_token.cancel();

    for (name, handle) in [
        ("public server", public_server),
        ("admin server", admin_server),
        ("token sweeper", sweeper),
    ] {
        match tokio::time::timeout(Duration::from_secs(30), handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, task = name, "Task panicked during shutdown"),
            Err(_) => warn!(task = name, "Task did not stop within 30 seconds"),
        }
    }

    info!("Access Token Service shutdown complete");

    Ok(())
}

fn spawn_server(
    name: &'static str,
    listener: tokio::net::TcpListener,
    app: Router,
    shutdown_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            shutdown_token.cancelled().await;
            info!(server = name, "HTTP server shutting down");
        });
        if let Err(e) = server.await {
            error!(error = %e, server = name, "HTTP server failed");
        }
    })
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
