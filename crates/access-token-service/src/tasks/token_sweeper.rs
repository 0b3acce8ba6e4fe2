//! Token sweeper background task.
//!
//! Issuance already sweeps opportunistically, but a quiet service may go a
//! long time without issuing. This task bounds how long an expired token can
//! stay resident.
//!
//! # Graceful Shutdown
//!
//! The task exits when the cancellation token is triggered. A sweep that is
//! already running completes first.

use crate::services::Authenticator;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Start the token sweeper background task.
///
/// # Arguments
///
/// * `authenticator` - Authenticator whose store is swept
/// * `interval_seconds` - Seconds between sweeps
/// * `cancel_token` - Token for graceful shutdown
///
/// # Returns
///
/// Returns when the cancellation token is triggered.
#[instrument(skip_all, name = "auth.task.token_sweeper")]
pub async fn start_token_sweeper(
    authenticator: Arc<Authenticator>,
    interval_seconds: u64,
    cancel_token: CancellationToken,
) {
    info!(
        target: "auth.task.token_sweeper",
        interval_seconds,
        "Starting token sweeper task"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds.max(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                run_sweep(&authenticator);
            }
            _ = cancel_token.cancelled() => {
                info!(
                    target: "auth.task.token_sweeper",
                    "Token sweeper task received shutdown signal, exiting"
                );
                break;
            }
        }
    }

    info!(target: "auth.task.token_sweeper", "Token sweeper task stopped");
}

/// Run a single sweep pass.
pub(crate) fn run_sweep(authenticator: &Authenticator) -> usize {
    let removed = authenticator.sweep_expired();

    if removed > 0 {
        info!(
            target: "auth.task.token_sweeper",
            removed,
            remaining = authenticator.live_tokens(),
            "Swept expired tokens"
        );
    } else {
        debug!(target: "auth.task.token_sweeper", "No expired tokens");
    }

    removed
}
