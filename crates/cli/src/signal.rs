// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Interrupt handling.
//!
//! The listener only cancels the shared token. The pipeline stops at its next
//! phase boundary; a benchmark already running finishes or hits its timeout.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Cancel `token` on SIGINT, or SIGTERM on unix.
pub fn spawn_listener(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {
                debug!("cancellation token closed, stopping signal listener");
            }
            name = interrupted() => {
                warn!(signal = name, "interrupt received, stopping after the current phase");
                token.cancel();
            }
        }
    })
}

#[cfg(unix)]
async fn interrupted() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => tokio::select! {
            _ = tokio::signal::ctrl_c() => "SIGINT",
            _ = term.recv() => "SIGTERM",
        },
        Err(e) => {
            warn!(error = %e, "failed to install SIGTERM handler");
            ctrl_c().await
        }
    }
}

#[cfg(not(unix))]
async fn interrupted() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    "SIGINT"
}
