//! `SIGHUP`-triggered config reload: an operator edits the config file and sends `SIGHUP`; the
//! process re-reads, re-validates, and atomically swaps in the new tunables without dropping a
//! connection. A reload that would add or remove a provider is rejected (logged, not fatal) —
//! that still requires a restart.

use std::path::PathBuf;
use std::sync::Arc;

use cc_relay_config::Config;
use tokio_util::sync::CancellationToken;

use crate::state::SharedState;

#[cfg(unix)]
pub fn spawn_reload_task(state: Arc<SharedState>, config_path: PathBuf, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let Ok(mut hangup) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup()) else {
            tracing::warn!("failed to install SIGHUP handler; config hot-reload disabled");
            return;
        };
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                signal = hangup.recv() => {
                    if signal.is_none() {
                        break;
                    }
                    reload_once(&state, &config_path);
                }
            }
        }
    })
}

#[cfg(not(unix))]
pub fn spawn_reload_task(_state: Arc<SharedState>, _config_path: PathBuf, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        shutdown.cancelled().await;
    })
}

fn reload_once(state: &Arc<SharedState>, config_path: &PathBuf) {
    tracing::info!(path = %config_path.display(), "reload signal received");
    match Config::load(config_path) {
        Ok(config) => match state.reload(&config) {
            Ok(()) => tracing::info!("configuration reloaded"),
            Err(err) => tracing::warn!(error = %err, "configuration reload rejected"),
        },
        Err(err) => tracing::warn!(error = %err, "failed to load configuration for reload"),
    }
}
