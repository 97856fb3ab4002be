//! Daemon - the bridge run loop
//!
//! Watches the settings change hook and runs a full re-authentication and
//! re-discovery pass for every credential change, serially. Passes never
//! overlap; a change arriving mid-pass is picked up after the current pass
//! completes.

use std::sync::Arc;

use crate::bridge::Bridge;
use crate::config::{Credentials, SettingsStore};
use crate::{Error, Result};

/// The bridge daemon
pub struct Daemon {
    bridge: Arc<Bridge>,
    settings: Arc<SettingsStore>,
}

impl Daemon {
    /// Create a daemon around a bridge and its settings store
    #[must_use]
    pub fn new(bridge: Arc<Bridge>, settings: Arc<SettingsStore>) -> Self {
        Self { bridge, settings }
    }

    /// Run until interrupted
    ///
    /// Applies the stored credentials once at startup, then once per
    /// credential change.
    ///
    /// # Errors
    ///
    /// Returns error only on a fatal runtime failure; pass failures are
    /// logged and wait for the next credential change.
    pub async fn run(self) -> Result<()> {
        let mut changes = self.settings.subscribe();

        let startup = changes.borrow_and_update().clone();
        self.apply(startup).await;

        loop {
            tokio::select! {
                changed = changes.changed() => {
                    if changed.is_err() {
                        // Settings store dropped; nothing left to react to
                        break;
                    }
                    let credentials = changes.borrow_and_update().clone();
                    tracing::info!("credentials changed, refreshing bridge");
                    self.apply(credentials).await;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutting down");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Run one full pass, containing failures to log lines
    async fn apply(&self, credentials: Credentials) {
        match self.bridge.refresh(&credentials).await {
            Ok(devices) => tracing::info!(devices, "bridge ready"),
            Err(Error::Config(reason)) => {
                tracing::warn!(%reason, "bridge not configured");
            }
            Err(e) => tracing::error!(error = %e, "bridge refresh failed"),
        }
    }
}
