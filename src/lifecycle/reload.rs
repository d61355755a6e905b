//! Hot-reload application.
//!
//! Only the credential and mode are swapped at runtime. Endpoint and failover
//! topology is compared against what the process started with, since that is
//! what the running selector actually holds.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::client::ApiClient;
use crate::config::GatewayConfig;
use crate::lifecycle::Shutdown;

/// Result of applying one reloaded config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadReport {
    /// The file's endpoint topology differs from the running one.
    pub restart_required: bool,
}

/// Applies reloaded configs to a running client.
pub struct ReloadApplier {
    client: Arc<ApiClient>,
    running: GatewayConfig,
}

impl ReloadApplier {
    /// `running` is the config the client was built from.
    pub fn new(client: Arc<ApiClient>, running: GatewayConfig) -> Self {
        Self { client, running }
    }

    pub fn apply(&self, next: &GatewayConfig) -> ReloadReport {
        let restart_required = next.endpoints != self.running.endpoints
            || next.failover.default_endpoint != self.running.failover.default_endpoint;
        if restart_required {
            tracing::warn!("Endpoint changes require a restart and were not applied");
        }

        self.client.apply_config(&next.api);
        tracing::info!(mode = %next.api.mode, "Configuration reloaded");
        ReloadReport { restart_required }
    }

    /// Apply reloads until the channel closes or shutdown fires.
    pub async fn run(
        self,
        mut reloads: mpsc::UnboundedReceiver<GatewayConfig>,
        shutdown: Shutdown,
    ) {
        let mut stop = shutdown.subscribe();
        loop {
            tokio::select! {
                _ = stop.recv() => break,
                next = reloads.recv() => match next {
                    Some(next) => {
                        self.apply(&next);
                    }
                    None => break,
                },
            }
        }
    }
}
