//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::GatewayConfig;

/// Quiet period after the last file event before the config is re-read.
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(500);

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file.
    ///
    /// Must be called inside a Tokio runtime: file events are debounced on a
    /// spawned task. The returned watcher stops on drop.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<()>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        let _ = event_tx.send(());
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        let path = self.path.clone();
        let tx = self.update_tx;
        tokio::spawn(async move {
            while event_rx.recv().await.is_some() {
                // Editors emit bursts of events; wait for the file to settle.
                loop {
                    match tokio::time::timeout(RELOAD_DEBOUNCE, event_rx.recv()).await {
                        Ok(Some(())) => continue,
                        Ok(None) => return,
                        Err(_) => break,
                    }
                }

                tracing::info!("Config file change detected, reloading...");
                match load_config(&path) {
                    Ok(new_config) => {
                        if tx.send(new_config).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to reload config: {}. Keeping current configuration.",
                            e
                        );
                    }
                }
            }
        });

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reload_delivers_new_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\nmode = \"auto\"\n").unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let _guard = watcher.run().unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        std::fs::write(&path, "[api]\nmode = \"eo\"\napi_key = \"k\"\n").unwrap();

        let config = tokio::time::timeout(Duration::from_secs(10), updates.recv())
            .await
            .expect("no reload within timeout")
            .expect("watcher channel closed");
        assert_eq!(config.api.mode, "eo");
        assert_eq!(config.api.credential(), Some("k"));
    }
}
