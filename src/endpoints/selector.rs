//! Endpoint selection with failover.
//!
//! # Responsibilities
//! - Resolve the active mode (auto or one fixed endpoint)
//! - Pick the base URL for the next request
//! - Track quarantined endpoints and release them after the cooldown
//! - Report a side-effect-free status snapshot for operators
//!
//! # Selection (auto mode)
//! ```text
//! purge elapsed quarantine entries
//!     → candidates = registry order minus quarantined keys
//!     → none left: clear quarantine, use registry[rotation_index % len]
//!     → otherwise: first candidate
//!     → pick got quarantined concurrently: registry default endpoint
//! ```
//!
//! # Design Decisions
//! - Fixed mode never fails over
//! - Any mode change clears the quarantine set
//! - Mode and quarantine are lock-free shared state; nothing here is held
//!   across network I/O

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use arc_swap::ArcSwap;
use serde::{Serialize, Serializer};
use tokio::time::Instant;

use crate::config::{GatewayConfig, AUTO_MODE};
use crate::endpoints::quarantine::QuarantineSet;
use crate::endpoints::registry::{Endpoint, EndpointRegistry, RegistryError};
use crate::observability::metrics;

/// Endpoint selection mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Pick the first healthy endpoint, failing over on errors.
    Auto,
    /// Always use the named endpoint.
    Fixed(String),
}

impl Mode {
    pub fn is_auto(&self) -> bool {
        matches!(self, Mode::Auto)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Mode::Auto => AUTO_MODE,
            Mode::Fixed(key) => key,
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Mode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Read-only snapshot of selector state.
#[derive(Debug, Clone, Serialize)]
pub struct SelectorStatus {
    pub mode: Mode,
    /// URL the next selection would return.
    pub current_url: String,
    pub rotation_index: usize,
    /// Quarantined keys, in registry order.
    pub quarantined_keys: Vec<String>,
    /// Quarantine deadlines as Unix epoch milliseconds.
    pub quarantine_deadlines: BTreeMap<String, u64>,
}

/// Shared endpoint selector.
#[derive(Debug)]
pub struct EndpointSelector {
    registry: EndpointRegistry,
    mode: ArcSwap<Mode>,
    quarantine: QuarantineSet,
    rotation_index: AtomicUsize,
}

impl EndpointSelector {
    /// Create a selector in auto mode.
    pub fn new(registry: EndpointRegistry, cooldown: Duration, rotation_start: usize) -> Self {
        Self {
            registry,
            mode: ArcSwap::from_pointee(Mode::Auto),
            quarantine: QuarantineSet::new(cooldown),
            rotation_index: AtomicUsize::new(rotation_start),
        }
    }

    /// Build a selector from configuration and apply the configured mode.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, RegistryError> {
        let registry = EndpointRegistry::from_config(config)?;
        let selector = Self::new(
            registry,
            Duration::from_secs(config.failover.cooldown_secs),
            config.failover.rotation_start,
        );
        selector.set_mode(&config.api.mode);
        Ok(selector)
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    pub fn mode(&self) -> Mode {
        Mode::clone(&self.mode.load())
    }

    /// Switch mode. Unknown modes fall back to auto. Always clears quarantine.
    pub fn set_mode(&self, mode: &str) -> Mode {
        let mode = mode.trim();
        let next = if mode == AUTO_MODE {
            Mode::Auto
        } else if self.registry.contains(mode) {
            Mode::Fixed(mode.to_string())
        } else {
            tracing::warn!(mode = %mode, "Invalid endpoint mode, falling back to auto");
            Mode::Auto
        };

        let previous = self.mode.swap(Arc::new(next.clone()));
        self.quarantine.clear();
        metrics::record_quarantined(0);

        tracing::info!(old_mode = %previous, new_mode = %next, "Endpoint mode set");
        next
    }

    /// Endpoint to use for the next request.
    pub fn current(&self) -> Endpoint {
        let mode = self.mode.load();
        match &**mode {
            Mode::Fixed(key) => self
                .registry
                .get(key)
                .unwrap_or_else(|| self.registry.default_endpoint())
                .clone(),
            Mode::Auto => self.select_auto(),
        }
    }

    /// Base URL to use for the next request.
    pub fn base_url(&self) -> String {
        self.current().base_url
    }

    pub fn endpoint_for_url(&self, url: &str) -> Option<Endpoint> {
        self.registry.find_by_url(url).cloned()
    }

    /// Quarantine `key` for the cooldown window. Re-marking refreshes the deadline.
    pub fn mark_failed(&self, key: &str) {
        if !self.registry.contains(key) {
            tracing::warn!(endpoint = %key, "Ignoring failure report for unknown endpoint");
            return;
        }
        self.quarantine.insert(key);
        metrics::record_quarantined(self.quarantine.active_count(Instant::now()));
        tracing::warn!(
            endpoint = %key,
            cooldown_secs = self.quarantine.cooldown().as_secs(),
            "Endpoint marked as failed"
        );
    }

    /// Clear all quarantine state and rewind the rotation index.
    pub fn reset_failures(&self) {
        self.quarantine.clear();
        self.rotation_index.store(0, Ordering::Relaxed);
        metrics::record_quarantined(0);
        tracing::info!("Endpoint failure records reset");
    }

    pub fn is_quarantined(&self, key: &str) -> bool {
        self.quarantine.is_quarantined(key, Instant::now())
    }

    /// Snapshot of the current state. Does not purge, clear, or log.
    pub fn status(&self) -> SelectorStatus {
        let now = Instant::now();
        let mode = self.mode();

        let current_url = match &mode {
            Mode::Fixed(key) => self
                .registry
                .get(key)
                .unwrap_or_else(|| self.registry.default_endpoint())
                .base_url
                .clone(),
            Mode::Auto => self
                .registry
                .iter()
                .find(|e| !self.quarantine.is_quarantined(&e.key, now))
                .unwrap_or_else(|| self.registry.at(self.rotation_index.load(Ordering::Relaxed)))
                .base_url
                .clone(),
        };

        let active: BTreeMap<String, Instant> = self.quarantine.active(now).into_iter().collect();
        let quarantined_keys = self
            .registry
            .keys()
            .filter(|key| active.contains_key(*key))
            .map(str::to_string)
            .collect();
        let wall_now = SystemTime::now();
        let quarantine_deadlines = active
            .into_iter()
            .map(|(key, deadline)| (key, epoch_millis(wall_now + (deadline - now))))
            .collect();

        SelectorStatus {
            mode,
            current_url,
            rotation_index: self.rotation_index.load(Ordering::Relaxed),
            quarantined_keys,
            quarantine_deadlines,
        }
    }

    fn select_auto(&self) -> Endpoint {
        let now = Instant::now();
        let released = self.quarantine.purge_expired(now);
        if !released.is_empty() {
            for key in &released {
                tracing::info!(endpoint = %key, "Endpoint recovered from quarantine");
            }
            metrics::record_quarantined(self.quarantine.active_count(now));
        }

        let first_candidate = self
            .registry
            .iter()
            .find(|e| !self.quarantine.is_quarantined(&e.key, now));

        match first_candidate {
            Some(endpoint) if !self.quarantine.is_quarantined(&endpoint.key, Instant::now()) => {
                endpoint.clone()
            }
            Some(endpoint) => {
                tracing::debug!(
                    endpoint = %endpoint.key,
                    "Selected endpoint was quarantined concurrently, using default"
                );
                self.registry.default_endpoint().clone()
            }
            None => {
                tracing::warn!("All endpoints are marked as failed, resetting failure records");
                self.quarantine.clear();
                metrics::record_quarantined(0);
                self.registry
                    .at(self.rotation_index.load(Ordering::Relaxed))
                    .clone()
            }
        }
    }
}

fn epoch_millis(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
