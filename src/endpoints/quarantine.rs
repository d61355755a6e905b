//! Quarantine bookkeeping for failed endpoints.
//!
//! # Responsibilities
//! - Record a deadline per failed endpoint key
//! - Answer "is this key quarantined right now"
//! - Release expired keys lazily, at the moment they are looked at
//!
//! # Design Decisions
//! - No timers: an entry is live iff `now < deadline`
//! - Concurrent inserts on the same key simply refresh the deadline
//! - Uses `tokio::time::Instant` so a paused test clock drives expiry

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

/// Concurrent map of endpoint key to "quarantined until" deadline.
#[derive(Debug)]
pub struct QuarantineSet {
    entries: DashMap<String, Instant>,
    cooldown: Duration,
}

impl QuarantineSet {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            cooldown,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Quarantine `key` until now + cooldown, refreshing any existing entry.
    pub fn insert(&self, key: &str) -> Instant {
        let deadline = Instant::now() + self.cooldown;
        self.entries.insert(key.to_string(), deadline);
        deadline
    }

    pub fn is_quarantined(&self, key: &str, now: Instant) -> bool {
        self.entries
            .get(key)
            .map(|deadline| now < *deadline)
            .unwrap_or(false)
    }

    /// Drop elapsed entries and return the keys that were released.
    pub fn purge_expired(&self, now: Instant) -> Vec<String> {
        let mut released = Vec::new();
        self.entries.retain(|key, deadline| {
            if now < *deadline {
                true
            } else {
                released.push(key.clone());
                false
            }
        });
        released
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Live entries at `now`, without removing anything.
    pub fn active(&self, now: Instant) -> Vec<(String, Instant)> {
        self.entries
            .iter()
            .filter(|entry| now < *entry.value())
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    pub fn active_count(&self, now: Instant) -> usize {
        self.entries.iter().filter(|entry| now < *entry.value()).count()
    }
}
