//! Presence bookkeeping for chat participants.
//!
//! A name is online while its last activity is younger than the timeout.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Name -> last activity instant.
#[derive(Debug)]
pub struct PresenceTracker {
    seen: Mutex<HashMap<String, Instant>>,
    timeout: Duration,
}

impl PresenceTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            seen: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Records activity for `name` now. Blank names are ignored.
    pub fn mark_seen(&self, name: &str) {
        self.mark_seen_at(name, Instant::now());
    }

    /// Records activity for `name` at `at`.
    pub fn mark_seen_at(&self, name: &str, at: Instant) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        self.seen.lock().insert(name.to_string(), at);
    }

    pub fn is_online(&self, name: &str) -> bool {
        let now = Instant::now();
        self.seen
            .lock()
            .get(name.trim())
            .is_some_and(|last| self.is_fresh(*last, now))
    }

    /// Online names, sorted.
    pub fn online(&self) -> Vec<String> {
        let now = Instant::now();
        let mut names: Vec<String> = self
            .seen
            .lock()
            .iter()
            .filter(|(_, last)| self.is_fresh(**last, now))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    fn is_fresh(&self, last: Instant, now: Instant) -> bool {
        now.saturating_duration_since(last) < self.timeout
    }
}
