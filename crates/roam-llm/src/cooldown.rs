//! Per-model cooldown after transient failures
//!
//! A model that hit a rate limit or quota wall is deprioritised for a fixed
//! window. Entries are never removed; an expired timestamp simply stops
//! matching.

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Process-wide map of model key to "unavailable until"
#[derive(Debug, Default)]
pub struct CooldownTracker {
    entries: DashMap<String, Instant>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `model_key` into cooldown for `duration` starting now
    ///
    /// Overwrites any earlier entry; the window is fixed, not sliding.
    pub fn mark_unavailable(&self, model_key: &str, duration: Duration) {
        let until = Instant::now() + duration;
        self.entries.insert(model_key.to_owned(), until);
        tracing::debug!(model = model_key, cooldown_secs = duration.as_secs(), "model placed in cooldown");
    }

    /// Whether `model_key` is still inside its cooldown window
    pub fn is_cooling(&self, model_key: &str) -> bool {
        self.entries
            .get(model_key)
            .is_some_and(|until| Instant::now() < *until)
    }

    /// Time left before `model_key` leaves cooldown
    pub fn remaining(&self, model_key: &str) -> Option<Duration> {
        let until = *self.entries.get(model_key)?;
        until.checked_duration_since(Instant::now()).filter(|d| !d.is_zero())
    }
}
