//! Per-direction typing flags
//!
//! Each keystroke overwrites the record and resets the quiet window; the
//! flag clears explicitly (send, text emptied) or implicitly once the window
//! elapses with no renewal. Tracking the last-activity instant and sweeping
//! avoids churning a restartable timer object on every keystroke.

use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::watch;
use tokio::time::Instant;

use sync_core::{TypingKey, TypingRecord};

struct TypingEntry {
    record: Option<TypingRecord>,
    /// Store-side receive instant of the last update
    renewed_at: Instant,
    effective: watch::Sender<bool>,
}

impl TypingEntry {
    fn vacant() -> Self {
        let (effective, _) = watch::channel(false);
        Self {
            record: None,
            renewed_at: Instant::now(),
            effective,
        }
    }

    fn is_effectively_typing(&self, quiet_window: Duration) -> bool {
        self.record.as_ref().is_some_and(|r| r.is_typing)
            && self.renewed_at.elapsed() < quiet_window
    }
}

/// Per-direction typing tracker
pub struct TypingTracker {
    entries: DashMap<TypingKey, TypingEntry>,
    quiet_window: Duration,
}

impl TypingTracker {
    /// Create a tracker clearing flags `quiet_window` after the last renewal
    pub fn new(quiet_window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            quiet_window,
        }
    }

    /// Upsert the typing flag for a direction (idempotent full overwrite)
    ///
    /// Returns the new effective state if this write flipped it.
    pub async fn set_typing(
        &self,
        key: &TypingKey,
        is_typing: bool,
        timestamp: DateTime<Utc>,
    ) -> Option<bool> {
        let record = if is_typing {
            TypingRecord::started(key.from.clone(), timestamp)
        } else {
            TypingRecord::stopped(key.from.clone(), timestamp)
        };

        let mut entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(TypingEntry::vacant);

        entry.renewed_at = Instant::now();
        entry.record = Some(record);

        let flipped = entry.effective.send_if_modified(|current| {
            if *current == is_typing {
                false
            } else {
                *current = is_typing;
                true
            }
        });

        tracing::trace!(key = %key, typing = is_typing, flipped = flipped, "Typing update");

        flipped.then_some(is_typing)
    }

    /// Effective typing state for a direction, expiry applied at read time
    pub async fn get(&self, key: &TypingKey) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.is_effectively_typing(self.quiet_window))
    }

    /// Stored record for a direction, if any write happened
    pub fn record(&self, key: &TypingKey) -> Option<TypingRecord> {
        self.entries.get(key).and_then(|entry| entry.record.clone())
    }

    /// Watch a direction's effective state; emits on transitions only
    pub fn subscribe(&self, key: &TypingKey) -> watch::Receiver<bool> {
        self.entries
            .entry(key.clone())
            .or_insert_with(TypingEntry::vacant)
            .effective
            .subscribe()
    }

    /// Clear flags whose quiet window elapsed and notify their watchers
    ///
    /// Returns the directions whose effective state flipped off.
    pub fn sweep(&self) -> Vec<TypingKey> {
        let mut cleared = Vec::new();
        for entry in self.entries.iter() {
            let typing_now = entry.is_effectively_typing(self.quiet_window);
            let flipped = entry.effective.send_if_modified(|current| {
                if *current && !typing_now {
                    *current = false;
                    true
                } else {
                    false
                }
            });
            if flipped {
                cleared.push(entry.key().clone());
            }
        }

        if !cleared.is_empty() {
            tracing::debug!(count = cleared.len(), "Typing flags expired");
        }

        cleared
    }

    /// Number of tracked directions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no direction has been tracked yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
