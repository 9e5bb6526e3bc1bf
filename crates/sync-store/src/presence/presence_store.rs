//! Per-user presence with soft online claims
//!
//! A heartbeat overwrites the whole record. The stored `is_online` flag is a
//! soft claim; the *effective* state additionally requires the heartbeat to
//! be younger than the presence timeout, judged by the instant the store
//! received it (client clocks are not trusted for expiry). Watchers observe
//! effective transitions only, so a steady stream of heartbeats is silent.

use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::watch;
use tokio::time::Instant;

use sync_core::{PresenceRecord, UserName};

struct PresenceEntry {
    record: Option<PresenceRecord>,
    /// Store-side receive instant of the last heartbeat
    received_at: Instant,
    effective: watch::Sender<bool>,
}

impl PresenceEntry {
    fn vacant() -> Self {
        let (effective, _) = watch::channel(false);
        Self {
            record: None,
            received_at: Instant::now(),
            effective,
        }
    }

    fn is_effectively_online(&self, timeout: Duration) -> bool {
        self.record.as_ref().is_some_and(|r| r.is_online) && self.received_at.elapsed() < timeout
    }
}

/// Per-user presence store
pub struct PresenceStore {
    entries: DashMap<UserName, PresenceEntry>,
    timeout: Duration,
}

impl PresenceStore {
    /// Create a store demoting records `timeout` after their last heartbeat
    pub fn new(timeout: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            timeout,
        }
    }

    /// Upsert a presence record (idempotent full overwrite)
    ///
    /// Returns the new effective state if this write flipped it.
    pub async fn heartbeat(&self, record: PresenceRecord) -> Option<bool> {
        let user = record.name.clone();
        let mut entry = self
            .entries
            .entry(user.clone())
            .or_insert_with(PresenceEntry::vacant);

        entry.received_at = Instant::now();
        let effective = record.is_online;
        entry.record = Some(record);

        let flipped = entry
            .effective
            .send_if_modified(|current| {
                if *current == effective {
                    false
                } else {
                    *current = effective;
                    true
                }
            });

        tracing::trace!(user = %user, online = effective, flipped = flipped, "Heartbeat");

        flipped.then_some(effective)
    }

    /// Effective presence for a user, expiry applied at read time
    ///
    /// Absent users read as offline.
    pub async fn get(&self, user: &UserName) -> PresenceRecord {
        match self.entries.get(user) {
            Some(entry) => match &entry.record {
                Some(record) => {
                    let mut record = record.clone();
                    record.is_online = entry.is_effectively_online(self.timeout);
                    record
                }
                None => PresenceRecord::offline(user.clone()),
            },
            None => PresenceRecord::offline(user.clone()),
        }
    }

    /// Effective online boolean for a user
    pub async fn is_online(&self, user: &UserName) -> bool {
        self.get(user).await.is_online
    }

    /// Watch a user's effective state; emits on transitions only
    pub fn subscribe(&self, user: &UserName) -> watch::Receiver<bool> {
        self.entries
            .entry(user.clone())
            .or_insert_with(PresenceEntry::vacant)
            .effective
            .subscribe()
    }

    /// Demote records whose TTL elapsed and notify their watchers
    ///
    /// Returns the users whose effective state flipped offline.
    pub fn sweep(&self) -> Vec<UserName> {
        let mut demoted = Vec::new();
        for entry in self.entries.iter() {
            let online_now = entry.is_effectively_online(self.timeout);
            let flipped = entry.effective.send_if_modified(|current| {
                if *current && !online_now {
                    *current = false;
                    true
                } else {
                    false
                }
            });
            if flipped {
                demoted.push(entry.key().clone());
            }
        }

        if !demoted.is_empty() {
            tracing::debug!(count = demoted.len(), "Presence records expired");
        }

        demoted
    }

    /// Number of tracked users
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no user has been tracked yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
