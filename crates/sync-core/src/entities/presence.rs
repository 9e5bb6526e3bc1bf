//! Presence entity - a per-user online/offline record
//!
//! `is_online = true` is a soft claim: it only holds while the last heartbeat
//! is younger than the presence timeout. The engine, not the writer, demotes
//! stale records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{iso_millis, UserName};

/// Per-user presence record (full-overwrite semantics per write)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceRecord {
    pub is_online: bool,
    /// Client-supplied heartbeat instant
    #[serde(with = "iso_millis")]
    pub last_seen: DateTime<Utc>,
    /// Display name carried with each record
    pub name: UserName,
}

impl PresenceRecord {
    /// Record written by a heartbeat
    pub fn heartbeat(name: UserName, is_online: bool, last_seen: DateTime<Utc>) -> Self {
        Self {
            is_online,
            last_seen,
            name,
        }
    }

    /// The record returned when nothing was ever written for a user
    pub fn offline(name: UserName) -> Self {
        Self {
            is_online: false,
            last_seen: DateTime::UNIX_EPOCH,
            name,
        }
    }

    /// Effective online state at `now`: the stored flag adjusted for expiry
    pub fn effective(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        self.is_online && now - self.last_seen < timeout
    }
}
