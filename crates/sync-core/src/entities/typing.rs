//! Typing entity - a per-direction typing flag
//!
//! `is_typing = true` auto-expires after a quiet window with no renewed
//! keystroke; renewal resets the window (debounce, not a one-shot timer).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{iso_millis, UserName};

/// Per-direction typing record (full-overwrite semantics per write)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingRecord {
    pub is_typing: bool,
    /// Instant of the last update (keystroke renewal or explicit clear)
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    /// The writer's name, carried with each record
    pub user: UserName,
}

impl TypingRecord {
    /// Record written on a keystroke
    pub fn started(user: UserName, timestamp: DateTime<Utc>) -> Self {
        Self {
            is_typing: true,
            timestamp,
            user,
        }
    }

    /// Record written on an explicit clear (send, text emptied)
    pub fn stopped(user: UserName, timestamp: DateTime<Utc>) -> Self {
        Self {
            is_typing: false,
            timestamp,
            user,
        }
    }

    /// Effective typing state at `now`: the stored flag adjusted for the
    /// quiet window
    pub fn effective(&self, now: DateTime<Utc>, quiet_window: Duration) -> bool {
        self.is_typing && now - self.timestamp < quiet_window
    }
}
