//! Engine change events
//!
//! Emitted on the engine's event feed whenever one of the stores accepts a
//! state change. Presence and typing events fire on *effective* transitions
//! only, not on every write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{iso_millis, MessageId, UserName};

/// All engine change events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncEvent {
    MessageAccepted(MessageAcceptedEvent),
    PresenceChanged(PresenceChangedEvent),
    TypingChanged(TypingChangedEvent),
}

impl SyncEvent {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::MessageAccepted(_) => "MESSAGE_ACCEPTED",
            Self::PresenceChanged(_) => "PRESENCE_CHANGED",
            Self::TypingChanged(_) => "TYPING_CHANGED",
        }
    }

    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::MessageAccepted(e) => e.timestamp,
            Self::PresenceChanged(e) => e.timestamp,
            Self::TypingChanged(e) => e.timestamp,
        }
    }
}

/// A message passed validation and was assigned an id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageAcceptedEvent {
    pub id: MessageId,
    pub user_name: UserName,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

/// A user's effective online state flipped
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceChangedEvent {
    pub user: UserName,
    pub is_online: bool,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

/// A typing direction's effective state flipped
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingChangedEvent {
    pub from: UserName,
    pub to: UserName,
    pub is_typing: bool,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}
