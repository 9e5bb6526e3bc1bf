//! Message entity - an accepted, immutable chat message
//!
//! Once the log assigns an id the message never changes; the log is
//! append-only and keeps no update or delete path.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::DomainError;
use crate::value_objects::{iso_millis, MessageId, UserName};

/// Maximum message body length, in characters
pub const MAX_TEXT_LEN: usize = 4000;

/// An accepted chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    pub user_name: UserName,
    pub text: String,
    /// Client-assigned send instant; never server-corrected
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    /// Instant the log accepted the message
    #[serde(with = "iso_millis")]
    pub accepted_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Create an accepted message
    pub fn new(
        id: MessageId,
        user_name: UserName,
        text: String,
        timestamp: DateTime<Utc>,
        accepted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_name,
            text,
            timestamp,
            accepted_at,
        }
    }

    /// Duplicate rule: same sender, same body, send instants closer than
    /// `window` apart. Applied by consumers before rendering, never by the
    /// log itself.
    pub fn is_duplicate_of(&self, other: &ChatMessage, window: Duration) -> bool {
        self.user_name == other.user_name
            && self.text == other.text
            && (self.timestamp - other.timestamp).abs() < window
    }

    /// Short time label for display (`HH:mm`)
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }

    /// Get a truncated preview of the message (for logging)
    pub fn preview(&self, max_len: usize) -> &str {
        if self.text.len() <= max_len {
            &self.text
        } else {
            let mut end = max_len;
            while !self.text.is_char_boundary(end) && end > 0 {
                end -= 1;
            }
            &self.text[..end]
        }
    }
}

/// A message draft as submitted by a client, before the log accepts it
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    #[validate(custom(function = "not_blank"))]
    pub user_name: String,

    #[validate(
        custom(function = "not_blank"),
        length(max = 4000, message = "Message too long")
    )]
    pub text: String,

    /// Client send instant
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

impl NewMessage {
    /// Create a draft stamped with the given client send instant
    pub fn new(user_name: impl Into<String>, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            user_name: user_name.into(),
            text: text.into(),
            timestamp,
        }
    }

    /// Validate and convert into the typed parts the log stores
    ///
    /// Trims the body; rejects empty sender, empty body, and over-long body.
    pub fn into_checked(self) -> Result<(UserName, String, DateTime<Utc>), DomainError> {
        let user_name = UserName::new(self.user_name)?;
        let text = self.text.trim().to_string();
        if text.is_empty() {
            return Err(DomainError::EmptyText);
        }
        if text.chars().count() > MAX_TEXT_LEN {
            return Err(DomainError::TextTooLong { max: MAX_TEXT_LEN });
        }
        Ok((user_name, text, self.timestamp))
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank"));
    }
    Ok(())
}
