//! Message ID - server-assigned, insertion-order-sortable identifier
//!
//! Ids are assigned by the message log in strictly increasing order, so
//! comparing two ids compares acceptance order. Serialized as a string for
//! JSON (JavaScript BigInt safety).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Server-assigned message identifier (64-bit, strictly increasing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MessageId(u64);

impl MessageId {
    /// Create a MessageId from a raw u64 value
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    #[inline]
    pub const fn into_inner(self) -> u64 {
        self.0
    }

    /// Check if the id is zero (never assigned by the log)
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Result<Self, MessageIdParseError> {
        s.parse::<u64>()
            .map(MessageId)
            .map_err(|_| MessageIdParseError::InvalidFormat)
    }
}

/// Error when parsing a MessageId from string
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MessageIdParseError {
    #[error("invalid message id format")]
    InvalidFormat,
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MessageId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<MessageId> for u64 {
    fn from(id: MessageId) -> Self {
        id.0
    }
}

impl std::str::FromStr for MessageId {
    type Err = MessageIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageId::parse(s)
    }
}

// Serialize as string for JSON (JavaScript BigInt safety)
impl Serialize for MessageId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

// Deserialize from string or number
impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct MessageIdVisitor;

        impl Visitor<'_> for MessageIdVisitor {
            type Value = MessageId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer representing a message id")
            }

            fn visit_u64<E>(self, value: u64) -> Result<MessageId, E>
            where
                E: de::Error,
            {
                Ok(MessageId(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<MessageId, E>
            where
                E: de::Error,
            {
                value
                    .parse::<u64>()
                    .map(MessageId)
                    .map_err(|_| de::Error::custom("invalid message id string"))
            }
        }

        deserializer.deserialize_any(MessageIdVisitor)
    }
}
