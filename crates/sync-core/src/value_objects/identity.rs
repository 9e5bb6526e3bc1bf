//! Participant identity and conversation keys
//!
//! Users are identified by a short display name; the data model carries no
//! separate account id. `ConversationKey` is the unordered participant pair
//! a session is scoped to; `TypingKey` is the ordered direction a typing
//! flag belongs to.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::DomainError;

/// Maximum length of a user name, in characters
pub const MAX_USER_NAME_LEN: usize = 32;

/// Validated user identifier (non-empty, trimmed)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserName(String);

impl UserName {
    /// Create a validated user name
    ///
    /// Trims surrounding whitespace; rejects empty and over-long names.
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyUserName);
        }
        if trimmed.chars().count() > MAX_USER_NAME_LEN {
            return Err(DomainError::UserNameTooLong {
                max: MAX_USER_NAME_LEN,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the name as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for UserName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserName::new(s)
    }
}

impl Serialize for UserName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UserName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        UserName::new(s).map_err(serde::de::Error::custom)
    }
}

/// Unordered pair of participants whose messages, presence, and typing state
/// are mutually visible
///
/// Construction normalizes participant order, so `(a, b)` and `(b, a)` name
/// the same conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    first: UserName,
    second: UserName,
}

impl ConversationKey {
    /// Create a conversation key for two distinct participants
    pub fn new(a: UserName, b: UserName) -> Result<Self, DomainError> {
        if a == b {
            return Err(DomainError::IdenticalParticipants);
        }
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Ok(Self { first, second })
    }

    /// Check whether a user participates in this conversation
    pub fn contains(&self, user: &UserName) -> bool {
        &self.first == user || &self.second == user
    }

    /// Get the other participant, if `user` is one of the pair
    pub fn other(&self, user: &UserName) -> Option<&UserName> {
        if user == &self.first {
            Some(&self.second)
        } else if user == &self.second {
            Some(&self.first)
        } else {
            None
        }
    }

    /// Both participants, in normalized order
    pub fn participants(&self) -> (&UserName, &UserName) {
        (&self.first, &self.second)
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.first, self.second)
    }
}

/// Ordered typing direction (`from` is typing to `to`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypingKey {
    pub from: UserName,
    pub to: UserName,
}

impl TypingKey {
    /// Create a typing key for a directed pair
    pub fn new(from: UserName, to: UserName) -> Result<Self, DomainError> {
        if from == to {
            return Err(DomainError::IdenticalParticipants);
        }
        Ok(Self { from, to })
    }

    /// Record path in `{from}To{to}` form (e.g. `FsToMg`)
    pub fn path(&self) -> String {
        format!("{}To{}", self.from, self.to)
    }

    /// The opposite direction of the same pair
    pub fn reversed(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

impl fmt::Display for TypingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}
