//! # sync-core
//!
//! Domain layer containing entities, value objects, and domain events.
//! This crate has zero dependencies on infrastructure (runtime, stores, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{ChatMessage, NewMessage, PresenceRecord, TypingRecord, MAX_TEXT_LEN};
pub use error::DomainError;
pub use events::{MessageAcceptedEvent, PresenceChangedEvent, SyncEvent, TypingChangedEvent};
pub use value_objects::{
    format_millis, parse_millis, ConversationKey, MessageId, MessageIdParseError, TypingKey,
    UserName,
};
