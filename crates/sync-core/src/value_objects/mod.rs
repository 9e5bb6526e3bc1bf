//! Value objects - identifiers and keys shared across the engine

mod identity;
mod message_id;
mod timestamp;

pub use identity::{ConversationKey, TypingKey, UserName};
pub use message_id::{MessageId, MessageIdParseError};
pub use timestamp::{format_millis, iso_millis, parse_millis, ISO_MILLIS_FORMAT};
