//! Message log module
//!
//! Append-only, timestamp-carrying record of chat messages.

mod message_log;

pub use message_log::{LogSubscription, MessageLog};
