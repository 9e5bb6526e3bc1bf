//! Test fixtures and data generators
//!
//! Provides reusable participants and conversations for integration tests.

use std::sync::atomic::{AtomicU64, Ordering};

use sync_core::{ConversationKey, UserName};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// The two sample participants the engine grew up with
pub fn fs() -> UserName {
    UserName::new("Fs").unwrap()
}

pub fn mg() -> UserName {
    UserName::new("Mg").unwrap()
}

/// The Fs/Mg conversation
pub fn conversation() -> ConversationKey {
    ConversationKey::new(fs(), mg()).unwrap()
}

/// A participant name no other test run has used
pub fn unique_user(prefix: &str) -> UserName {
    UserName::new(format!("{prefix}{}", unique_suffix())).unwrap()
}

/// A conversation between two fresh participants
pub fn unique_conversation() -> ConversationKey {
    ConversationKey::new(unique_user("a"), unique_user("b")).unwrap()
}
