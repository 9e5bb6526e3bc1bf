//! Ordered, de-duplicated projection of a message stream
//!
//! The log stays ground truth; this is the aggregation every renderer must
//! run before showing messages. Duplicates (same sender, same body, send
//! instants inside the duplicate window) are dropped silently, and messages
//! keep non-decreasing timestamp order with id as the tie-breaker even when
//! replay and live delivery interleave.

use chrono::Duration;

use sync_core::ChatMessage;

/// Aggregated view of one conversation, ready for rendering
pub struct ConversationView {
    messages: Vec<ChatMessage>,
    duplicate_window: Duration,
}

impl ConversationView {
    /// Create a view applying the given duplicate window
    pub fn new(duplicate_window: Duration) -> Self {
        Self {
            messages: Vec::new(),
            duplicate_window,
        }
    }

    /// Insert a delivered message
    ///
    /// Returns whether the message became visible; duplicates and re-deliveries
    /// are dropped.
    pub fn push(&mut self, message: ChatMessage) -> bool {
        if self.messages.iter().any(|m| {
            m.id == message.id || m.is_duplicate_of(&message, self.duplicate_window)
        }) {
            tracing::trace!(id = %message.id, "Duplicate message suppressed");
            return false;
        }

        let position = self
            .messages
            .partition_point(|m| (m.timestamp, m.id) <= (message.timestamp, message.id));
        self.messages.insert(position, message);
        true
    }

    /// Insert a batch; returns how many became visible
    pub fn extend(&mut self, messages: impl IntoIterator<Item = ChatMessage>) -> usize {
        messages
            .into_iter()
            .filter(|message| self.push(message.clone()))
            .count()
    }

    /// The ordered messages, oldest first
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The newest visible message (scroll target)
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Number of visible messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether anything is visible yet
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl std::fmt::Debug for ConversationView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationView")
            .field("messages", &self.messages.len())
            .finish()
    }
}
