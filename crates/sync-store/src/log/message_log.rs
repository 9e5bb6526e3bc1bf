//! Append-only message log with broadcast fan-out
//!
//! The log is ground truth: it never updates, deletes, or de-duplicates.
//! Ids are assigned under the log lock, so acceptance order and id order are
//! the same thing. Live delivery rides a `tokio::sync::broadcast` channel; a
//! subscriber that falls behind the channel capacity is dropped with a
//! `SubscriptionOverflow` and has to resubscribe from its replay cursor.

use std::collections::VecDeque;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use sync_common::{SyncError, SyncResult};
use sync_core::{ChatMessage, ConversationKey, MessageId, NewMessage};

/// Append-only message log
pub struct MessageLog {
    inner: Mutex<LogInner>,
    notifier: broadcast::Sender<ChatMessage>,
}

struct LogInner {
    messages: Vec<ChatMessage>,
    next_id: u64,
}

impl MessageLog {
    /// Create a log whose live fan-out buffers up to `subscriber_buffer`
    /// messages per subscriber
    pub fn new(subscriber_buffer: usize) -> Self {
        let (notifier, _) = broadcast::channel(subscriber_buffer.max(1));
        Self {
            inner: Mutex::new(LogInner {
                messages: Vec::new(),
                next_id: 0,
            }),
            notifier,
        }
    }

    /// Validate and append a message draft
    ///
    /// Assigns the next id and the accepted instant, stores the record, and
    /// notifies live subscribers. Returns the accepted message.
    pub async fn append(&self, draft: NewMessage) -> SyncResult<ChatMessage> {
        let (user_name, text, timestamp) = draft.into_checked()?;
        let accepted_at = Utc::now();

        let message = {
            let mut inner = self.inner.lock();
            inner.next_id += 1;
            let message = ChatMessage::new(
                MessageId::new(inner.next_id),
                user_name,
                text,
                timestamp,
                accepted_at,
            );
            inner.messages.push(message.clone());
            message
        };

        tracing::debug!(
            id = %message.id,
            user = %message.user_name,
            text = %message.preview(32),
            "Message accepted"
        );

        // No live subscribers is fine; replay covers them later.
        self.notifier.send(message.clone()).ok();

        Ok(message)
    }

    /// Subscribe to the conversation's messages
    ///
    /// Replays every stored message with `id > since_id` matching the filter
    /// in ascending id order, then continues with live appends. The live
    /// receiver is registered before the snapshot is taken, so no id can
    /// fall between replay and live; overlap is resolved by the cursor.
    pub async fn subscribe(
        &self,
        filter: ConversationKey,
        since_id: Option<MessageId>,
    ) -> LogSubscription {
        let live = self.notifier.subscribe();
        let cursor = since_id.unwrap_or_default();

        let replay: VecDeque<ChatMessage> = {
            let inner = self.inner.lock();
            inner
                .messages
                .iter()
                .filter(|m| m.id > cursor && filter.contains(&m.user_name))
                .cloned()
                .collect()
        };

        tracing::trace!(
            filter = %filter,
            since = %cursor,
            replay = replay.len(),
            "Log subscription opened"
        );

        LogSubscription {
            filter,
            replay,
            live,
            last_id: cursor,
        }
    }

    /// Messages with `id > since_id` matching the filter, ascending by id
    pub fn messages_after(
        &self,
        filter: &ConversationKey,
        since_id: Option<MessageId>,
    ) -> Vec<ChatMessage> {
        let cursor = since_id.unwrap_or_default();
        let inner = self.inner.lock();
        inner
            .messages
            .iter()
            .filter(|m| m.id > cursor && filter.contains(&m.user_name))
            .cloned()
            .collect()
    }

    /// Highest id assigned so far (zero before the first append)
    pub fn latest_id(&self) -> MessageId {
        MessageId::new(self.inner.lock().next_id)
    }

    /// Number of stored messages
    pub fn len(&self) -> usize {
        self.inner.lock().messages.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A live, cancel-only subscription to the log
///
/// Never terminates on its own; drop the handle to cancel. Dropping is
/// idempotent and does not affect other subscribers.
pub struct LogSubscription {
    filter: ConversationKey,
    replay: VecDeque<ChatMessage>,
    live: broadcast::Receiver<ChatMessage>,
    last_id: MessageId,
}

impl LogSubscription {
    /// Receive the next message in delivery order
    ///
    /// # Errors
    /// `SubscriptionOverflow` if this subscriber fell behind its bounded
    /// queue (resubscribe with [`LogSubscription::cursor`]); `Transport` if
    /// the log itself went away.
    pub async fn recv(&mut self) -> SyncResult<ChatMessage> {
        if let Some(message) = self.replay.pop_front() {
            self.last_id = message.id;
            return Ok(message);
        }

        loop {
            match self.live.recv().await {
                Ok(message) => {
                    // Replay overlap and other conversations are skipped here.
                    if message.id <= self.last_id || !self.filter.contains(&message.user_name) {
                        continue;
                    }
                    self.last_id = message.id;
                    return Ok(message);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        filter = %self.filter,
                        skipped = skipped,
                        "Log subscriber lagged behind and is dropped"
                    );
                    return Err(SyncError::SubscriptionOverflow { skipped });
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(SyncError::transport("message log closed"));
                }
            }
        }
    }

    /// Replay cursor: the id of the last delivered message
    pub fn cursor(&self) -> MessageId {
        self.last_id
    }
}

impl std::fmt::Debug for LogSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSubscription")
            .field("filter", &self.filter.to_string())
            .field("pending_replay", &self.replay.len())
            .field("last_id", &self.last_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sync_core::{DomainError, UserName};

    fn users() -> (UserName, UserName) {
        (UserName::new("Fs").unwrap(), UserName::new("Mg").unwrap())
    }

    fn conversation() -> ConversationKey {
        let (fs, mg) = users();
        ConversationKey::new(fs, mg).unwrap()
    }

    fn draft(user: &str, text: &str) -> NewMessage {
        NewMessage::new(user, text, Utc::now())
    }

    #[tokio::test]
    async fn test_append_assigns_increasing_ids() {
        let log = MessageLog::new(16);
        let first = log.append(draft("Fs", "one")).await.unwrap();
        let second = log.append(draft("Mg", "two")).await.unwrap();

        assert!(first.id < second.id);
        assert_eq!(first.id, MessageId::new(1));
        assert_eq!(second.id, MessageId::new(2));
        assert_eq!(log.latest_id(), second.id);
    }

    #[tokio::test]
    async fn test_append_rejects_invalid_drafts() {
        let log = MessageLog::new(16);

        let err = log.append(draft("", "hello")).await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::Validation(DomainError::EmptyUserName)
        ));

        let err = log.append(draft("Fs", "   ")).await.unwrap_err();
        assert!(matches!(err, SyncError::Validation(DomainError::EmptyText)));
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_replay_then_live() {
        let log = MessageLog::new(16);
        log.append(draft("Fs", "one")).await.unwrap();
        log.append(draft("Mg", "two")).await.unwrap();

        let mut sub = log.subscribe(conversation(), None).await;
        assert_eq!(sub.recv().await.unwrap().text, "one");
        assert_eq!(sub.recv().await.unwrap().text, "two");

        log.append(draft("Fs", "three")).await.unwrap();
        assert_eq!(sub.recv().await.unwrap().text, "three");
    }

    #[tokio::test]
    async fn test_replay_from_cursor_has_no_gaps() {
        let log = MessageLog::new(16);
        for i in 1..=5 {
            log.append(draft("Fs", &format!("m{i}"))).await.unwrap();
        }

        let mut sub = log.subscribe(conversation(), Some(MessageId::new(2))).await;
        for expected in 3..=5 {
            let message = sub.recv().await.unwrap();
            assert_eq!(message.id, MessageId::new(expected));
        }
        assert_eq!(sub.cursor(), MessageId::new(5));
    }

    #[tokio::test]
    async fn test_filter_excludes_other_conversations() {
        let log = MessageLog::new(16);
        log.append(draft("Fs", "ours")).await.unwrap();
        log.append(draft("Zz", "theirs")).await.unwrap();
        log.append(draft("Mg", "ours too")).await.unwrap();

        let mut sub = log.subscribe(conversation(), None).await;
        assert_eq!(sub.recv().await.unwrap().text, "ours");
        assert_eq!(sub.recv().await.unwrap().text, "ours too");

        log.append(draft("Zz", "still theirs")).await.unwrap();
        log.append(draft("Fs", "done")).await.unwrap();
        assert_eq!(sub.recv().await.unwrap().text, "done");
    }

    #[tokio::test]
    async fn test_sender_receives_own_message() {
        // Round-trip confirmation model: the writer's own subscription sees
        // the accepted message.
        let log = MessageLog::new(16);
        let mut sub = log.subscribe(conversation(), None).await;

        let accepted = log.append(draft("Fs", "hello")).await.unwrap();
        let delivered = sub.recv().await.unwrap();
        assert_eq!(delivered, accepted);
    }

    #[tokio::test]
    async fn test_slow_subscriber_overflows() {
        let log = MessageLog::new(4);
        let mut sub = log.subscribe(conversation(), None).await;

        // Saturate well past the buffer without draining.
        for i in 0..32 {
            log.append(draft("Fs", &format!("m{i}"))).await.unwrap();
        }

        let mut overflowed = false;
        for _ in 0..32 {
            match sub.recv().await {
                Ok(_) => {}
                Err(SyncError::SubscriptionOverflow { skipped }) => {
                    assert!(skipped > 0);
                    overflowed = true;
                    break;
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert!(overflowed);

        // Resubscribing from the cursor recovers the skipped range.
        let cursor = sub.cursor();
        let recovered = log.messages_after(&conversation(), Some(cursor));
        assert_eq!(recovered.last().unwrap().id, log.latest_id());
    }

    #[tokio::test]
    async fn test_messages_after_matches_subscription_replay() {
        let log = MessageLog::new(16);
        for i in 0..4 {
            log.append(draft("Mg", &format!("m{i}"))).await.unwrap();
        }

        let all = log.messages_after(&conversation(), None);
        assert_eq!(all.len(), 4);
        let tail = log.messages_after(&conversation(), Some(MessageId::new(3)));
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].id, MessageId::new(4));
    }
}
