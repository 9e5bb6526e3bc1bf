//! Client-facing subscription handles
//!
//! Both handles are cancel-only: they never end on their own while the
//! engine lives, and dropping one is idempotent and invisible to other
//! subscribers. Notifications already queued for a dropped handle are
//! simply discarded with it.

use futures::stream::Stream;
use tokio::sync::watch;

use sync_common::SyncResult;
use sync_core::{ChatMessage, MessageId};
use sync_store::LogSubscription;

/// Ordered message stream for one conversation: replay, then live
pub struct MessageStream {
    subscription: LogSubscription,
}

impl MessageStream {
    pub(crate) fn new(subscription: LogSubscription) -> Self {
        Self { subscription }
    }

    /// Receive the next message
    ///
    /// # Errors
    /// `SubscriptionOverflow` when this consumer fell behind and was
    /// dropped; resubscribe with [`MessageStream::cursor`]. `Transport` when
    /// the engine went away.
    pub async fn recv(&mut self) -> SyncResult<ChatMessage> {
        self.subscription.recv().await
    }

    /// Replay cursor: last delivered id, for resuming without gaps
    pub fn cursor(&self) -> MessageId {
        self.subscription.cursor()
    }

    /// Adapt into a `futures::Stream`
    ///
    /// Yields `Ok` per message; on overflow it yields the error once and
    /// ends, since the consumer has to resubscribe anyway.
    pub fn into_stream(self) -> impl Stream<Item = SyncResult<ChatMessage>> {
        futures::stream::unfold(Some(self), |state| async move {
            let mut stream = state?;
            match stream.recv().await {
                Ok(message) => Some((Ok(message), Some(stream))),
                Err(err) => Some((Err(err), None)),
            }
        })
    }
}

impl std::fmt::Debug for MessageStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStream")
            .field("cursor", &self.cursor())
            .finish()
    }
}

/// Stream of effective-state transitions (presence or typing)
///
/// Emits only when the effective value flips, never on renewals, so a
/// steady heartbeat or keystroke burst causes no redundant churn downstream.
pub struct StateStream {
    rx: watch::Receiver<bool>,
}

impl StateStream {
    pub(crate) fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    /// Current effective value without waiting
    pub fn current(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for the next transition
    ///
    /// Returns `None` once the engine is gone.
    pub async fn next(&mut self) -> Option<bool> {
        match self.rx.changed().await {
            Ok(()) => Some(*self.rx.borrow_and_update()),
            Err(_) => None,
        }
    }

    /// Adapt into a `futures::Stream` of transitions
    pub fn into_stream(self) -> impl Stream<Item = bool> {
        futures::stream::unfold(self, |mut stream| async move {
            stream.next().await.map(|value| (value, stream))
        })
    }
}

impl std::fmt::Debug for StateStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStream")
            .field("current", &self.current())
            .finish()
    }
}
