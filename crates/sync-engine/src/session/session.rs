//! A client's logical session with the engine
//!
//! Scoped to a conversation pair; every operation fills in the session's
//! identity. Opening a session claims online immediately and keeps a
//! heartbeat task claiming it on the configured period; closing stops the
//! task and writes offline, mirroring how the app it replaces behaved when
//! its chat screen appeared and disappeared.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use sync_common::{SyncError, SyncResult};
use sync_core::{
    ChatMessage, ConversationKey, DomainError, MessageId, NewMessage, PresenceRecord, TypingKey,
    UserName,
};

use crate::engine::SyncEngine;
use crate::subscribe::{MessageStream, StateStream};

/// A logical session for one participant of a conversation
pub struct Session {
    id: String,
    engine: Arc<SyncEngine>,
    conversation: ConversationKey,
    local: UserName,
    remote: UserName,
    closed: AtomicBool,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Open a session (called through [`SyncEngine::connect`])
    pub(crate) async fn open(
        engine: Arc<SyncEngine>,
        conversation: ConversationKey,
        local: UserName,
    ) -> SyncResult<Self> {
        let remote = conversation
            .other(&local)
            .ok_or_else(|| {
                DomainError::Validation(format!(
                    "user {local} is not part of conversation {conversation}"
                ))
            })?
            .clone();

        let id = uuid::Uuid::new_v4().to_string();

        // Claim online before anything else, then keep claiming it.
        engine
            .write_presence(PresenceRecord::heartbeat(local.clone(), true, Utc::now()))
            .await;
        let heartbeat = spawn_heartbeat(&engine, &local);

        tracing::info!(
            session_id = %id,
            user = %local,
            conversation = %conversation,
            "Session opened"
        );

        Ok(Self {
            id,
            engine,
            conversation,
            local,
            remote,
            closed: AtomicBool::new(false),
            heartbeat: Mutex::new(Some(heartbeat)),
        })
    }

    /// Session id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The local participant
    pub fn local_user(&self) -> &UserName {
        &self.local
    }

    /// The other participant
    pub fn remote_user(&self) -> &UserName {
        &self.remote
    }

    /// The conversation this session is scoped to
    pub fn conversation(&self) -> &ConversationKey {
        &self.conversation
    }

    /// Whether the session was closed
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Send a message
    ///
    /// Trims the body, stamps the client send instant, and clears the local
    /// typing flag once the log accepts. The accepted message also comes
    /// back through the session's own message stream (round-trip model).
    pub async fn send(&self, text: impl Into<String>) -> SyncResult<ChatMessage> {
        self.ensure_open()?;

        let draft = NewMessage::new(self.local.as_str(), text, Utc::now());
        let message = self.engine.publish_message(draft).await?;

        self.engine.write_typing(&self.typing_key(), false).await;

        Ok(message)
    }

    /// Feed a keystroke: non-empty text renews typing, empty text clears it
    pub async fn keystroke(&self, text: &str) -> SyncResult<()> {
        self.set_typing(!text.trim().is_empty()).await
    }

    /// Set the local typing flag explicitly
    pub async fn set_typing(&self, is_typing: bool) -> SyncResult<()> {
        self.ensure_open()?;
        self.engine.write_typing(&self.typing_key(), is_typing).await;
        Ok(())
    }

    /// Set the local online flag explicitly
    pub async fn set_online(&self, is_online: bool) -> SyncResult<()> {
        self.ensure_open()?;
        self.engine
            .write_presence(PresenceRecord::heartbeat(
                self.local.clone(),
                is_online,
                Utc::now(),
            ))
            .await;
        Ok(())
    }

    /// Subscribe to the conversation's messages
    ///
    /// Replays everything after `since_id` (or the whole conversation), then
    /// stays live. Infinite and cancel-only; drop the stream to cancel.
    pub async fn messages(&self, since_id: Option<MessageId>) -> SyncResult<MessageStream> {
        self.ensure_open()?;
        let subscription = self
            .engine
            .log()
            .subscribe(self.conversation.clone(), since_id)
            .await;
        Ok(MessageStream::new(subscription))
    }

    /// Watch the other participant's effective online state
    pub fn presence_updates(&self) -> StateStream {
        StateStream::new(self.engine.presence().subscribe(&self.remote))
    }

    /// Watch whether the other participant is typing to us
    pub fn typing_updates(&self) -> StateStream {
        StateStream::new(self.engine.typing().subscribe(&self.typing_key().reversed()))
    }

    /// Current effective presence of the other participant
    pub async fn remote_presence(&self) -> PresenceRecord {
        self.engine.presence().get(&self.remote).await
    }

    /// Effective online boolean plus a display label for the other side
    pub async fn remote_status(&self) -> (bool, &'static str) {
        let online = self.engine.presence().is_online(&self.remote).await;
        (online, if online { "online" } else { "offline" })
    }

    /// Whether the other participant is currently typing to us
    pub async fn remote_typing(&self) -> bool {
        self.engine.typing().get(&self.typing_key().reversed()).await
    }

    /// Resume after a transport loss
    ///
    /// Reasserts the online heartbeat immediately and returns a fresh
    /// message stream from the last acknowledged id. Gaps are impossible;
    /// overlap is handled by consumer de-duplication.
    pub async fn resume(&self, since_id: Option<MessageId>) -> SyncResult<MessageStream> {
        self.ensure_open()?;
        self.engine
            .write_presence(PresenceRecord::heartbeat(
                self.local.clone(),
                true,
                Utc::now(),
            ))
            .await;

        tracing::info!(session_id = %self.id, since = ?since_id, "Session resumed");

        self.messages(since_id).await
    }

    /// Close the session (idempotent)
    ///
    /// Stops the heartbeat task and writes a best-effort offline record.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.stop_heartbeat();
        self.engine
            .write_presence(PresenceRecord::heartbeat(
                self.local.clone(),
                false,
                Utc::now(),
            ))
            .await;

        tracing::info!(session_id = %self.id, user = %self.local, "Session closed");
    }

    fn typing_key(&self) -> TypingKey {
        TypingKey {
            from: self.local.clone(),
            to: self.remote.clone(),
        }
    }

    fn ensure_open(&self) -> SyncResult<()> {
        if self.is_closed() {
            return Err(SyncError::SessionClosed);
        }
        Ok(())
    }

    fn stop_heartbeat(&self) {
        if let Some(handle) = self.heartbeat.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // A dropped session must not leak its periodic work; the offline
        // write still requires an explicit close().
        self.stop_heartbeat();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("local", &self.local.as_str())
            .field("remote", &self.remote.as_str())
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn spawn_heartbeat(engine: &Arc<SyncEngine>, user: &UserName) -> JoinHandle<()> {
    let period = engine.config().heartbeat_period;
    let engine = Arc::downgrade(engine);
    let user = user.clone();

    tokio::spawn(async move {
        // First renewal one period out; open() already claimed online.
        let start = tokio::time::Instant::now() + period;
        let mut ticker = tokio::time::interval_at(start, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let Some(engine) = engine.upgrade() else {
                break;
            };
            engine
                .write_presence(PresenceRecord::heartbeat(user.clone(), true, Utc::now()))
                .await;
        }
    })
}
