//! The sync engine
//!
//! Owns the three stores exclusively; clients only ever hold cached
//! projections delivered through subscriptions. A background sweeper demotes
//! expired presence and typing state so transitions fire without requiring
//! another write.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use chrono::Utc;
use tokio::sync::broadcast;

use sync_common::{EngineConfig, SyncResult};
use sync_core::{
    ChatMessage, ConversationKey, MessageAcceptedEvent, NewMessage, PresenceChangedEvent,
    PresenceRecord, SyncEvent, TypingChangedEvent, TypingKey, UserName,
};
use sync_store::{MessageLog, PresenceStore, TypingTracker};

use crate::session::Session;

/// Buffer for the engine-wide event feed
const EVENT_FEED_BUFFER: usize = 1024;

/// Single ingress/egress point composing the three stores
pub struct SyncEngine {
    config: EngineConfig,
    log: MessageLog,
    presence: PresenceStore,
    typing: TypingTracker,
    events: broadcast::Sender<SyncEvent>,
    running: AtomicBool,
}

impl SyncEngine {
    /// Create an engine with the given configuration
    pub fn new(config: EngineConfig) -> Arc<Self> {
        let log = MessageLog::new(config.subscriber_buffer);
        let presence = PresenceStore::new(config.presence_timeout);
        let typing = TypingTracker::new(config.typing_quiet_window);
        let (events, _) = broadcast::channel(EVENT_FEED_BUFFER);

        Arc::new(Self {
            config,
            log,
            presence,
            typing,
            events,
            running: AtomicBool::new(false),
        })
    }

    /// Create an engine with default configuration
    pub fn with_defaults() -> Arc<Self> {
        Self::new(EngineConfig::default())
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start the background expiry sweeper
    ///
    /// The task holds only a weak handle, so dropping the engine also ends
    /// the sweep.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Engine sweeper is already running");
            return;
        }

        let engine = Arc::downgrade(self);
        let interval = self.config.sweep_interval;
        tokio::spawn(async move {
            run_sweeper(engine, interval).await;
        });

        tracing::info!(interval = ?self.config.sweep_interval, "Engine started");
    }

    /// Stop the background sweeper (idempotent)
    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            tracing::info!("Engine stopped");
        }
    }

    /// Check if the sweeper is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Open a session scoped to a conversation pair
    ///
    /// `local` must be one of the participants. The session immediately
    /// claims online and keeps claiming it on the heartbeat period until
    /// closed.
    pub async fn connect(
        self: &Arc<Self>,
        conversation: ConversationKey,
        local: UserName,
    ) -> SyncResult<Session> {
        Session::open(Arc::clone(self), conversation, local).await
    }

    /// Subscribe to the engine-wide change feed
    pub fn events(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Validate and append a message, then notify subscribers
    pub async fn publish_message(&self, draft: NewMessage) -> SyncResult<ChatMessage> {
        let message = self.log.append(draft).await?;
        self.emit(SyncEvent::MessageAccepted(MessageAcceptedEvent {
            id: message.id,
            user_name: message.user_name.clone(),
            timestamp: message.accepted_at,
        }));
        Ok(message)
    }

    /// Apply a presence heartbeat, notifying on effective transitions
    pub async fn write_presence(&self, record: PresenceRecord) {
        let user = record.name.clone();
        if let Some(is_online) = self.presence.heartbeat(record).await {
            self.emit(SyncEvent::PresenceChanged(PresenceChangedEvent {
                user,
                is_online,
                timestamp: Utc::now(),
            }));
        }
    }

    /// Apply a typing update, notifying on effective transitions
    pub async fn write_typing(&self, key: &TypingKey, is_typing: bool) {
        if let Some(is_typing) = self.typing.set_typing(key, is_typing, Utc::now()).await {
            self.emit(SyncEvent::TypingChanged(TypingChangedEvent {
                from: key.from.clone(),
                to: key.to.clone(),
                is_typing,
                timestamp: Utc::now(),
            }));
        }
    }

    /// Number of messages the log accepted so far
    pub fn message_count(&self) -> usize {
        self.log.len()
    }

    pub(crate) fn log(&self) -> &MessageLog {
        &self.log
    }

    pub(crate) fn presence(&self) -> &PresenceStore {
        &self.presence
    }

    pub(crate) fn typing(&self) -> &TypingTracker {
        &self.typing
    }

    fn emit(&self, event: SyncEvent) {
        // No feed subscribers is fine.
        self.events.send(event).ok();
    }

    /// One expiry pass over presence and typing, emitting transitions
    pub(crate) fn sweep(&self) {
        let now = Utc::now();

        for user in self.presence.sweep() {
            self.emit(SyncEvent::PresenceChanged(PresenceChangedEvent {
                user,
                is_online: false,
                timestamp: now,
            }));
        }

        for key in self.typing.sweep() {
            self.emit(SyncEvent::TypingChanged(TypingChangedEvent {
                from: key.from,
                to: key.to,
                is_typing: false,
                timestamp: now,
            }));
        }
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("messages", &self.log.len())
            .field("presence_entries", &self.presence.len())
            .field("typing_entries", &self.typing.len())
            .field("running", &self.is_running())
            .finish()
    }
}

async fn run_sweeper(engine: Weak<SyncEngine>, period: std::time::Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let Some(engine) = engine.upgrade() else {
            break;
        };
        if !engine.is_running() {
            break;
        }
        engine.sweep();
    }

    tracing::debug!("Engine sweeper ended");
}
