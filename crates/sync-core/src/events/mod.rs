//! Domain events - change notifications emitted by the engine

mod sync_event;

pub use sync_event::{
    MessageAcceptedEvent, PresenceChangedEvent, SyncEvent, TypingChangedEvent,
};
