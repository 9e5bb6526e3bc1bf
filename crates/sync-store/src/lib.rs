//! # sync-store
//!
//! The three authoritative stores behind the sync engine.
//!
//! - **Message log**: append-only, strictly increasing ids, broadcast
//!   fan-out with replay from a cursor.
//! - **Presence store**: per-user online records with TTL-based expiry.
//! - **Typing tracker**: per-direction typing flags with quiet-window
//!   debounce.
//!
//! All mutations are serialized per key (one mutex around the log vector,
//! per-entry locks for presence and typing). Clients never hold these types
//! directly; the sync engine owns them and mediates every access.

pub mod log;
pub mod presence;
pub mod typing;

// Re-export store types
pub use log::{LogSubscription, MessageLog};
pub use presence::PresenceStore;
pub use typing::TypingTracker;
