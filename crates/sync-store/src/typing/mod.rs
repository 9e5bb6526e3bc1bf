//! Typing tracker module
//!
//! Tracks per-direction typing flags with quiet-window debounce.

mod typing_tracker;

pub use typing_tracker::TypingTracker;
