//! Unified error handling for the engine

mod sync_error;

pub use sync_error::{SyncError, SyncResult};
