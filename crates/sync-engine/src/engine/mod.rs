//! Sync engine module

mod sync_engine;

pub use sync_engine::SyncEngine;
