//! Test helpers for integration tests
//!
//! Spins up in-process engines with test-friendly timing and opens session
//! pairs for both participants of a conversation.

use std::sync::Arc;
use std::time::Duration;

use sync_engine::{EngineConfig, Session, SyncEngine};

use crate::fixtures;

/// Engine configuration with the inherited production timings but a tight
/// sweep, so paused-time tests observe expiry promptly
pub fn test_config() -> EngineConfig {
    EngineConfig {
        sweep_interval: Duration::from_millis(100),
        ..EngineConfig::default()
    }
}

/// Start an engine (sweeper running) with the test configuration
pub fn start_engine() -> Arc<SyncEngine> {
    let engine = SyncEngine::new(test_config());
    engine.start();
    engine
}

/// Start an engine with a custom configuration
pub fn start_engine_with(config: EngineConfig) -> Arc<SyncEngine> {
    let engine = SyncEngine::new(config);
    engine.start();
    engine
}

/// A connected pair of sessions, one per participant
pub struct SessionPair {
    pub engine: Arc<SyncEngine>,
    pub fs: Session,
    pub mg: Session,
}

impl SessionPair {
    /// Connect both Fs and Mg to a started engine
    pub async fn connect() -> anyhow::Result<Self> {
        let engine = start_engine();
        let fs = engine
            .connect(fixtures::conversation(), fixtures::fs())
            .await?;
        let mg = engine
            .connect(fixtures::conversation(), fixtures::mg())
            .await?;
        Ok(Self { engine, fs, mg })
    }

    /// Close both sessions
    pub async fn close(&self) {
        self.fs.close().await;
        self.mg.close().await;
    }
}
