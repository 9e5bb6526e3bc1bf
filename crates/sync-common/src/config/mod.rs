//! Configuration module
//!
//! Loads engine configuration from environment variables.

mod engine_config;

pub use engine_config::{ConfigError, EngineConfig};
