//! Engine configuration
//!
//! The timing constants here were inherited from the app this engine
//! replaces (5 s heartbeats against a 10 s presence timeout, 2 s typing
//! quiet window, 2 s duplicate window). They are configuration, not fixed
//! truths.

use std::env;
use std::time::Duration;

/// Engine configuration, loaded from environment variables with defaults
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a heartbeat keeps a user effectively online
    pub presence_timeout: Duration,
    /// Period of the per-session online heartbeat
    pub heartbeat_period: Duration,
    /// Keystroke inactivity after which a typing flag auto-clears
    pub typing_quiet_window: Duration,
    /// Send-instant distance under which equal messages are duplicates
    pub duplicate_window: Duration,
    /// Bounded queue size per subscriber; overflow evicts the subscriber
    pub subscriber_buffer: usize,
    /// Period of the background expiry sweep
    pub sweep_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            presence_timeout: Duration::from_millis(default_presence_timeout_ms()),
            heartbeat_period: Duration::from_millis(default_heartbeat_period_ms()),
            typing_quiet_window: Duration::from_millis(default_typing_quiet_window_ms()),
            duplicate_window: Duration::from_millis(default_duplicate_window_ms()),
            subscriber_buffer: default_subscriber_buffer(),
            sweep_interval: Duration::from_millis(default_sweep_interval_ms()),
        }
    }
}

// Default value functions
fn default_presence_timeout_ms() -> u64 {
    10_000
}

fn default_heartbeat_period_ms() -> u64 {
    5_000
}

fn default_typing_quiet_window_ms() -> u64 {
    2_000
}

fn default_duplicate_window_ms() -> u64 {
    2_000
}

fn default_subscriber_buffer() -> usize {
    256
}

fn default_sweep_interval_ms() -> u64 {
    500
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a set variable fails to parse or the resulting
    /// values are inconsistent.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let config = Self {
            presence_timeout: Duration::from_millis(parse_ms(
                "SYNC_PRESENCE_TIMEOUT_MS",
                default_presence_timeout_ms(),
            )?),
            heartbeat_period: Duration::from_millis(parse_ms(
                "SYNC_HEARTBEAT_PERIOD_MS",
                default_heartbeat_period_ms(),
            )?),
            typing_quiet_window: Duration::from_millis(parse_ms(
                "SYNC_TYPING_QUIET_WINDOW_MS",
                default_typing_quiet_window_ms(),
            )?),
            duplicate_window: Duration::from_millis(parse_ms(
                "SYNC_DUPLICATE_WINDOW_MS",
                default_duplicate_window_ms(),
            )?),
            subscriber_buffer: parse_value("SYNC_SUBSCRIBER_BUFFER", default_subscriber_buffer())?,
            sweep_interval: Duration::from_millis(parse_ms(
                "SYNC_SWEEP_INTERVAL_MS",
                default_sweep_interval_ms(),
            )?),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heartbeat_period >= self.presence_timeout {
            return Err(ConfigError::InvalidValue(
                "SYNC_HEARTBEAT_PERIOD_MS",
                "heartbeat period must be shorter than the presence timeout".to_string(),
            ));
        }
        if self.subscriber_buffer == 0 {
            return Err(ConfigError::InvalidValue(
                "SYNC_SUBSCRIBER_BUFFER",
                "subscriber buffer must be non-zero".to_string(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "SYNC_SWEEP_INTERVAL_MS",
                "sweep interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Duplicate window as a chrono duration, for send-instant arithmetic
    pub fn duplicate_window_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.duplicate_window)
            .unwrap_or_else(|_| chrono::Duration::seconds(2))
    }
}

fn parse_ms(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    parse_value(var, default)
}

fn parse_value<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(var, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
