//! Engine error taxonomy
//!
//! No variant is fatal to the engine process; every error is scoped to the
//! failing operation or session.

use sync_core::DomainError;

/// Engine-wide error type
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Rejected input. Reported to the caller, never retried.
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// Network or write failure. Safe to retry for the idempotent presence
    /// and typing writes; message sends lean on the duplicate rule instead
    /// of blind retry.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// A subscriber fell behind its bounded queue and was dropped. The
    /// caller must resubscribe with its replay cursor.
    #[error("Subscription overflowed: {skipped} notifications dropped")]
    SubscriptionOverflow { skipped: u64 },

    /// Operation on a session that was already closed.
    #[error("Session is closed")]
    SessionClosed,
}

/// Result alias for engine operations
pub type SyncResult<T> = Result<T, SyncError>;

impl SyncError {
    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Whether re-invoking the same operation is a sound recovery
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Get an error code string for logs
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.code(),
            Self::Transport { .. } => "TRANSPORT_ERROR",
            Self::SubscriptionOverflow { .. } => "SUBSCRIPTION_OVERFLOW",
            Self::SessionClosed => "SESSION_CLOSED",
        }
    }
}
