//! Domain errors - validation failures reported to the caller, never retried

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("User name must not be empty")]
    EmptyUserName,

    #[error("User name too long: max {max} characters")]
    UserNameTooLong { max: usize },

    #[error("Message text must not be empty")]
    EmptyText,

    #[error("Message text too long: max {max} characters")]
    TextTooLong { max: usize },

    #[error("Conversation participants must be distinct")]
    IdenticalParticipants,

    #[error("Validation error: {0}")]
    Validation(String),
}

impl DomainError {
    /// Get an error code string for logs and wire responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyUserName => "EMPTY_USER_NAME",
            Self::UserNameTooLong { .. } => "USER_NAME_TOO_LONG",
            Self::EmptyText => "EMPTY_TEXT",
            Self::TextTooLong { .. } => "TEXT_TOO_LONG",
            Self::IdenticalParticipants => "IDENTICAL_PARTICIPANTS",
            Self::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let mut fields: Vec<&str> = field_errors.keys().map(|k| k.as_ref()).collect();
        fields.sort_unstable();
        Self::Validation(format!("invalid fields: {}", fields.join(", ")))
    }
}
