//! Error types for the ladder
//!
//! Operations return the anyhow-based [`Result`] alias; the specific failure
//! kinds below travel inside it and callers classify them with
//! `downcast_ref::<LadderError>()`.

use uuid::Uuid;

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific ladder scenarios
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LadderError {
    #[error("Invalid match submission: {reason}")]
    Validation { reason: String },

    #[error("Player '{name}' already exists")]
    DuplicateName { name: String },

    #[error("Player '{name}' not found")]
    PlayerNotFound { name: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Concurrent update on player {player_id} (after {attempts} attempt(s))")]
    ConcurrencyConflict { player_id: Uuid, attempts: u32 },

    #[error("Admin access required (actor: {actor})")]
    Unauthorized { actor: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl LadderError {
    /// Whether the error is a displayable, non-fatal message for the user
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            LadderError::Configuration { .. } | LadderError::Storage { .. }
        )
    }

    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        LadderError::Validation {
            reason: reason.into(),
        }
    }

    pub(crate) fn lock_poisoned(table: &str) -> Self {
        LadderError::Storage {
            message: format!("Failed to acquire {} lock", table),
        }
    }
}

/// Find the ladder error carried by an anyhow error, if any
pub fn ladder_error(err: &anyhow::Error) -> Option<&LadderError> {
    err.downcast_ref::<LadderError>()
}
