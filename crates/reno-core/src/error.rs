use thiserror::Error;

use crate::MatchStatus;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Missing record or a caller that does not participate in it. The two
    /// cases share one variant so responses do not leak existence.
    #[error("{0} not found or access denied")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("Cannot {action} a match with status {from}")]
    InvalidTransition {
        from: MatchStatus,
        action: &'static str,
    },

    #[error("State conflict: {0}")]
    StateConflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    /// Validation failures and state conflicts are both reported to the
    /// caller as bad input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::InvalidTransition { .. } | Self::StateConflict(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
