//! Quiz engine error types.
//!
//! Caller contract violations (empty pools, inverted difficulty bounds,
//! unknown kana groups) fail fast here instead of degrading silently.

use thiserror::Error;

/// Errors surfaced by the quiz engine.
#[derive(Debug, Error)]
pub enum QuizError {
    /// A selection was requested from an empty pool.
    #[error("cannot select from an empty character pool")]
    EmptyPool,

    /// The difficulty configuration violates its bounds.
    #[error("invalid difficulty config: {0}")]
    InvalidDifficulty(String),

    /// A kana group name did not match any known group.
    #[error("unknown kana group: {0}")]
    UnknownGroup(String),

    /// The durable store could not be read or written.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl QuizError {
    /// Returns `true` when the error indicates a caller contract violation
    /// rather than an environmental failure.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            QuizError::EmptyPool | QuizError::InvalidDifficulty(_) | QuizError::UnknownGroup(_)
        )
    }
}
