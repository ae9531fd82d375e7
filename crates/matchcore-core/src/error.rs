//! Error types for MatchCore

use thiserror::Error;

/// Main error type for MatchCore operations
#[derive(Debug, Error)]
pub enum MatchCoreError {
    /// Error in rule or strategy configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Count oracle failed while testing a constraint subset
    #[error("Count oracle failed while testing {subset:?}: {message}")]
    Oracle {
        /// Sorted ids of the subset that was being tested.
        subset: Vec<String>,
        /// Failure description reported by the oracle.
        message: String,
    },
}

/// Result type alias for MatchCore operations
pub type Result<T> = std::result::Result<T, MatchCoreError>;
