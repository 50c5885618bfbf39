//! Error types for the quiz core.
//!
//! `SourceError` and `StoreError` are produced by backends implementing the
//! traits in [`crate::traits`]; `QuizError` is what the core reports to its
//! callers. Defined here so backends in other crates share one vocabulary.

use thiserror::Error;

/// Errors that can occur while fetching a question partition.
#[derive(Debug, Error)]
pub enum SourceError {
    /// No partition exists at the requested path.
    #[error("partition not found: {0}")]
    NotFound(String),

    /// The partition exists but its records could not be decoded.
    #[error("malformed partition {path}: {message}")]
    Malformed { path: String, message: String },

    /// Reading the partition failed.
    #[error("I/O error reading {path}: {message}")]
    Io { path: String, message: String },
}

/// Errors that can occur while reading or writing the key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing medium could not be read or written.
    #[error("store I/O failed: {0}")]
    Io(String),

    /// The backing medium holds data that is not a key-value document.
    #[error("store is corrupt: {0}")]
    Corrupt(String),
}

/// Errors reported by the quiz core.
#[derive(Debug, Error)]
pub enum QuizError {
    /// Every partition fetch failed or returned no records.
    #[error("question bank unavailable for difficulty '{0}'")]
    BankUnavailable(String),

    /// The difficulty string contained no level tags.
    #[error("invalid difficulty: '{0}'")]
    InvalidDifficulty(String),

    /// A session was started with no questions.
    #[error("session has no questions")]
    EmptySession,

    /// An operation was called in a phase that does not accept it.
    #[error("cannot {action} while {phase}")]
    InvalidPhase {
        action: &'static str,
        phase: &'static str,
    },

    /// The chosen option index does not exist on the current question.
    #[error("option {choice} out of range (question has {available} options)")]
    InvalidChoice { choice: usize, available: usize },

    /// The end-of-session reward has already been applied.
    #[error("session reward already issued")]
    RewardAlreadyIssued,
}
