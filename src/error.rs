//! Error handling utilities shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Convenient result type used throughout the crate.
pub type Result<T, E = JgramError> = std::result::Result<T, E>;

/// Domain-specific error describing failures during configuration, IO, or induction.
#[derive(Debug, Error)]
pub enum JgramError {
    /// Induction configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Filesystem IO error with optional context path.
    #[error("io error while processing {path:?}: {source}")]
    Io {
        /// Underlying IO error returned by the standard library.
        source: std::io::Error,
        /// Target path associated with the IO failure if available.
        path: Option<PathBuf>,
    },
    /// The synonym file could not be parsed.
    #[error("malformed synonym file: {0}")]
    Synonyms(String),
    /// Count vectorization was attempted against an empty vocabulary.
    #[error("cannot embed against an empty vocabulary")]
    EmptyVocabulary,
    /// Count vectorization met a token absent from the fixed vocabulary.
    #[error("token {0:?} not found in vocabulary")]
    UnknownToken(String),
    /// Cosine similarity was requested for vectors of different length.
    #[error("vector lengths differ: {left} vs {right}")]
    VectorLengthMismatch {
        /// Length of the left operand.
        left: usize,
        /// Length of the right operand.
        right: usize,
    },
}

impl From<serde_json::Error> for JgramError {
    fn from(err: serde_json::Error) -> Self {
        Self::Synonyms(err.to_string())
    }
}

impl JgramError {
    /// Helper constructor that attaches an optional path when wrapping IO errors.
    pub fn io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { source, path }
    }
}
