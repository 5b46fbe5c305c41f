//! Error types for calzone.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in calzone operations.
#[derive(Error, Debug)]
pub enum CalzoneError {
    /// Submitted event fields failed a shape or range check.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// A stored row could not be decoded.
    #[error("Corrupt record at row {position} of {ledger}: {source}")]
    CorruptRecord {
        ledger: String,
        position: usize,
        #[source]
        source: RecordError,
    },

    /// A deletion target was malformed.
    #[error("Invalid deletion reference: {0}")]
    InvalidReference(String),

    /// A deletion target does not (or no longer) exist.
    #[error("Event {position} does not exist in {ledger} ({len} events)")]
    OutOfRange {
        ledger: String,
        position: usize,
        len: usize,
    },

    #[error("Storage error on {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CalzoneError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CalzoneError::Storage {
            path: path.into(),
            source,
        }
    }

    /// Whether the error describes a problem with the caller's request
    /// rather than with the stored data or the filesystem.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            CalzoneError::Validation(_)
                | CalzoneError::InvalidReference(_)
                | CalzoneError::OutOfRange { .. }
        )
    }
}

/// Field-level problems found while decoding a stored row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("expected 7 fields, found {0}")]
    FieldCount(usize),

    #[error("unterminated quoted field")]
    UnterminatedQuote,

    #[error("unexpected character after closing quote")]
    TrailingAfterQuote,

    #[error("{field} is not a number: {value:?}")]
    NotNumeric { field: &'static str, value: String },

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },

    #[error("event type {index} is not one of the {len} known categories")]
    UnknownCategory { index: usize, len: usize },

    #[error("end time sentinel is only half present")]
    PartialEndTime,
}

/// Result type alias for calzone operations.
pub type CalzoneResult<T> = Result<T, CalzoneError>;
