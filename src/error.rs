//! Error types for the feedback review tool.
//!
//! This module defines the custom error types used by the store and its
//! callers. It uses the `thiserror` crate to derive error implementations and
//! provides conversions from the I/O and CSV errors the store runs into.

use thiserror::Error;

/// Custom error type for the feedback review tool.
#[derive(Error, Debug)]
pub enum Error {
    /// Input rejected before touching the store (empty key, bad score)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A persisted row or header does not have the expected shape
    #[error("Corrupt store at line {line}: {reason}")]
    CorruptStore { line: u64, reason: String },

    /// Error related to file system operations
    #[error("File system error: {0}")]
    FileSystem(String),

    /// CSV encoding error not tied to a specific row
    #[error("CSV error: {0}")]
    Csv(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::FileSystem(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line());
        match (err.kind(), line) {
            (csv::ErrorKind::Io(_), _) => Error::FileSystem(err.to_string()),
            (_, Some(line)) => Error::CorruptStore {
                line,
                reason: err.to_string(),
            },
            (_, None) => Error::Csv(err.to_string()),
        }
    }
}
