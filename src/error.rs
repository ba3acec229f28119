//! Unified error types for chatvault.
//!
//! A single [`ChatvaultError`] enum covers every failure that aborts an
//! operation. Problems with individual lines of an export are *not* errors:
//! they are collected as [`ParseWarning`](crate::message::ParseWarning)s on the
//! parse result instead.
//!
//! The two failures a UI has to tell apart are:
//!
//! - [`ChatvaultError::UnrecognizedFormat`]: the input is not a chat export
//!   ("not a valid export").
//! - [`ChatvaultError::Storage`]: the database rejected the operation
//!   ("database error, try again").

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A specialized [`Result`] type for chatvault operations.
///
/// # Example
///
/// ```rust
/// use chatvault::error::Result;
/// use chatvault::ParsedMessage;
///
/// fn my_function() -> Result<Vec<ParsedMessage>> {
///     Ok(vec![])
/// }
/// ```
pub type Result<T> = std::result::Result<T, ChatvaultError>;

/// The error type for all chatvault operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatvaultError {
    /// An I/O error occurred while reading an export or writing output.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// No known timestamp dialect was found in the input.
    ///
    /// Detection gives up after `line_budget` non-blank lines, or when the
    /// stream ends without a single recognizable message line.
    #[error("Not a recognized chat export{}: no message header found within {line_budget} lines", path.as_ref().map(|p| format!(" ({})", p.display())).unwrap_or_default())]
    UnrecognizedFormat {
        /// Detection budget that was exhausted
        line_budget: usize,
        /// The file path, if available
        path: Option<PathBuf>,
    },

    /// The database rejected an operation.
    ///
    /// Ingestion errors always roll back the whole transaction, so no
    /// partially imported chat is left behind.
    #[cfg(feature = "storage")]
    #[error("Database error while {context}: {source}")]
    Storage {
        /// What the store was doing
        context: &'static str,
        /// The underlying SQLite error
        #[source]
        source: rusqlite::Error,
    },

    /// JSON parsing/serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writing error.
    #[cfg(feature = "csv-output")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A chat archive is missing files or has an unsupported layout.
    #[error("Invalid archive at {}: {message}", path.display())]
    InvalidArchive {
        /// Archive directory
        path: PathBuf,
        /// Description of what's wrong
        message: String,
    },

    /// A referenced chat or message does not exist.
    #[error("{what} {id} not found")]
    NotFound {
        /// Kind of record ("chat", "message")
        what: &'static str,
        /// The missing identifier
        id: i64,
    },

    /// A date argument could not be parsed.
    #[error("Invalid date '{input}'. Expected format: {expected}")]
    InvalidDate {
        /// The invalid date string that was provided
        input: String,
        /// Expected format description
        expected: &'static str,
    },
}

#[cfg(feature = "storage")]
impl From<rusqlite::Error> for ChatvaultError {
    fn from(err: rusqlite::Error) -> Self {
        ChatvaultError::Storage {
            context: "running a query",
            source: err,
        }
    }
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl ChatvaultError {
    /// Creates an unrecognized-format error.
    pub fn unrecognized(line_budget: usize, path: Option<PathBuf>) -> Self {
        ChatvaultError::UnrecognizedFormat { line_budget, path }
    }

    /// Creates a storage error with context about the failed step.
    #[cfg(feature = "storage")]
    pub fn storage(context: &'static str, source: rusqlite::Error) -> Self {
        ChatvaultError::Storage { context, source }
    }

    /// Creates an invalid archive error.
    pub fn invalid_archive(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ChatvaultError::InvalidArchive {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(what: &'static str, id: i64) -> Self {
        ChatvaultError::NotFound { what, id }
    }

    /// Creates an invalid date error.
    pub fn invalid_date(input: impl Into<String>) -> Self {
        ChatvaultError::InvalidDate {
            input: input.into(),
            expected: "YYYY-MM-DD",
        }
    }

    /// Returns `true` if the input was not a recognizable chat export.
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, ChatvaultError::UnrecognizedFormat { .. })
    }

    /// Returns `true` if this is a database error.
    pub fn is_storage(&self) -> bool {
        #[cfg(feature = "storage")]
        {
            matches!(self, ChatvaultError::Storage { .. })
        }
        #[cfg(not(feature = "storage"))]
        {
            false
        }
    }

    /// Returns `true` if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, ChatvaultError::Io(_))
    }

    /// Returns `true` if a referenced record was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ChatvaultError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = ChatvaultError::from(io_err);
        let display = err.to_string();
        assert!(display.contains("IO error"));
        assert!(display.contains("file not found"));
        assert!(err.is_io());
    }

    #[test]
    fn test_unrecognized_display_with_path() {
        let err = ChatvaultError::unrecognized(50, Some(PathBuf::from("/tmp/notes.txt")));
        let display = err.to_string();
        assert!(display.contains("50 lines"));
        assert!(display.contains("/tmp/notes.txt"));
        assert!(err.is_unrecognized());
        assert!(!err.is_storage());
    }

    #[test]
    fn test_unrecognized_display_without_path() {
        let err = ChatvaultError::unrecognized(50, None);
        assert!(!err.to_string().contains('('));
    }

    #[cfg(feature = "storage")]
    #[test]
    fn test_storage_error_is_distinguishable() {
        let err = ChatvaultError::storage("ingesting chat", rusqlite::Error::InvalidQuery);
        assert!(err.is_storage());
        assert!(!err.is_unrecognized());
        assert!(err.to_string().contains("ingesting chat"));
    }

    #[test]
    fn test_not_found_display() {
        let err = ChatvaultError::not_found("chat", 42);
        assert_eq!(err.to_string(), "chat 42 not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_invalid_date_display() {
        let err = ChatvaultError::invalid_date("2024/13/01");
        let display = err.to_string();
        assert!(display.contains("2024/13/01"));
        assert!(display.contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_invalid_archive_display() {
        let err = ChatvaultError::invalid_archive("/backups/alice", "missing chat.json");
        let display = err.to_string();
        assert!(display.contains("/backups/alice"));
        assert!(display.contains("missing chat.json"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ChatvaultError>();
    }
}
