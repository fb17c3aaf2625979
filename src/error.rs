//! Journal index error types
//!
//! Defines all errors that can occur in the index, its stores and codecs.

use thiserror::Error;

/// Errors that can occur in the journal index
#[derive(Error, Debug)]
pub enum IndexError {
    /// Caller supplied a non-positive timestamp or an out of range position
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An entry is already registered under this create time
    #[error("Entry exists: timestamp={create_time}")]
    DuplicateKey { create_time: i64 },

    /// Stored bytes could not be turned back into a descriptor
    #[error("Corrupt data: {0}")]
    Corruption(String),

    /// The index was closed by its owner
    #[error("Index is closed")]
    Closed,

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failed on the write path
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The backing ordered store rejected an operation
    #[error("Store error: {0}")]
    Store(String),

    /// Journal file header is not one we understand
    #[error("Invalid journal: {0}")]
    InvalidJournal(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),
}

impl From<bincode::Error> for IndexError {
    fn from(err: bincode::Error) -> Self {
        IndexError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(err: serde_json::Error) -> Self {
        IndexError::Serialization(err.to_string())
    }
}

impl From<rusqlite::Error> for IndexError {
    fn from(err: rusqlite::Error) -> Self {
        IndexError::Store(err.to_string())
    }
}

/// Result type alias for index operations
pub type IndexResult<T> = Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IndexError::DuplicateKey { create_time: 200 };
        assert_eq!(err.to_string(), "Entry exists: timestamp=200");

        let err = IndexError::Closed;
        assert_eq!(err.to_string(), "Index is closed");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let index_err: IndexError = io_err.into();
        assert!(matches!(index_err, IndexError::Io(_)));
    }

    #[test]
    fn test_sqlite_error_conversion() {
        let err: IndexError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, IndexError::Store(_)));
    }
}
