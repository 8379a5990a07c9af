//! Storage error handling
//!
//! Provides typed errors for repository operations with descriptive messages
//! and recovery suggestions.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Input rejected before reaching the database
    #[error("{0}")]
    Validation(String),

    /// No user row with this ID
    #[error("User {0} not found")]
    UserNotFound(i64),

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl StorageError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        StorageError::Validation(message.into())
    }

    /// Check if the caller can fix this by changing its input
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StorageError::Validation(_) | StorageError::UserNotFound(_)
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            StorageError::UserNotFound(_) => {
                Some("Run any task command with --user NAME to create the user first.")
            }
            StorageError::Database(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::DatabaseBusy =>
            {
                Some("Another process is using the database. Try again in a moment.")
            }
            _ => None,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
