//! Sync error handling

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors from a sync exchange
#[derive(Error, Debug)]
pub enum SyncError {
    /// Malformed, truncated or oversized wire data
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Could not open a connection to the server
    #[error("Could not connect to sync server at {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The server answered with an error; displays the server's message as-is
    #[error("{0}")]
    Server(String),

    /// The exchange did not finish within the deadline
    #[error("Sync with {addr} timed out after {after:?}")]
    Timeout { addr: String, after: Duration },

    /// I/O failure on an established connection
    #[error("Sync connection error: {0}")]
    Io(#[from] io::Error),
}

impl SyncError {
    pub fn protocol(message: impl Into<String>) -> Self {
        SyncError::Protocol(message.into())
    }
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
