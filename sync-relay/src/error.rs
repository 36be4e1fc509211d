//! Error types for sync-relay.

use std::time::Duration;

/// Main error type for sync-relay operations.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Could not bind the listening socket.
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// Address that was requested.
        address: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors writing to a single peer.
///
/// Any of these means the peer's channel is unusable and it will be dropped.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// The peer was already closed.
    #[error("peer closed")]
    Closed,

    /// The write did not finish within the deadline.
    #[error("write deadline exceeded after {0:?}")]
    Timeout(Duration),

    /// The underlying socket rejected the write.
    #[error("write failed: {0}")]
    Write(String),
}

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Result type alias for per-peer writes.
pub type PeerResult<T> = std::result::Result<T, PeerError>;
