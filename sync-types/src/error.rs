//! Error types for waveland frames.

use thiserror::Error;

/// Reasons a received frame is refused.
///
/// Every variant is recoverable: the offending frame is dropped and the
/// read loop keeps going.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Frame exceeds the configured size cap and was not parsed
    #[error("frame too large: {size} bytes (limit: {limit} bytes)")]
    TooLarge {
        /// Actual frame size in bytes
        size: usize,
        /// Maximum accepted size in bytes
        limit: usize,
    },

    /// Frame has no `|` delimiter
    #[error("malformed frame: missing name delimiter")]
    Malformed,

    /// Name would resolve outside the working directory
    #[error("unsafe file name: {0:?}")]
    UnsafeName(String),

    /// Name is an editor swap/backup/temp file
    #[error("editor artifact: {0:?}")]
    EditorArtifact(String),

    /// Payload is not valid base64
    #[error("failed to decode payload for {name}: {source}")]
    Decode {
        /// The file name the payload was addressed to
        name: String,
        /// Underlying base64 error
        #[source]
        source: base64::DecodeError,
    },
}
