//! Transport abstraction for waveland.
//!
//! This module provides a pluggable transport layer that abstracts
//! the underlying connection mechanism (WebSocket, mock for testing).
//!
//! # Design
//!
//! The transport trait is async and connection-oriented:
//! - `connect()` establishes a connection
//! - `send()` transmits one text frame, serialized against concurrent senders
//! - `recv()` receives the next text frame
//! - `close()` gracefully terminates
//!
//! `send()` may be called from several tasks at once (a seeded initial push
//! racing a debounced send), `recv()` only from the engine's read loop.
//!
//! # Example
//!
//! ```ignore
//! let transport = WsTransport::new();
//! transport.connect("ws://127.0.0.1:8080/ws").await?;
//! transport.send("main.py|cHJpbnQoMSk=").await?;
//! let frame = transport.recv().await?;
//! ```

mod mock;
mod websocket;

pub use mock::MockTransport;
pub use websocket::{WsTransport, WsTransportConfig};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Deadline for a single frame write.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport errors.
///
/// All of these are fatal to the channel: the engine logs them and stops
/// using the connection. There is no automatic reconnect.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Not connected.
    #[error("not connected")]
    NotConnected,

    /// Connection closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Write deadline exceeded.
    #[error("write deadline exceeded after {0:?}")]
    Timeout(Duration),
}

/// Transport trait for sending and receiving waveland frames.
///
/// Implementations handle the underlying connection mechanism
/// (WebSocket, mock, etc).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to a relay identified by the given address.
    ///
    /// For WebSocket this is a `ws://` or `wss://` URL. For testing, it's arbitrary.
    async fn connect(&self, address: &str) -> Result<(), TransportError>;

    /// Send one text frame.
    ///
    /// Safe to call concurrently; writes are serialized and bounded by a deadline.
    async fn send(&self, frame: &str) -> Result<(), TransportError>;

    /// Receive the next text frame.
    ///
    /// Blocks until a frame is available or the connection closes.
    async fn recv(&self) -> Result<String, TransportError>;

    /// Check if currently connected.
    fn is_connected(&self) -> bool;

    /// Close the connection gracefully.
    async fn close(&self) -> Result<(), TransportError>;
}
