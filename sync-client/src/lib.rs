//! # sync-client
//!
//! Peer-side engine for waveland directory mirroring.
//!
//! A peer watches one directory, sends each changed file to the relay as a
//! `name|base64` frame, and writes every frame it receives back to disk.
//!
//! ## Features
//!
//! - **Debounced sends**: a burst of save events becomes one frame
//! - **Echo suppression**: received writes are never sent back
//! - **Hash dedup**: unchanged content is not re-sent
//! - **Transport Abstraction**: Pluggable transport layer (WebSocket, mock)
//!
//! ## Example
//!
//! ```ignore
//! use waveland_sync_client::{SyncConfig, SyncEngine, Transport, WsTransport};
//!
//! let transport = WsTransport::new();
//! transport.connect("wss://abc123.trycloudflare.com/ws").await?;
//!
//! let engine = SyncEngine::new(SyncConfig::new(root), transport);
//! let (stop, shutdown) = tokio::sync::watch::channel(false);
//! let tasks = engine.start(shutdown)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod transport;
pub mod watcher;

pub use engine::{
    EngineError, EngineTasks, SendOutcome, SyncConfig, SyncEngine, DEFAULT_DEBOUNCE,
    MAX_DEBOUNCE, MAX_FILE_SIZE, MIN_DEBOUNCE,
};
pub use transport::{
    MockTransport, Transport, TransportError, WsTransport, WsTransportConfig, WRITE_TIMEOUT,
};
pub use watcher::{is_qualifying, paths_to_send, FileWatcher};
