//! # sync-relay
//!
//! WebSocket fan-out relay for waveland.
//!
//! This crate implements a relay server that:
//! - Accepts WebSocket peers on `/ws`
//! - Forwards every text frame to every other connected peer
//! - Drops peers that stop answering pings or cannot keep up with writes
//! - Never inspects or stores frame contents
//!
//! ## Architecture
//!
//! ```text
//! Peer A ──┐                      ┌── Peer B
//!          │      WebSocket       │
//!          ├─────────────────────►│
//!          │                      │
//!      ┌───┴──────────────────────┴───┐
//!      │          sync-relay          │
//!      │  ┌────────────────────────┐  │
//!      │  │ RelayHub (peer set)    │  │
//!      │  └────────────────────────┘  │
//!      └──────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! let hub = Arc::new(RelayHub::new(Config::default()));
//! let listener = http::bind(&hub).await?;
//! http::serve(listener, hub, shutdown_signal()).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod http;
pub mod peer;
pub mod protocol;
pub mod server;
pub mod session;
pub mod shutdown;

pub use config::{Config, ConfigError};
pub use error::{PeerError, RelayError};
pub use peer::{FrameSink, Peer, PeerId};
pub use server::{RelayHub, RelayMetrics};
pub use shutdown::shutdown_signal;
