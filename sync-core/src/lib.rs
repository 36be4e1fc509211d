//! # sync-core
//!
//! Pure logic for waveland (no network I/O, instant tests).
//!
//! This crate implements the decisions behind mirroring without touching
//! sockets, enabling fast unit tests.
//!
//! ## Modules
//!
//! - [`state`]: per-channel lifecycle (`Connecting → Registered → Closed`)
//! - [`resolve`]: maps raw watcher paths to the real file an editor saved
//! - [`ledger`]: last-known content hash per file name, for send dedup and
//!   echo suppression
//!
//! The actual I/O (sockets, disk) is performed by `sync-client` and
//! `sync-relay`, which act on the decisions made here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ledger;
pub mod resolve;
pub mod state;

pub use ledger::HashLedger;
pub use resolve::resolve_event_path;
pub use state::{ChannelAction, ChannelEvent, ChannelState};
