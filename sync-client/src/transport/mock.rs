//! In-memory transport for engine tests.
//!
//! Stands in for the relay: the test plays the partner by queueing
//! `name|base64` frames for the engine to receive, and reads back whatever
//! the engine sent. No sockets, no timing.

use super::{Transport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use waveland_sync_types::{FileUpdate, MAX_FRAME_SIZE};

/// A fake relay connection.
///
/// Clones share one connection, so a test keeps a handle while the engine
/// owns another. Once the partner's queue runs dry `recv()` reports
/// `ConnectionClosed`, which is how engine tests end the read loop.
#[derive(Debug, Default, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<Channel>>,
}

#[derive(Debug, Default)]
struct Channel {
    open: bool,
    relay_url: Option<String>,
    /// Frames the engine pushed towards the relay, oldest first.
    outbox: Vec<String>,
    /// Frames the partner "sent", delivered in order.
    inbox: VecDeque<String>,
    refuse_connect: Option<String>,
    refuse_send: Option<String>,
    break_recv: Option<String>,
}

impl MockTransport {
    /// A transport that still needs `connect()`.
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport already attached to a pretend relay.
    pub fn connected() -> Self {
        let transport = Self::new();
        transport.with(|channel| {
            channel.open = true;
            channel.relay_url = Some("ws://mock-relay/ws".to_string());
        });
        transport
    }

    fn with<R>(&self, f: impl FnOnce(&mut Channel) -> R) -> R {
        let mut channel = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut channel)
    }

    /// Deliver a raw frame from the partner, valid or not.
    pub fn queue_frame(&self, frame: impl Into<String>) {
        let frame = frame.into();
        self.with(|channel| channel.inbox.push_back(frame));
    }

    /// Deliver a well-formed update from the partner.
    pub fn queue_update(&self, name: &str, content: &[u8]) {
        self.queue_frame(FileUpdate::new(name, content.to_vec()).encode());
    }

    /// Every frame the engine sent, oldest first.
    pub fn sent_frames(&self) -> Vec<String> {
        self.with(|channel| channel.outbox.clone())
    }

    /// The most recent frame the engine sent.
    pub fn last_sent(&self) -> Option<String> {
        self.with(|channel| channel.outbox.last().cloned())
    }

    /// Sent frames decoded back into updates; frames that do not decode
    /// are skipped.
    pub fn sent_updates(&self) -> Vec<FileUpdate> {
        self.sent_frames()
            .iter()
            .filter_map(|frame| FileUpdate::decode(frame, MAX_FRAME_SIZE).ok())
            .collect()
    }

    /// URL passed to the last successful `connect()`.
    pub fn connected_address(&self) -> Option<String> {
        self.with(|channel| channel.relay_url.clone())
    }

    /// Make the next `connect()` fail, as an unreachable relay would.
    pub fn fail_next_connect(&self, error: &str) {
        let error = error.to_string();
        self.with(|channel| channel.refuse_connect = Some(error));
    }

    /// Make the next `send()` fail once.
    pub fn fail_next_send(&self, error: &str) {
        let error = error.to_string();
        self.with(|channel| channel.refuse_send = Some(error));
    }

    /// Make the next `recv()` fail once, as a reset socket would.
    pub fn fail_next_recv(&self, error: &str) {
        let error = error.to_string();
        self.with(|channel| channel.break_recv = Some(error));
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, address: &str) -> Result<(), TransportError> {
        self.with(|channel| {
            if let Some(error) = channel.refuse_connect.take() {
                return Err(TransportError::ConnectionFailed(error));
            }
            channel.open = true;
            channel.relay_url = Some(address.to_string());
            Ok(())
        })
    }

    async fn send(&self, frame: &str) -> Result<(), TransportError> {
        self.with(|channel| {
            if !channel.open {
                return Err(TransportError::NotConnected);
            }
            if let Some(error) = channel.refuse_send.take() {
                return Err(TransportError::SendFailed(error));
            }
            channel.outbox.push(frame.to_string());
            Ok(())
        })
    }

    async fn recv(&self) -> Result<String, TransportError> {
        self.with(|channel| {
            if !channel.open {
                return Err(TransportError::NotConnected);
            }
            if let Some(error) = channel.break_recv.take() {
                return Err(TransportError::ReceiveFailed(error));
            }
            channel
                .inbox
                .pop_front()
                .ok_or(TransportError::ConnectionClosed)
        })
    }

    fn is_connected(&self) -> bool {
        self.with(|channel| channel.open)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.with(|channel| channel.open = false);
        Ok(())
    }
}
