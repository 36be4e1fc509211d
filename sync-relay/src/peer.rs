//! One connected peer: the write half of its socket plus a close signal.
//!
//! Writes go through a per-peer lock with a deadline, so a broadcast and a
//! ping never interleave on the wire and a stalled peer cannot hold the hub
//! for longer than the write timeout.

use crate::error::{PeerError, PeerResult};
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

/// Identifies a peer for the lifetime of the relay process.
pub type PeerId = u64;

/// Write side of a peer channel.
#[async_trait]
pub trait FrameSink: Send {
    /// Write one text frame.
    async fn send_text(&mut self, frame: String) -> PeerResult<()>;

    /// Write a ping.
    async fn send_ping(&mut self) -> PeerResult<()>;

    /// Close the channel.
    async fn close(&mut self) -> PeerResult<()>;
}

#[async_trait]
impl FrameSink for SplitSink<WebSocket, Message> {
    async fn send_text(&mut self, frame: String) -> PeerResult<()> {
        self.send(Message::Text(frame))
            .await
            .map_err(|e| PeerError::Write(e.to_string()))
    }

    async fn send_ping(&mut self) -> PeerResult<()> {
        self.send(Message::Ping(Vec::new()))
            .await
            .map_err(|e| PeerError::Write(e.to_string()))
    }

    async fn close(&mut self) -> PeerResult<()> {
        SinkExt::close(self)
            .await
            .map_err(|e| PeerError::Write(e.to_string()))
    }
}

/// A registered peer.
pub struct Peer {
    id: PeerId,
    sink: Mutex<Box<dyn FrameSink>>,
    write_timeout: Duration,
    closed: AtomicBool,
    close_signal: Notify,
}

impl std::fmt::Debug for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Peer {
    /// Wrap a sink.
    pub fn new(id: PeerId, sink: impl FrameSink + 'static, write_timeout: Duration) -> Self {
        Self {
            id,
            sink: Mutex::new(Box::new(sink)),
            write_timeout,
            closed: AtomicBool::new(false),
            close_signal: Notify::new(),
        }
    }

    /// Get the peer id.
    pub fn id(&self) -> PeerId {
        self.id
    }

    /// Check whether the peer has been shut.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Send one text frame within the write deadline.
    pub async fn send_text(&self, frame: &str) -> PeerResult<()> {
        if self.is_closed() {
            return Err(PeerError::Closed);
        }
        let mut sink = self.sink.lock().await;
        tokio::time::timeout(self.write_timeout, sink.send_text(frame.to_owned()))
            .await
            .map_err(|_| PeerError::Timeout(self.write_timeout))?
    }

    /// Send a liveness ping within the write deadline.
    pub async fn ping(&self) -> PeerResult<()> {
        if self.is_closed() {
            return Err(PeerError::Closed);
        }
        let mut sink = self.sink.lock().await;
        tokio::time::timeout(self.write_timeout, sink.send_ping())
            .await
            .map_err(|_| PeerError::Timeout(self.write_timeout))?
    }

    /// Mark the peer dead and wake its session.
    ///
    /// Does not touch the socket; the session does that on its way out.
    pub fn shut(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.close_signal.notify_waiters();
    }

    /// Resolves once [`shut`](Self::shut) has been called.
    pub async fn closed(&self) {
        let notified = self.close_signal.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_closed() {
            return;
        }
        notified.await;
    }

    /// Shut the peer and close its socket.
    pub async fn close(&self) {
        self.shut();
        let mut sink = self.sink.lock().await;
        if let Ok(Err(e)) = tokio::time::timeout(self.write_timeout, sink.close()).await {
            tracing::debug!("Error closing peer {}: {}", self.id, e);
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory sinks for hub and session tests.

    use super::*;
    use std::sync::{Arc, Mutex as StdMutex};

    /// What a [`RecordingSink`] saw.
    #[derive(Debug, Default)]
    pub struct Recorded {
        pub frames: Vec<String>,
        pub pings: usize,
        pub closed: bool,
    }

    /// How a [`RecordingSink`] behaves on write.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Behaviour {
        Accept,
        Fail,
        Stall,
    }

    /// Sink that records writes, or fails/stalls on demand.
    pub struct RecordingSink {
        pub recorded: Arc<StdMutex<Recorded>>,
        pub behaviour: Behaviour,
    }

    impl RecordingSink {
        pub fn new(behaviour: Behaviour) -> (Self, Arc<StdMutex<Recorded>>) {
            let recorded = Arc::new(StdMutex::new(Recorded::default()));
            (
                Self {
                    recorded: Arc::clone(&recorded),
                    behaviour,
                },
                recorded,
            )
        }

        async fn write(&mut self) -> PeerResult<()> {
            match self.behaviour {
                Behaviour::Accept => Ok(()),
                Behaviour::Fail => Err(PeerError::Write("connection reset".into())),
                Behaviour::Stall => std::future::pending().await,
            }
        }
    }

    #[async_trait]
    impl FrameSink for RecordingSink {
        async fn send_text(&mut self, frame: String) -> PeerResult<()> {
            self.write().await?;
            self.recorded.lock().unwrap().frames.push(frame);
            Ok(())
        }

        async fn send_ping(&mut self) -> PeerResult<()> {
            self.write().await?;
            self.recorded.lock().unwrap().pings += 1;
            Ok(())
        }

        async fn close(&mut self) -> PeerResult<()> {
            self.recorded.lock().unwrap().closed = true;
            Ok(())
        }
    }
}
