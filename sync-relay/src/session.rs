//! Per-connection session management.
//!
//! Each upgraded socket gets a Session that owns the read half, drives the
//! channel state machine from sync-core, pings on an interval, and fans
//! every text frame out through the hub.

use crate::peer::Peer;
use crate::server::RelayHub;
use axum::extract::ws::Message;
use futures_util::{Stream, StreamExt};
use std::sync::Arc;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use waveland_sync_core::{ChannelAction, ChannelEvent, ChannelState};

/// A per-connection session.
pub struct Session {
    hub: Arc<RelayHub>,
    peer: Arc<Peer>,
    state: ChannelState,
}

impl Session {
    /// Create a new session for a freshly upgraded peer.
    pub fn new(hub: Arc<RelayHub>, peer: Arc<Peer>) -> Self {
        Self {
            hub,
            peer,
            state: ChannelState::new(),
        }
    }

    /// Run the session until the channel dies.
    ///
    /// The peer is registered on entry and deregistered and closed exactly
    /// once on exit, whatever ended the channel.
    pub async fn run<S>(mut self, mut stream: S)
    where
        S: Stream<Item = Result<Message, axum::Error>> + Unpin,
    {
        // Timers first: nothing below may fail once the peer is registered.
        let limits = self.hub.config().limits.clone();
        let read_timeout = limits.read_timeout();
        let mut deadline = Instant::now() + read_timeout;
        let mut ping = interval_at(Instant::now() + limits.ping_interval(), limits.ping_interval());
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.apply(ChannelEvent::Upgraded).await;

        let event = loop {
            tokio::select! {
                _ = self.peer.closed() => {
                    break ChannelEvent::SendFailed {
                        reason: "delivery to peer failed".to_string(),
                    };
                }
                _ = ping.tick() => {
                    if let Err(e) = self.peer.ping().await {
                        break ChannelEvent::SendFailed { reason: e.to_string() };
                    }
                }
                _ = sleep_until(deadline) => break ChannelEvent::ReadTimedOut,
                next = stream.next() => {
                    match next {
                        Some(Ok(Message::Text(frame))) => {
                            deadline = Instant::now() + read_timeout;
                            self.hub.broadcast(self.peer.id(), &frame).await;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            break ChannelEvent::ReadFailed {
                                reason: "closed by peer".to_string(),
                            };
                        }
                        // Pongs, pings and binary frames only prove liveness.
                        Some(Ok(_)) => deadline = Instant::now() + read_timeout,
                        Some(Err(e)) => {
                            break ChannelEvent::ReadFailed { reason: e.to_string() };
                        }
                    }
                }
            }
        };

        match &event {
            ChannelEvent::ReadTimedOut => {
                tracing::warn!("Peer {} timed out after {:?}", self.peer.id(), read_timeout)
            }
            ChannelEvent::ReadFailed { reason } | ChannelEvent::SendFailed { reason } => {
                tracing::debug!("Peer {} channel ended: {}", self.peer.id(), reason)
            }
            ChannelEvent::Upgraded => {}
        }
        self.apply(event).await;
    }

    /// Feed an event to the state machine and perform its actions.
    async fn apply(&mut self, event: ChannelEvent) {
        let (state, actions) = self.state.on_event(event);
        self.state = state;

        for action in actions {
            match action {
                ChannelAction::Register => self.hub.register(Arc::clone(&self.peer)).await,
                ChannelAction::Deregister => {
                    self.hub.unregister(self.peer.id()).await;
                }
                ChannelAction::Close => self.peer.close().await,
            }
        }
    }

    /// Current channel state.
    pub fn state(&self) -> &ChannelState {
        &self.state
    }
}
