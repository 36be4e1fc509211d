//! RelayHub - the set of live peers and frame fan-out.
//!
//! Every add, every remove and every full broadcast iteration happens under
//! one mutex, so a frame is delivered either to all peers that were
//! registered when it arrived or (for a peer racing its own teardown) to a
//! peer that immediately drops it. Frames are forwarded opaquely.

use crate::config::Config;
use crate::peer::{Peer, PeerId};
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex};

/// Operational metrics for monitoring relay activity.
///
/// All counters are monotonically increasing (reset only on restart).
#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// Total WebSocket upgrades accepted.
    pub connections_total: AtomicU64,
    /// Total frames received from peers.
    pub frames_received: AtomicU64,
    /// Total frame deliveries to peers (one frame to N peers counts N).
    pub frames_delivered: AtomicU64,
    /// Total bytes received in frames.
    pub bytes_received: AtomicU64,
    /// Total failed deliveries.
    pub send_failures: AtomicU64,
}

/// Main relay hub.
pub struct RelayHub {
    config: Config,
    peers: Mutex<HashMap<PeerId, Arc<Peer>>>,
    /// Mirrors `peers.len()`, updated under the peers lock.
    registered: watch::Sender<usize>,
    next_id: AtomicU64,
    metrics: RelayMetrics,
    started: Instant,
}

impl std::fmt::Debug for RelayHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayHub")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl RelayHub {
    /// Create an empty hub.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            peers: Mutex::new(HashMap::new()),
            registered: watch::Sender::new(0),
            next_id: AtomicU64::new(1),
            metrics: RelayMetrics::default(),
            started: Instant::now(),
        }
    }

    /// Get the relay configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get access to the operational metrics.
    pub fn metrics(&self) -> &RelayMetrics {
        &self.metrics
    }

    /// Time since the hub was created.
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Allocate an id for a new peer.
    pub fn next_peer_id(&self) -> PeerId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Add a peer to the broadcast set.
    pub async fn register(&self, peer: Arc<Peer>) {
        let mut peers = self.peers.lock().await;
        let id = peer.id();
        peers.insert(id, peer);
        self.registered.send_replace(peers.len());
        tracing::info!("Peer {} connected (total: {})", id, peers.len());
    }

    /// Remove a peer from the broadcast set.
    ///
    /// Returns `true` only for the call that actually removed it.
    pub async fn unregister(&self, id: PeerId) -> bool {
        let mut peers = self.peers.lock().await;
        let removed = peers.remove(&id).is_some();
        if removed {
            self.registered.send_replace(peers.len());
            tracing::info!("Peer {} disconnected (remaining: {})", id, peers.len());
        }
        removed
    }

    /// Forward `frame` from `sender` to every other registered peer.
    ///
    /// A failed delivery is logged and the failed peer is shut; its own
    /// session then deregisters it. The sender is never affected. Returns
    /// the number of peers the frame reached.
    pub async fn broadcast(&self, sender: PeerId, frame: &str) -> usize {
        self.metrics.frames_received.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .bytes_received
            .fetch_add(frame.len() as u64, Ordering::Relaxed);

        let peers = self.peers.lock().await;
        let deliveries = peers
            .values()
            .filter(|peer| peer.id() != sender)
            .map(|peer| async move { (peer, peer.send_text(frame).await) });
        let results = join_all(deliveries).await;

        let mut delivered = 0;
        for (peer, result) in results {
            match result {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!("Error forwarding to peer {}: {}", peer.id(), e);
                    self.metrics.send_failures.fetch_add(1, Ordering::Relaxed);
                    peer.shut();
                }
            }
        }
        self.metrics
            .frames_delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);

        tracing::debug!(
            "Relayed {} bytes from peer {} to {}/{} peers",
            frame.len(),
            sender,
            delivered,
            peers.len().saturating_sub(1)
        );
        delivered
    }

    /// Number of registered peers.
    pub async fn peer_count(&self) -> usize {
        self.peers.lock().await.len()
    }

    /// Resolve once at least `count` peers are registered.
    pub async fn wait_for_peers(&self, count: usize) {
        let mut registered = self.registered.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = registered.wait_for(|n| *n >= count).await;
    }

    /// Shut every peer; their sessions close the sockets and deregister.
    pub async fn close_all(&self) {
        let peers = self.peers.lock().await;
        for peer in peers.values() {
            peer.shut();
        }
    }
}
