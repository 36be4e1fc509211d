//! WsTransport - WebSocket transport to a waveland relay.
//!
//! The socket is split once at connect time: the write half sits behind its
//! own lock so concurrent senders queue up instead of interleaving, and the
//! read half is only ever touched by the engine's read loop.

use super::{Transport, TransportError, WRITE_TIMEOUT};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, Notify};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Configuration for WsTransport.
#[derive(Clone, Debug)]
pub struct WsTransportConfig {
    /// Connection (TCP + TLS + upgrade) timeout.
    pub connect_timeout: Duration,
    /// Deadline for writing one frame.
    pub write_timeout: Duration,
}

impl Default for WsTransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            write_timeout: WRITE_TIMEOUT,
        }
    }
}

/// WsTransport implements the Transport trait over a single WebSocket.
///
/// # Example
///
/// ```ignore
/// let transport = WsTransport::new();
/// transport.connect("wss://abc123.trycloudflare.com/ws").await?;
/// transport.send("main.py|cHJpbnQoMSk=").await?;
/// ```
pub struct WsTransport {
    /// Write half; the lock serializes concurrent senders.
    writer: Mutex<Option<SplitSink<WsStream, Message>>>,
    /// Read half; only the read loop takes this lock.
    reader: Mutex<Option<SplitStream<WsStream>>>,
    connected: AtomicBool,
    /// Wakes a pending `recv()` when the channel is torn down.
    closed: Notify,
    config: WsTransportConfig,
}

impl WsTransport {
    /// Create a new, unconnected WsTransport.
    pub fn new() -> Self {
        Self::with_config(WsTransportConfig::default())
    }

    /// Create a new WsTransport with custom configuration.
    pub fn with_config(config: WsTransportConfig) -> Self {
        // Err only means a provider is already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        Self {
            writer: Mutex::new(None),
            reader: Mutex::new(None),
            connected: AtomicBool::new(false),
            closed: Notify::new(),
            config,
        }
    }

    /// Mark the channel dead and wake the read loop.
    fn tear_down(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.closed.notify_waiters();
    }
}

impl Default for WsTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self, address: &str) -> Result<(), TransportError> {
        self.close().await.ok();

        // Nagle off: frames are small and latency matters more than batching.
        let (stream, _response) = tokio::time::timeout(
            self.config.connect_timeout,
            tokio_tungstenite::connect_async_with_config(address, None, true),
        )
        .await
        .map_err(|_| TransportError::ConnectionFailed(format!("timed out connecting to {address}")))?
        .map_err(|e| TransportError::ConnectionFailed(format!("{address}: {e}")))?;

        let (sink, source) = stream.split();
        *self.writer.lock().await = Some(sink);
        *self.reader.lock().await = Some(source);
        self.connected.store(true, Ordering::SeqCst);

        tracing::info!("Connected to {}", address);
        Ok(())
    }

    async fn send(&self, frame: &str) -> Result<(), TransportError> {
        let mut guard = self.writer.lock().await;
        let sink = guard.as_mut().ok_or(TransportError::NotConnected)?;

        let result = tokio::time::timeout(
            self.config.write_timeout,
            sink.send(Message::text(frame.to_owned())),
        )
        .await;

        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                guard.take();
                self.tear_down();
                Err(TransportError::SendFailed(e.to_string()))
            }
            Err(_) => {
                guard.take();
                self.tear_down();
                Err(TransportError::Timeout(self.config.write_timeout))
            }
        }
    }

    async fn recv(&self) -> Result<String, TransportError> {
        // Created before the flag check so a concurrent tear_down is not missed.
        let closed = self.closed.notified();
        tokio::pin!(closed);

        let mut guard = self.reader.lock().await;
        let source = guard.as_mut().ok_or(TransportError::NotConnected)?;
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionClosed);
        }

        loop {
            let next = tokio::select! {
                _ = &mut closed => return Err(TransportError::ConnectionClosed),
                next = source.next() => next,
            };

            match next {
                Some(Ok(Message::Text(text))) => return Ok(text.as_str().to_owned()),
                Some(Ok(Message::Close(_))) | None => {
                    guard.take();
                    self.tear_down();
                    return Err(TransportError::ConnectionClosed);
                }
                Some(Err(e)) => {
                    guard.take();
                    self.tear_down();
                    return Err(TransportError::ReceiveFailed(e.to_string()));
                }
                // Pings are answered by tungstenite itself; binary frames are not ours.
                Some(Ok(_)) => continue,
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.tear_down();

        if let Some(mut sink) = self.writer.lock().await.take() {
            let _ = tokio::time::timeout(self.config.write_timeout, sink.close()).await;
        }
        self.reader.lock().await.take();
        Ok(())
    }
}
