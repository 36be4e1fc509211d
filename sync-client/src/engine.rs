//! SyncEngine - mirrors one local directory through a relay.
//!
//! # Architecture
//!
//! ```text
//! local edit → FileWatcher → debounce → send_file → Transport → relay
//! relay → Transport → read loop → handle_frame → disk
//!                                      ↓
//!                         HashLedger + applying flag
//! ```
//!
//! Two pieces of state keep the directions from feeding each other:
//! - the **applying flag** is raised while a received update is being
//!   written, and the outbound path refuses to send while it is up;
//! - the **hash ledger** remembers the last content sent or written per file,
//!   so the filesystem event caused by our own write is recognised as
//!   already in sync once the flag is down again.
//!
//! # Example
//!
//! ```ignore
//! let transport = WsTransport::new();
//! transport.connect("ws://127.0.0.1:8080/ws").await?;
//!
//! let engine = SyncEngine::new(SyncConfig::new(root), transport);
//! let (stop, shutdown) = tokio::sync::watch::channel(false);
//! let tasks = engine.start(shutdown)?;
//! engine.send_file(Path::new("main.py")).await;
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use waveland_sync_core::HashLedger;
use waveland_sync_types::{
    is_editor_artifact, validate_name, ContentHash, FileUpdate, FrameError, DELIMITER,
    MAX_FRAME_SIZE,
};

use crate::transport::{Transport, TransportError};
use crate::watcher::FileWatcher;

/// Largest file the outbound path will read and send (10 MiB).
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default quiet period before a burst of filesystem events is sent.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

/// Shortest accepted debounce window.
pub const MIN_DEBOUNCE: Duration = Duration::from_millis(50);

/// Longest accepted debounce window.
pub const MAX_DEBOUNCE: Duration = Duration::from_millis(500);

/// Engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A received frame failed validation and was dropped.
    #[error("rejected frame: {0}")]
    Frame(#[from] FrameError),

    /// A received update could not be written to disk.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The OS file watcher could not be created or attached.
    #[error("cannot watch {path}: {source}")]
    WatcherSetup {
        /// Directory that was to be watched.
        path: PathBuf,
        /// Underlying notify error.
        #[source]
        source: notify::Error,
    },

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Configuration for SyncEngine.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Directory being mirrored. Should be absolute so watcher paths and
    /// seeded names resolve to the same files.
    pub root: PathBuf,
    /// Quiet period before a debounced send fires.
    pub debounce: Duration,
    /// Files larger than this are never read for sending.
    pub max_file_size: u64,
    /// Frames larger than this are dropped before parsing.
    pub max_frame_size: usize,
}

impl SyncConfig {
    /// Create a configuration with default limits for the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            debounce: DEFAULT_DEBOUNCE,
            max_file_size: MAX_FILE_SIZE,
            max_frame_size: MAX_FRAME_SIZE,
        }
    }

    /// Set the debounce window, clamped to 50–500 ms.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce.clamp(MIN_DEBOUNCE, MAX_DEBOUNCE);
        self
    }

    /// Set the outbound file size cap.
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Set the inbound frame size cap.
    pub fn with_max_frame_size(mut self, bytes: usize) -> Self {
        self.max_frame_size = bytes;
        self
    }
}

/// What the outbound path did with a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The file was framed and handed to the transport.
    Sent,
    /// A received update was being written; sending would echo it.
    ApplyingRemote,
    /// The name cannot travel safely (artifact, delimiter, not a bare name).
    InvalidName,
    /// The file could not be stat'ed or is not a regular file.
    Missing,
    /// The file exceeds the size cap.
    TooLarge,
    /// The file could not be read.
    ReadFailed,
    /// Content matches the last synced hash.
    Unchanged,
    /// The transport refused the frame.
    SendFailed,
}

/// Handles to the engine's background tasks.
#[derive(Debug)]
pub struct EngineTasks {
    /// Ends when the channel closes or shutdown is signalled.
    pub read_loop: JoinHandle<()>,
    /// Ends when shutdown is signalled; releases the OS watcher.
    pub watcher: JoinHandle<()>,
}

/// Resolves once shutdown is signalled or the signalling side is gone.
pub(crate) async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Raises the applying flag for its lifetime.
///
/// Dropping clears the flag on every exit path, including errors and
/// cancellation of the enclosing future.
struct ApplyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ApplyGuard<'a> {
    fn engage(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self { flag }
    }
}

impl Drop for ApplyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

struct EngineInner<T> {
    config: SyncConfig,
    transport: T,
    ledger: HashLedger,
    applying: AtomicBool,
    /// The single armed debounce timer, if any.
    pending: Mutex<Option<JoinHandle<()>>>,
}

/// The peer-side mirroring engine.
///
/// Cheap to clone; clones share all state.
pub struct SyncEngine<T: Transport> {
    inner: Arc<EngineInner<T>>,
}

impl<T: Transport> Clone for SyncEngine<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport + 'static> SyncEngine<T> {
    /// Create a new engine over an already connected transport.
    pub fn new(config: SyncConfig, transport: T) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                config,
                transport,
                ledger: HashLedger::new(),
                applying: AtomicBool::new(false),
                pending: Mutex::new(None),
            }),
        }
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// Get the content-hash ledger.
    pub fn ledger(&self) -> &HashLedger {
        &self.inner.ledger
    }

    /// Get a reference to the underlying transport.
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Check whether a received update is being written right now.
    pub fn is_applying(&self) -> bool {
        self.inner.applying.load(Ordering::SeqCst)
    }

    /// Start the read loop and the filesystem watcher.
    ///
    /// Fails only if the OS watcher cannot be set up; that is fatal for the
    /// session and should be reported to the user.
    pub fn start(&self, shutdown: watch::Receiver<bool>) -> Result<EngineTasks, EngineError> {
        let root = &self.inner.config.root;
        let watcher = FileWatcher::new(root).map_err(|source| EngineError::WatcherSetup {
            path: root.clone(),
            source,
        })?;

        let engine = self.clone();
        let read_shutdown = shutdown.clone();
        let read_loop = tokio::spawn(async move { engine.run_read_loop(read_shutdown).await });
        let watcher = tokio::spawn(watcher.run(self.clone(), shutdown));

        tracing::info!("Watching {}", root.display());
        Ok(EngineTasks { read_loop, watcher })
    }

    /// Send a file if it changed since it was last synced.
    ///
    /// Relative paths are taken relative to the mirrored directory. Failures
    /// are logged and reported in the outcome; nothing is retried.
    pub async fn send_file(&self, path: &Path) -> SendOutcome {
        if self.is_applying() {
            tracing::debug!(
                "Skipping send of {} - applying a received update",
                path.display()
            );
            return SendOutcome::ApplyingRemote;
        }

        let path = self.absolute(path);
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_owned) else {
            return SendOutcome::InvalidName;
        };
        if validate_name(&name).is_err() || name.contains(DELIMITER) || is_editor_artifact(&name) {
            tracing::debug!("Not sending {:?}: name cannot be mirrored", name);
            return SendOutcome::InvalidName;
        }

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return SendOutcome::Missing,
            Err(e) => {
                tracing::debug!("Cannot stat {}: {}", path.display(), e);
                return SendOutcome::Missing;
            }
        };

        let limit = self.inner.config.max_file_size;
        if metadata.len() > limit {
            tracing::warn!(
                "File {} too large ({} bytes, limit {} bytes)",
                name,
                metadata.len(),
                limit
            );
            return SendOutcome::TooLarge;
        }

        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Error reading {}: {}", path.display(), e);
                return SendOutcome::ReadFailed;
            }
        };

        if !self
            .inner
            .ledger
            .record_if_changed(&name, ContentHash::of(&content))
        {
            tracing::debug!("Skipping {} - hash unchanged", name);
            return SendOutcome::Unchanged;
        }

        let size = content.len();
        let frame = FileUpdate::new(name, content).encode();
        match self.inner.transport.send(&frame).await {
            Ok(()) => {
                tracing::info!("Sent {} ({} bytes)", path.display(), size);
                SendOutcome::Sent
            }
            Err(e) => {
                tracing::warn!("Error sending {}: {}", path.display(), e);
                SendOutcome::SendFailed
            }
        }
    }

    /// Send a file even if its content was already sent.
    ///
    /// For initial shares: an earlier send may have gone out while nobody
    /// else was connected.
    pub async fn resend_file(&self, path: &Path) -> SendOutcome {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            self.inner.ledger.forget(name);
        }
        self.send_file(path).await
    }

        /// Arm the debounce timer for `path`, replacing any pending one.
    ///
    /// When the window passes without another call, `send_file` runs once
    /// for the most recent path.
    pub async fn schedule_send(&self, path: PathBuf) {
        let mut pending = self.inner.pending.lock().await;
        if let Some(timer) = pending.take() {
            timer.abort();
        }

        let engine = self.clone();
        let delay = self.inner.config.debounce;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Detached: a later reschedule must not abort a send mid-write.
            tokio::spawn(async move {
                engine.send_file(&path).await;
            });
        }));
    }

    /// Validate a received frame and write it to disk.
    ///
    /// Returns the name of the file that was written.
    pub async fn handle_frame(&self, frame: &str) -> Result<String, EngineError> {
        let update = FileUpdate::decode(frame, self.inner.config.max_frame_size)?;
        self.apply(update).await
    }

    /// Write a validated update, with echo suppression around the write.
    async fn apply(&self, update: FileUpdate) -> Result<String, EngineError> {
        let path = self.inner.config.root.join(&update.name);
        let hash = ContentHash::of(&update.content);

        {
            let _applying = ApplyGuard::engage(&self.inner.applying);
            tokio::fs::write(&path, &update.content)
                .await
                .map_err(|source| EngineError::Write {
                    path: path.clone(),
                    source,
                })?;
            self.inner.ledger.record(&update.name, hash);
        }

        tracing::info!(
            "Received update to {} ({} bytes)",
            update.name,
            update.content.len()
        );
        Ok(update.name)
    }

    /// Receive and apply frames until the channel closes or shutdown.
    ///
    /// Invalid frames and write failures are logged and skipped.
    pub async fn run_read_loop(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            let received = tokio::select! {
                biased;
                _ = stopped(&mut shutdown) => {
                    tracing::debug!("Read loop stopped");
                    return;
                }
                received = self.inner.transport.recv() => received,
            };

            match received {
                Ok(frame) => {
                    if let Err(e) = self.handle_frame(&frame).await {
                        tracing::warn!("Dropped update: {}", e);
                    }
                }
                Err(TransportError::ConnectionClosed) => {
                    tracing::info!("Connection closed");
                    return;
                }
                Err(e) => {
                    tracing::error!("Connection lost: {}", e);
                    return;
                }
            }
        }
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.inner.config.root.join(path)
        }
    }
}
