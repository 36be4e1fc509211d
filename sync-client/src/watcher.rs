//! FileWatcher - OS change notifications for the mirrored directory.
//!
//! The notify callback runs on the watcher's own thread; it only forwards
//! into an unbounded tokio channel. [`FileWatcher::run`] drains that channel
//! on the runtime, maps each path back to the file the user meant, and arms
//! the engine's debounce timer.

use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, watch};
use waveland_sync_core::resolve_event_path;

use crate::engine::{stopped, SyncEngine};
use crate::transport::Transport;

/// Watches a single directory, non-recursively.
pub struct FileWatcher {
    // Dropping this detaches the OS watch.
    _watcher: RecommendedWatcher,
    events: mpsc::UnboundedReceiver<notify::Result<Event>>,
    root: PathBuf,
}

impl FileWatcher {
    /// Attach a watcher to `root`.
    pub fn new(root: &Path) -> notify::Result<Self> {
        let (tx, events) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.send(res);
        })?;
        watcher.watch(root, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            events,
            root: root.to_path_buf(),
        })
    }

    /// Get the watched directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Forward qualifying events to `engine` until shutdown.
    pub async fn run<T: Transport + 'static>(
        mut self,
        engine: SyncEngine<T>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            let received = tokio::select! {
                biased;
                _ = stopped(&mut shutdown) => break,
                received = self.events.recv() => received,
            };

            match received {
                Some(Ok(event)) => {
                    for path in paths_to_send(&event) {
                        engine.schedule_send(path).await;
                    }
                }
                Some(Err(e)) => tracing::warn!("Watcher error: {}", e),
                None => break,
            }
        }
        tracing::debug!("Stopped watching {}", self.root.display());
    }
}

/// Check whether an event kind can mean "file content changed".
pub fn is_qualifying(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}

/// Map an event to the paths worth sending, in event order.
///
/// Editor save detours (`x.tmp`, `x~`) resolve to `x` when `x` exists;
/// everything else that looks like an editor artifact is dropped.
pub fn paths_to_send(event: &Event) -> Vec<PathBuf> {
    if !is_qualifying(&event.kind) {
        return Vec::new();
    }
    event
        .paths
        .iter()
        .filter_map(|path| resolve_event_path(path, |p| p.exists()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SyncConfig;
    use crate::transport::MockTransport;
    use notify::event::{AccessKind, CreateKind, DataChange, ModifyKind, RemoveKind};
    use std::time::Duration;
    use tempfile::tempdir;

    fn event(kind: EventKind, paths: &[&Path]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |event, path| event.add_path(path.to_path_buf()))
    }

    #[test]
    fn create_and_modify_qualify() {
        assert!(is_qualifying(&EventKind::Create(CreateKind::File)));
        assert!(is_qualifying(&EventKind::Modify(ModifyKind::Data(
            DataChange::Content
        ))));
        assert!(!is_qualifying(&EventKind::Remove(RemoveKind::File)));
        assert!(!is_qualifying(&EventKind::Access(AccessKind::Any)));
    }

    #[test]
    fn plain_write_is_sent_as_is() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("main.py");
        std::fs::write(&path, "x").unwrap();

        let paths = paths_to_send(&event(EventKind::Create(CreateKind::File), &[&path]));
        assert_eq!(paths, vec![path]);
    }

    #[test]
    fn tmp_and_backup_resolve_to_target() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("main.py");
        std::fs::write(&target, "x").unwrap();

        let tmp = dir.path().join("main.py.tmp");
        let backup = dir.path().join("main.py~");
        let paths = paths_to_send(&event(
            EventKind::Modify(ModifyKind::Any),
            &[&tmp, &backup],
        ));
        assert_eq!(paths, vec![target.clone(), target]);
    }

    #[test]
    fn detour_without_target_is_dropped() {
        let dir = tempdir().unwrap();
        let tmp = dir.path().join("ghost.txt.tmp");

        assert!(paths_to_send(&event(EventKind::Create(CreateKind::File), &[&tmp])).is_empty());
    }

    #[test]
    fn swap_files_are_dropped() {
        let dir = tempdir().unwrap();
        let swap = dir.path().join(".main.py.swp");
        std::fs::write(&swap, "x").unwrap();

        assert!(paths_to_send(&event(EventKind::Create(CreateKind::File), &[&swap])).is_empty());
    }

    #[test]
    fn removals_are_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("main.py");

        assert!(paths_to_send(&event(EventKind::Remove(RemoveKind::File), &[&path])).is_empty());
    }

    #[test]
    fn watching_missing_directory_fails() {
        let dir = tempdir().unwrap();
        assert!(FileWatcher::new(&dir.path().join("nope")).is_err());
    }

    #[tokio::test]
    async fn local_edit_reaches_transport() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let transport = MockTransport::connected();
        let engine = SyncEngine::new(SyncConfig::new(&root), transport.clone());
        let watcher = FileWatcher::new(&root).unwrap();
        assert_eq!(watcher.root(), root.as_path());

        let (stop, shutdown) = watch::channel(false);
        let task = tokio::spawn(watcher.run(engine, shutdown));

        std::fs::write(root.join("main.py"), "print(1)").unwrap();

        let mut sent = Vec::new();
        for _ in 0..40 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            sent = transport.sent_frames();
            if !sent.is_empty() {
                break;
            }
        }
        assert_eq!(sent, vec!["main.py|cHJpbnQoMSk="]);

        stop.send(true).unwrap();
        task.await.unwrap();
    }
}
