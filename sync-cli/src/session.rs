//! Run a sync engine against a relay until Ctrl-C or the channel closes.

use anyhow::{Context, Result};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;
use waveland_sync_client::{
    EngineError, SendOutcome, SyncConfig, SyncEngine, Transport, WsTransport,
};
use waveland_sync_relay::shutdown_signal;

/// Connect to `url`, mirror `root`, and push each of `seeds` once
/// `partner_joined` resolves.
///
/// A frame sent with nobody else on the relay is lost, so seeds wait.
pub async fn run<F>(
    url: &str,
    root: PathBuf,
    debounce: Duration,
    seeds: Vec<PathBuf>,
    partner_joined: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let transport = WsTransport::new();
    transport
        .connect(url)
        .await
        .with_context(|| format!("Failed to connect to {url}"))?;

    let engine = SyncEngine::new(SyncConfig::new(root).with_debounce(debounce), transport);
    let (stop, shutdown) = watch::channel(false);

    let tasks = match engine.start(shutdown) {
        Ok(tasks) => tasks,
        Err(e @ EngineError::WatcherSetup { .. }) => {
            print_watch_failure_help();
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    println!("File watching active, all changes will sync!");
    print_autoread_hints();

    let seeding = tokio::spawn(seed_when_ready(engine.clone(), seeds, partner_joined));

    let mut read_loop = tasks.read_loop;
    let channel_closed = tokio::select! {
        _ = shutdown_signal() => false,
        _ = &mut read_loop => true,
    };

    let _ = stop.send(true);
    if channel_closed {
        println!("Session ended: the relay closed the connection.");
    } else {
        let _ = read_loop.await;
        println!();
        println!("Goodbye!");
    }
    seeding.abort();
    let _ = tasks.watcher.await;
    let _ = engine.transport().close().await;
    Ok(())
}

/// Wait for `ready`, then send each seed once, regardless of what was sent
/// before anyone was listening.
pub async fn seed_when_ready<T, F>(engine: SyncEngine<T>, seeds: Vec<PathBuf>, ready: F)
where
    T: Transport + 'static,
    F: Future<Output = ()>,
{
    if seeds.is_empty() {
        return;
    }
    ready.await;
    for seed in &seeds {
        report_seed(seed, engine.resend_file(seed).await);
    }
}

fn report_seed(path: &Path, outcome: SendOutcome) {
    let name = path.file_name().unwrap_or(path.as_os_str()).to_string_lossy();
    match outcome {
        SendOutcome::Sent => println!("Shared {name}"),
        SendOutcome::Unchanged => {}
        SendOutcome::TooLarge => println!("Not sharing {name}: larger than 10 MiB"),
        other => println!("Not sharing {name}: {other:?}"),
    }
}

fn print_watch_failure_help() {
    println!();
    println!("Cannot watch this directory (filesystem issue).");
    println!();
    println!("Quick fix - start from a fresh, writable directory:");
    println!("   $ mkdir -p /tmp/waveland && cd /tmp/waveland");
    println!("   $ waveland join <session-url>");
    println!();
}

fn print_autoread_hints() {
    println!();
    println!("Vim/Neovim users: run `waveland vim-setup`, or add to your config:");
    println!();
    println!("    set autoread");
    println!("    au CursorHold,CursorHoldI * checktime");
    println!("    au FocusGained,BufEnter * :checktime");
    println!("    set updatetime=600");
    println!();
    println!("Happy coding!");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use waveland_sync_relay::{http, Config, RelayHub};

    async fn engine(url: &str, root: &Path) -> SyncEngine<WsTransport> {
        let transport = WsTransport::new();
        transport.connect(url).await.unwrap();
        SyncEngine::new(SyncConfig::new(root.to_path_buf()), transport)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn seeds_reach_partner_who_joins_later() {
        let hub = Arc::new(RelayHub::new(
            Config::default().with_bind_address("127.0.0.1:0"),
        ));
        let listener = http::bind(&hub).await.unwrap();
        let url = format!("ws://{}/ws", listener.local_addr().unwrap());
        tokio::spawn(http::serve(
            listener,
            Arc::clone(&hub),
            std::future::pending::<()>(),
        ));

        let host_dir = tempfile::tempdir().unwrap();
        let host_root = host_dir.path().canonicalize().unwrap();
        std::fs::write(host_root.join("main.py"), "print(1)").unwrap();
        let host = engine(&url, &host_root).await;

        let seeding = tokio::spawn(seed_when_ready(
            host.clone(),
            vec![host_root.join("main.py")],
            {
                let hub = Arc::clone(&hub);
                async move { hub.wait_for_peers(2).await }
            },
        ));

        // Alone on the relay: nothing may be sent yet.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!seeding.is_finished());
        assert!(host.ledger().is_empty());

        let guest_dir = tempfile::tempdir().unwrap();
        let guest_root = guest_dir.path().canonicalize().unwrap();
        let guest = engine(&url, &guest_root).await;
        let (_stop, shutdown) = watch::channel(false);
        let reader = tokio::spawn({
            let guest = guest.clone();
            async move { guest.run_read_loop(shutdown).await }
        });

        tokio::time::timeout(Duration::from_secs(2), seeding)
            .await
            .unwrap()
            .unwrap();

        let mirrored = guest_root.join("main.py");
        let mut received = None;
        for _ in 0..60 {
            received = std::fs::read(&mirrored).ok();
            if received.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(received.as_deref(), Some(&b"print(1)"[..]));

        reader.abort();
    }

    #[tokio::test]
    async fn no_seeds_skips_waiting() {
        let dir = tempfile::tempdir().unwrap();
        let transport = waveland_sync_client::MockTransport::connected();
        let engine = SyncEngine::new(SyncConfig::new(dir.path()), transport.clone());

        tokio::time::timeout(
            Duration::from_secs(1),
            seed_when_ready(engine, Vec::new(), std::future::pending::<()>()),
        )
        .await
        .unwrap();
        assert!(transport.sent_frames().is_empty());
    }
}
