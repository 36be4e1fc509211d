//! Start command - run a relay in-process, share files, print the session URL.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use waveland_sync_relay::{http, Config, RelayHub};
use waveland_sync_types::is_editor_artifact;

use crate::session;

/// Run the start command.
pub async fn run(
    files: &[String],
    port: u16,
    public_url: Option<&str>,
    debounce: Duration,
) -> Result<()> {
    let root = std::env::current_dir()
        .and_then(|dir| dir.canonicalize())
        .context("Cannot determine the current directory")?;
    let shared = shared_files(&root, files)?;

    let hub = Arc::new(RelayHub::new(
        Config::default().with_bind_address(format!("0.0.0.0:{port}")),
    ));
    let listener = http::bind(&hub).await?;
    let port = listener.local_addr()?.port();

    let (stop_relay, relay_stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(http::serve(listener, Arc::clone(&hub), async move {
        let _ = relay_stopped.await;
    }));

    let session_url = public_url
        .map(str::to_owned)
        .unwrap_or_else(|| format!("http://localhost:{port}"));
    println!("Session started, sharing {} file(s) from {}", shared.len(), root.display());
    println!();
    println!("Your partner can join with:");
    println!("    waveland join {session_url}");
    println!();

    // Our own engine is the first peer; seed once the partner is the second.
    let partner_joined = {
        let hub = Arc::clone(&hub);
        async move {
            hub.wait_for_peers(2).await;
            println!("Partner joined, sending shared files");
        }
    };
    let result = session::run(
        &format!("ws://127.0.0.1:{port}/ws"),
        root,
        debounce,
        shared,
        partner_joined,
    )
    .await;

    let _ = stop_relay.send(());
    match server.await {
        Ok(Err(e)) => tracing::warn!("Relay stopped with error: {}", e),
        Err(e) => tracing::warn!("Relay task failed: {}", e),
        Ok(Ok(())) => {}
    }
    result
}

/// Resolve the files named on the command line.
///
/// No arguments or `.` shares every regular, non-hidden file in `root`.
/// Named files must sit directly in `root`, since only that directory is
/// watched.
pub fn shared_files(root: &Path, files: &[String]) -> Result<Vec<PathBuf>> {
    if files.is_empty() || files.iter().any(|f| f == ".") {
        return directory_files(root);
    }

    let mut shared = Vec::with_capacity(files.len());
    for file in files {
        let path = root.join(file);
        let metadata = std::fs::metadata(&path)
            .with_context(|| format!("Cannot share {file}: file not found"))?;
        if !metadata.is_file() {
            bail!("Cannot share {file}: not a regular file");
        }
        let path = path
            .canonicalize()
            .with_context(|| format!("Cannot share {file}"))?;
        if path.parent() != Some(root) {
            bail!("Cannot share {file}: only files in the current directory can be shared");
        }
        if !shared.contains(&path) {
            shared.push(path);
        }
    }
    Ok(shared)
}

fn directory_files(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(root)
        .with_context(|| format!("Cannot list {}", root.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.starts_with('.') || is_editor_artifact(name) {
            continue;
        }
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    fn fixture() -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::fs::write(root.join("main.py"), "print(1)").unwrap();
        std::fs::write(root.join("test.py"), "assert True").unwrap();
        std::fs::write(root.join(".hidden"), "x").unwrap();
        std::fs::write(root.join(".main.py.swp"), "x").unwrap();
        std::fs::write(root.join("main.py~"), "x").unwrap();
        std::fs::create_dir(root.join("src")).unwrap();
        std::fs::write(root.join("src").join("lib.py"), "x").unwrap();
        (dir, root)
    }

    #[test]
    fn dot_shares_visible_regular_files() {
        let (_dir, root) = fixture();
        let shared = shared_files(&root, &[".".to_string()]).unwrap();
        assert_eq!(names(&shared), vec!["main.py", "test.py"]);
    }

    #[test]
    fn no_arguments_shares_directory() {
        let (_dir, root) = fixture();
        let shared = shared_files(&root, &[]).unwrap();
        assert_eq!(names(&shared), vec!["main.py", "test.py"]);
    }

    #[test]
    fn named_files_are_shared_once() {
        let (_dir, root) = fixture();
        let args = vec!["main.py".to_string(), "main.py".to_string()];
        let shared = shared_files(&root, &args).unwrap();
        assert_eq!(shared, vec![root.join("main.py")]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let (_dir, root) = fixture();
        let err = shared_files(&root, &["nope.py".to_string()]).unwrap_err();
        assert!(err.to_string().contains("nope.py"));
    }

    #[test]
    fn directories_and_nested_files_are_refused() {
        let (_dir, root) = fixture();
        assert!(shared_files(&root, &["src".to_string()]).is_err());
        assert!(shared_files(&root, &["src/lib.py".to_string()]).is_err());
    }
}
