//! Join command - mirror a running session into a local directory.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;

use crate::session;

/// Run the join command.
pub async fn run(url: &str, dir: &Path, debounce: Duration) -> Result<()> {
    let root = dir
        .canonicalize()
        .with_context(|| format!("Cannot use {} as the session directory", dir.display()))?;
    let ws_url = session_ws_url(url);

    println!("Joining {} in {}", ws_url, root.display());
    session::run(&ws_url, root, debounce, Vec::new(), std::future::ready(())).await
}

/// Turn the URL someone pasted into the relay's WebSocket endpoint.
///
/// `https://` becomes `wss://`, `http://` becomes `ws://`, a bare host is
/// treated as `ws://`, and `/ws` is appended when missing.
pub fn session_ws_url(url: &str) -> String {
    let url = url.trim();
    let url = if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if url.contains("://") {
        url.to_string()
    } else {
        format!("ws://{url}")
    };

    if url.ends_with("/ws") {
        url
    } else {
        format!("{}/ws", url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn https_becomes_wss() {
        assert_eq!(
            session_ws_url("https://abc123.trycloudflare.com"),
            "wss://abc123.trycloudflare.com/ws"
        );
    }

    #[test]
    fn http_becomes_ws() {
        assert_eq!(
            session_ws_url("http://192.168.1.20:8080"),
            "ws://192.168.1.20:8080/ws"
        );
    }

    #[test]
    fn trailing_slash_is_not_doubled() {
        assert_eq!(
            session_ws_url("https://abc123.trycloudflare.com/"),
            "wss://abc123.trycloudflare.com/ws"
        );
    }

    #[test]
    fn existing_ws_path_is_kept() {
        assert_eq!(
            session_ws_url("wss://abc123.trycloudflare.com/ws"),
            "wss://abc123.trycloudflare.com/ws"
        );
        assert_eq!(
            session_ws_url("http://localhost:8080/ws"),
            "ws://localhost:8080/ws"
        );
    }

    #[test]
    fn bare_host_gets_ws_scheme() {
        assert_eq!(session_ws_url("localhost:8080"), "ws://localhost:8080/ws");
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(
            session_ws_url("  https://abc.example.com \n"),
            "wss://abc.example.com/ws"
        );
    }
}
