//! waveland-relay binary entry point.
//!
//! Usage:
//! ```bash
//! waveland-relay --config relay.toml
//! waveland-relay --help
//! ```

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use waveland_sync_relay::{http, shutdown_signal, Config, RelayHub};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--help" || arg == "-h") {
        println!("waveland-relay v{}", env!("CARGO_PKG_VERSION"));
        println!("Usage: waveland-relay [--config relay.toml]");
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("waveland_sync_relay=info")),
        )
        .init();

    let config = match get_config_path() {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };

    let hub = Arc::new(RelayHub::new(config));
    let listener = http::bind(&hub).await?;
    http::serve(listener, hub, shutdown_signal()).await?;
    Ok(())
}

fn get_config_path() -> Option<PathBuf> {
    std::env::args()
        .skip_while(|arg| arg != "--config")
        .nth(1)
        .map(PathBuf::from)
}
