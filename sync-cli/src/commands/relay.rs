//! Relay command - run a standalone relay.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use waveland_sync_relay::{http, shutdown_signal, Config, RelayHub};

/// Run the relay command.
pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = match config_path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load relay config {}", path.display()))?,
        None => Config::default(),
    };

    let hub = Arc::new(RelayHub::new(config));
    let listener = http::bind(&hub).await?;
    println!("Relay listening on {}", listener.local_addr()?);
    http::serve(listener, hub, shutdown_signal()).await?;
    Ok(())
}
