//! # waveland
//!
//! Share a working directory with a pair-programming partner in real time.
//!
//! ## Commands
//!
//! - `start`: Run a relay, share files, and print the session URL
//! - `join`: Join a session and mirror it into a directory
//! - `relay`: Run a standalone relay
//! - `vim-setup`: Make Vim/Neovim reload files changed on disk
//!
//! ## Example
//!
//! ```bash
//! # Share main.py (or `.` for every file in the directory)
//! waveland start main.py
//!
//! # Behind a tunnel, print the public URL instead
//! waveland start . --public-url https://abc123.trycloudflare.com
//!
//! # On the partner's machine
//! waveland join https://abc123.trycloudflare.com
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod commands;
mod session;

use commands::{join, relay, start, vim_setup};

/// Instantly share your working directory with anyone, anywhere.
#[derive(Parser, Debug)]
#[command(name = "waveland")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a session and share files
    Start {
        /// Files to share; `.` or nothing shares every file in the directory
        files: Vec<String>,

        /// Port for the built-in relay
        #[arg(long, short, default_value_t = 8080)]
        port: u16,

        /// Public URL to print when the relay is exposed through a tunnel
        #[arg(long)]
        public_url: Option<String>,

        /// Quiet period before a save is sent, in milliseconds (50-500)
        #[arg(long, default_value_t = 50)]
        debounce_ms: u64,
    },

    /// Join an existing session
    Join {
        /// Session URL printed by `waveland start`
        url: String,

        /// Directory to mirror into
        #[arg(long, short, default_value = ".")]
        dir: PathBuf,

        /// Quiet period before a save is sent, in milliseconds (50-500)
        #[arg(long, default_value_t = 50)]
        debounce_ms: u64,
    },

    /// Run a standalone relay
    Relay {
        /// Relay configuration file
        #[arg(long, short)]
        config: Option<PathBuf>,
    },

    /// Install editor plugins that reload files changed on disk
    VimSetup,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Start {
            files,
            port,
            public_url,
            debounce_ms,
        } => {
            start::run(
                &files,
                port,
                public_url.as_deref(),
                Duration::from_millis(debounce_ms),
            )
            .await?;
        }
        Commands::Join {
            url,
            dir,
            debounce_ms,
        } => {
            join::run(&url, &dir, Duration::from_millis(debounce_ms)).await?;
        }
        Commands::Relay { config } => {
            relay::run(config.as_deref()).await?;
        }
        Commands::VimSetup => {
            vim_setup::run()?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .init();
}
