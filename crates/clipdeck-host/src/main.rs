//! Clipdeck host entry point.
//!
//! This binary accepts WebSocket connections from companion devices
//! (phones/tablets on the same LAN) and lets them drive the host's
//! clipboard slots and media keys while the host pushes live telemetry
//! back.
//!
//! # Usage
//!
//! ```text
//! clipdeck-host [OPTIONS]
//!
//! Options:
//!   --port <PORT>            WebSocket listener port [default: 22282]
//!   --bind <ADDR>            Bind address [default: 0.0.0.0]
//!   --slots <N>              Number of virtual clipboard slots [default: 10]
//!   --push-interval <SECS>   Seconds between telemetry pushes [default: 2]
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable                 | Default   | Description               |
//! |--------------------------|-----------|---------------------------|
//! | `CLIPDECK_PORT`          | `22282`   | WebSocket listener port   |
//! | `CLIPDECK_BIND`          | `0.0.0.0` | Bind address              |
//! | `CLIPDECK_SLOTS`         | `10`      | Virtual clipboard slots   |
//! | `CLIPDECK_PUSH_INTERVAL` | `2`       | Push interval in seconds  |
//!
//! # What happens at startup
//!
//! 1. `tracing_subscriber` is initialised; the log level is controlled by
//!    `RUST_LOG` (default `info`).
//! 2. CLI arguments become a [`HostConfig`].
//! 3. The default collaborators are wired into one [`HostContext`]: the
//!    `arboard`-backed clipboard, the `sysinfo` monitor, an inert media
//!    provider, a logging input executor, and the identity frame codec.
//! 4. A Ctrl+C handler clears a shared shutdown flag; the accept loop
//!    checks it every 200 ms and cancels all live sessions on exit.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use clipdeck_core::PlainCodec;
use clipdeck_host::application::context::{HostConfig, HostContext};
use clipdeck_host::infrastructure::clipboard::{ClipboardBridge, OsClipboard, SystemClipboard};
use clipdeck_host::infrastructure::providers::{
    InputExecutor, LoggingInputExecutor, NullMediaProvider, SysinfoMonitor,
};
use clipdeck_host::infrastructure::server::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Clipdeck host server.
#[derive(Debug, Parser)]
#[command(
    name = "clipdeck-host",
    about = "Remote clipboard and media deck for companion devices on the LAN",
    version
)]
struct Cli {
    /// TCP port for the WebSocket listener.
    #[arg(long, default_value_t = 22282, env = "CLIPDECK_PORT")]
    port: u16,

    /// IP address to bind the listener to.
    ///
    /// Use `0.0.0.0` to accept companions from any interface, or
    /// `127.0.0.1` for local connections only.
    #[arg(long, default_value = "0.0.0.0", env = "CLIPDECK_BIND")]
    bind: String,

    /// Number of virtual clipboard slots.
    #[arg(long, default_value_t = 10, env = "CLIPDECK_SLOTS")]
    slots: usize,

    /// Seconds between telemetry pushes to each connected companion.
    #[arg(long, default_value_t = 2, env = "CLIPDECK_PUSH_INTERVAL")]
    push_interval: u64,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`HostConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error when the bind address is not a valid IP, when the
    /// slot count is zero, or when the push interval is zero.
    fn into_host_config(self) -> anyhow::Result<HostConfig> {
        let bind_addr: SocketAddr = format!("{}:{}", self.bind, self.port)
            .parse()
            .with_context(|| format!("invalid bind address: '{}:{}'", self.bind, self.port))?;

        if self.slots == 0 {
            anyhow::bail!("--slots must be at least 1");
        }
        if self.push_interval == 0 {
            anyhow::bail!("--push-interval must be at least 1 second");
        }

        Ok(HostConfig {
            bind_addr,
            num_clipboards: self.slots,
            push_interval: Duration::from_secs(self.push_interval),
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.into_host_config()?;

    info!(
        "clipdeck host starting — bind={}, slots={}, push every {:?}",
        config.bind_addr, config.num_clipboards, config.push_interval
    );

    // Wire the default collaborators into the context every session shares.
    let os_clipboard: Arc<dyn OsClipboard> = Arc::new(
        SystemClipboard::new().context("failed to open the system clipboard")?,
    );
    let input: Arc<dyn InputExecutor> = Arc::new(LoggingInputExecutor);
    let bridge = ClipboardBridge::new(os_clipboard, Arc::clone(&input));
    let ctx = Arc::new(HostContext::new(
        config,
        bridge,
        Arc::new(SysinfoMonitor::new()),
        Arc::new(NullMediaProvider),
        input,
        Arc::new(PlainCodec),
    ));

    // Shared shutdown flag, cleared by Ctrl+C.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C — initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_server(ctx, running).await?;

    info!("clipdeck host stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
