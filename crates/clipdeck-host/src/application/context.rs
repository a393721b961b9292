//! The explicitly constructed host context.
//!
//! Everything a session needs (the slot store, the clipboard bridge, the
//! provider implementations, the frame codec, the configuration) is
//! gathered into one [`HostContext`] built at startup and passed to every
//! session at creation.  There are no ambient singletons; tests build a
//! context out of fakes and get the exact same code paths the binary runs.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clipdeck_core::{FrameCodec, SlotStore};
use tokio::sync::Mutex;

use crate::infrastructure::clipboard::ClipboardBridge;
use crate::infrastructure::providers::{InputExecutor, MediaInfoProvider, SystemMonitor};

/// Host runtime configuration.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: SocketAddr,
    /// Number of virtual clipboard slots, fixed for the process lifetime.
    pub num_clipboards: usize,
    /// Interval between telemetry pushes to each connected client.
    pub push_interval: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:22282".parse().expect("static address"),
            num_clipboards: 10,
            push_interval: Duration::from_secs(2),
        }
    }
}

/// Shared state and collaborators for the whole process.
///
/// Sessions hold this behind an `Arc`; the slot store is the only mutable
/// piece and is protected by its own async mutex (a `set` is atomic with
/// respect to every other accessor).
pub struct HostContext {
    pub config: HostConfig,
    pub slots: Mutex<SlotStore>,
    pub bridge: ClipboardBridge,
    pub monitor: Arc<dyn SystemMonitor>,
    pub media: Arc<dyn MediaInfoProvider>,
    pub input: Arc<dyn InputExecutor>,
    pub codec: Arc<dyn FrameCodec>,
}

impl HostContext {
    /// Assembles the context.  The slot store is created here with
    /// `config.num_clipboards` empty slots.
    pub fn new(
        config: HostConfig,
        bridge: ClipboardBridge,
        monitor: Arc<dyn SystemMonitor>,
        media: Arc<dyn MediaInfoProvider>,
        input: Arc<dyn InputExecutor>,
        codec: Arc<dyn FrameCodec>,
    ) -> Self {
        let slots = Mutex::new(SlotStore::new(config.num_clipboards));
        Self {
            config,
            slots,
            bridge,
            monitor,
            media,
            input,
            codec,
        }
    }
}
