//! WebSocket server: accept loop and session registry.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting incoming connections from companion devices.
//! 3. Upgrading each connection to a WebSocket session and handing it to
//!    [`session::run_session`] in its own Tokio task.
//! 4. Tracking every live session in a [`SessionRegistry`] so process
//!    shutdown can cancel them all deterministically.
//!
//! The accept loop uses a short timeout on `accept()` so it can notice the
//! shutdown flag even when no clients are connecting; one slow client never
//! blocks another because each session runs in its own task.

pub mod session;

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::context::HostContext;

/// Live sessions, keyed by session id.
///
/// Each entry holds the session's cancellation token.  Deregistration is
/// exactly-once: the first caller removes the entry, later callers see
/// `false`, which is also how a session distinguishes "I closed myself"
/// from "shutdown already cancelled me".
#[derive(Default)]
pub struct SessionRegistry {
    sessions: tokio::sync::Mutex<HashMap<Uuid, CancellationToken>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a session and its cancellation token.
    pub async fn register(&self, id: Uuid, cancel: CancellationToken) {
        self.sessions.lock().await.insert(id, cancel);
    }

    /// Removes a session.  Returns `true` only for the first removal.
    pub async fn deregister(&self, id: Uuid) -> bool {
        self.sessions.lock().await.remove(&id).is_some()
    }

    /// Cancels every registered session (process shutdown).
    pub async fn cancel_all(&self) {
        let sessions = self.sessions.lock().await;
        for (id, cancel) in sessions.iter() {
            info!("cancelling session {id}");
            cancel.cancel();
        }
    }

    /// Number of currently registered sessions.
    pub async fn active_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

/// Runs the main accept loop until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound (port in use,
/// missing permission).
pub async fn run_server(ctx: Arc<HostContext>, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(ctx.config.bind_addr)
        .await
        .with_context(|| format!("failed to bind listener on {}", ctx.config.bind_addr))?;

    info!("clipdeck host listening on {}", ctx.config.bind_addr);

    let registry = Arc::new(SessionRegistry::new());

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // Short timeout so the loop re-checks the shutdown flag even while
        // no companions are connecting.
        match timeout(Duration::from_millis(200), listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                info!("new companion connection from {peer_addr}");
                let ctx = Arc::clone(&ctx);
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    handle_companion_connection(stream, peer_addr.to_string(), ctx, registry)
                        .await;
                });
            }
            Ok(Err(e)) => {
                // Transient accept error; keep serving.
                error!("accept error: {e}");
            }
            Err(_) => {
                // Timeout; loop back to check the shutdown flag.
            }
        }
    }

    registry.cancel_all().await;
    Ok(())
}

/// Entry point of each per-connection task: completes the WebSocket
/// handshake, runs the session, and logs the outcome.
async fn handle_companion_connection(
    stream: TcpStream,
    peer: String,
    ctx: Arc<HostContext>,
    registry: Arc<SessionRegistry>,
) {
    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake failed with {peer}: {e}");
            return;
        }
    };

    match session::run_session(ws, peer.clone(), ctx, registry).await {
        Ok(()) => info!("session from {peer} closed normally"),
        Err(e) => warn!("session from {peer} closed with error: {e:#}"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registry_register_then_deregister_once() {
        let registry = SessionRegistry::new();
        let id = Uuid::new_v4();
        registry.register(id, CancellationToken::new()).await;
        assert_eq!(registry.active_count().await, 1);

        assert!(registry.deregister(id).await, "first removal succeeds");
        assert!(!registry.deregister(id).await, "second removal is a no-op");
        assert_eq!(registry.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_cancel_all_fires_every_token() {
        let registry = SessionRegistry::new();
        let first = CancellationToken::new();
        let second = CancellationToken::new();
        registry.register(Uuid::new_v4(), first.clone()).await;
        registry.register(Uuid::new_v4(), second.clone()).await;

        registry.cancel_all().await;

        assert!(first.is_cancelled());
        assert!(second.is_cancelled());
    }
}
