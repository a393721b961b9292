//! One companion session: receive loop, push loop, teardown.
//!
//! A session runs two independent duplex activities over one WebSocket:
//!
//! - **Receive loop** – decode one inbound frame, dispatch it, send exactly
//!   one reply.  A malformed frame gets an error reply and the session
//!   survives; a transport failure closes the session.
//! - **Push loop** – on a fixed interval, sample the providers and slot
//!   store, run the delta engine against this session's private snapshot,
//!   and send only what changed.  The loop is spawned when the session
//!   becomes active, tracked in the session record, and cancelled exactly
//!   once on teardown, so no timer ever outlives its connection.
//!
//! Both loops write to the same outbound sink, so the sink sits behind an
//! async mutex: a push and a command reply can never interleave mid-frame.
//! Within one session outbound frames are serialized; across sessions there
//! is no ordering guarantee.

use std::sync::Arc;

use clipdeck_core::{compute_delta, AckReply, FrameCodec, ReplyFrame, Snapshot};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::WebSocketStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::context::HostContext;
use crate::application::dispatch::handle_frame;
use crate::application::push::sample_host_state;

use super::SessionRegistry;

/// Lifecycle phases of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Handshake accepted, push loop not yet running.
    Connecting,
    /// Receive and push loops running.
    Active,
    /// Teardown started: push loop being cancelled.
    Closing,
    /// Session removed from the registry.
    Closed,
}

type SharedSink<S> = Arc<tokio::sync::Mutex<SplitSink<WebSocketStream<S>, WsMessage>>>;

/// Runs the complete lifecycle of one accepted session.
///
/// Generic over the underlying stream so tests can drive a session over an
/// in-memory duplex pipe exactly like a TCP connection.
pub async fn run_session<S>(
    ws: WebSocketStream<S>,
    peer: String,
    ctx: Arc<HostContext>,
    registry: Arc<SessionRegistry>,
) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let id = Uuid::new_v4();
    let mut state = SessionState::Connecting;
    debug!("session {id} ({peer}): {state:?}");

    let (ws_tx, mut ws_rx) = ws.split();
    let sink: SharedSink<S> = Arc::new(tokio::sync::Mutex::new(ws_tx));
    let cancel = CancellationToken::new();
    registry.register(id, cancel.clone()).await;

    // Snapshot starts empty, so the push loop's first cycle is a full sync.
    let push_task = tokio::spawn(push_loop(
        id,
        Arc::clone(&ctx),
        Arc::clone(&sink),
        cancel.clone(),
    ));

    state = SessionState::Active;
    info!("session {id} ({peer}): {state:?}");

    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("session {id}: cancelled while waiting for a frame");
                break;
            }
            message = ws_rx.next() => message,
        };

        match message {
            Some(Ok(WsMessage::Text(wire))) => {
                let reply = match ctx.codec.decode(&wire) {
                    Ok(frame) => handle_frame(&ctx, &frame).await,
                    Err(e) => {
                        warn!("session {id}: inbound frame decode failed: {e}");
                        ReplyFrame::Ack(AckReply::error(format!("frame decode failed: {e}")))
                    }
                };
                let json = match serde_json::to_string(&reply) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("session {id}: reply serialization failed: {e}");
                        break;
                    }
                };
                if let Err(e) = send_frame(ctx.codec.as_ref(), &sink, json).await {
                    warn!("session {id}: reply send failed: {e}");
                    break;
                }
            }
            Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_))) => {
                // Protocol-level keepalive; tungstenite answers pings itself.
                debug!("session {id}: websocket ping/pong");
            }
            Some(Ok(WsMessage::Binary(_))) => {
                warn!("session {id}: unexpected binary frame (ignored)");
            }
            Some(Ok(WsMessage::Close(_))) => {
                debug!("session {id}: close frame received");
                break;
            }
            Some(Ok(WsMessage::Frame(_))) => {
                debug!("session {id}: raw frame (ignored)");
            }
            Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => {
                debug!("session {id}: connection closed");
                break;
            }
            Some(Err(e)) => {
                warn!("session {id}: receive error: {e}");
                break;
            }
            None => {
                debug!("session {id}: stream ended");
                break;
            }
        }
    }

    state = SessionState::Closing;
    debug!("session {id}: {state:?}");
    cancel.cancel();
    let _ = push_task.await;

    let removed = registry.deregister(id).await;
    state = SessionState::Closed;
    info!("session {id} ({peer}): {state:?} (deregistered: {removed})");
    Ok(())
}

/// Periodic telemetry push for one session.
///
/// The first tick of a Tokio interval fires immediately, which is what
/// gives a freshly connected companion its full-state sync.
async fn push_loop<S>(
    id: Uuid,
    ctx: Arc<HostContext>,
    sink: SharedSink<S>,
    cancel: CancellationToken,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let mut snapshot = Snapshot::new();
    let mut ticker = tokio::time::interval(ctx.config.push_interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("session {id}: push loop cancelled");
                return;
            }
            _ = ticker.tick() => {}
        }

        let current = sample_host_state(&ctx).await;
        let (delta, next) = compute_delta(&current, &snapshot);
        snapshot = next;

        for message in delta.into_messages() {
            let json = match serde_json::to_string(&message) {
                // A frame that fails to serialize is dropped; the loop
                // carries on at the next interval.
                Err(e) => {
                    error!("session {id}: push serialization failed: {e}");
                    continue;
                }
                Ok(json) => json,
            };
            if let Err(e) = send_frame(ctx.codec.as_ref(), &sink, json).await {
                debug!("session {id}: push send failed, transport dead: {e}");
                cancel.cancel();
                return;
            }
        }
    }
}

/// Encodes and sends one frame through the shared outbound sink.
async fn send_frame<S>(
    codec: &dyn FrameCodec,
    sink: &SharedSink<S>,
    frame: String,
) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let wire = codec.encode(&frame)?;
    let mut guard = sink.lock().await;
    guard.send(WsMessage::Text(wire)).await?;
    Ok(())
}
