//! Inbound command dispatch.
//!
//! One inbound frame produces exactly one reply frame.  Decoding happens
//! once, at this boundary: a frame either becomes a typed
//! [`ClientCommand`] (matched exhaustively below), an echo of itself (any
//! well-formed JSON whose `type` is not a command; this is how liveness
//! pings succeed), or an error acknowledgement (unparseable JSON, or a
//! known command with a malformed body).
//!
//! # The input allow-list
//!
//! `input` commands are the one place a remote client reaches the host's
//! input stack, so the set it may trigger is a fixed allow-list enforced
//! here, before the executor is ever touched.  Everything else (arbitrary
//! key combos, shutdown commands, mouse control) is rejected with an
//! explicit error payload and never executed.

use clipdeck_core::{
    AckReply, ClientCommand, HostMessage, ReplyFrame, SlotContent, SlotPayload, UploadKind,
    UploadPayload,
};
use tracing::warn;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::infrastructure::clipboard::ClipboardError;

use super::context::HostContext;

/// Input commands a client is permitted to trigger.
pub const ALLOWED_INPUT_COMMANDS: [&str; 3] = ["play_pause", "next_track", "prev_track"];

/// Command tags [`handle_frame`] recognizes; a well-formed frame with any
/// other tag is echoed instead of rejected.
const KNOWN_COMMAND_TYPES: [&str; 5] = [
    "input",
    "clipboard_copy",
    "clipboard_paste",
    "clipboard_upload",
    "clipboard_download",
];

/// Decodes one inbound frame and produces its reply.
pub async fn handle_frame(ctx: &HostContext, frame: &str) -> ReplyFrame {
    match serde_json::from_str::<ClientCommand>(frame) {
        Ok(command) => dispatch(ctx, command).await,
        Err(command_err) => match serde_json::from_str::<serde_json::Value>(frame) {
            // A known command whose body failed to decode is an error on
            // that frame; anything else well-formed is echoed back.
            Ok(value) => {
                let is_known_command = value
                    .get("type")
                    .and_then(|tag| tag.as_str())
                    .is_some_and(|tag| KNOWN_COMMAND_TYPES.contains(&tag));
                if is_known_command {
                    ReplyFrame::Ack(AckReply::error(format!("malformed command: {command_err}")))
                } else {
                    ReplyFrame::Ack(AckReply::echo(value))
                }
            }
            Err(json_err) => {
                ReplyFrame::Ack(AckReply::error(format!("invalid JSON frame: {json_err}")))
            }
        },
    }
}

/// Executes one typed command and produces its reply.
pub async fn dispatch(ctx: &HostContext, command: ClientCommand) -> ReplyFrame {
    match command {
        ClientCommand::Input { command } => handle_input(ctx, &command),

        ClientCommand::ClipboardCopy { id } => {
            match ctx.bridge.copy_into(&ctx.slots, id).await {
                Ok(()) => clipboard_snapshot(ctx).await,
                Err(ClipboardError::Slot(e)) => ReplyFrame::Ack(AckReply::error(e.to_string())),
                // Clipboard access problems are best-effort no-ops: the
                // bridge restored what it could, the session survives, and
                // the client still gets the current snapshot.
                Err(e) => {
                    warn!("clipboard copy into slot {id} failed: {e}");
                    clipboard_snapshot(ctx).await
                }
            }
        }

        ClientCommand::ClipboardPaste { id } => {
            match ctx.bridge.paste_from(&ctx.slots, id).await {
                Ok(()) => clipboard_snapshot(ctx).await,
                Err(ClipboardError::Slot(e)) => ReplyFrame::Ack(AckReply::error(e.to_string())),
                Err(e) => {
                    warn!("clipboard paste from slot {id} failed: {e}");
                    clipboard_snapshot(ctx).await
                }
            }
        }

        ClientCommand::ClipboardUpload { id, data } => handle_upload(ctx, id, data).await,

        ClientCommand::ClipboardDownload { id } => {
            let store = ctx.slots.lock().await;
            match store.get(id) {
                Ok(content) => ReplyFrame::Envelope(HostMessage::ClipboardDownload {
                    data: SlotPayload::from_content(content),
                }),
                Err(e) => ReplyFrame::Ack(AckReply::error(e.to_string())),
            }
        }
    }
}

fn handle_input(ctx: &HostContext, command: &str) -> ReplyFrame {
    if !ALLOWED_INPUT_COMMANDS.contains(&command) {
        return ReplyFrame::Ack(AckReply::error(format!(
            "Input command ({command}) not allowed."
        )));
    }
    match ctx.input.execute(command) {
        Ok(()) => ReplyFrame::Ack(AckReply::success(format!(
            "Input command ({command}) executed."
        ))),
        Err(e) => ReplyFrame::Ack(AckReply::error(format!("Input command ({command}) failed: {e}"))),
    }
}

/// Stores client-supplied content directly, no OS clipboard round trip.
async fn handle_upload(ctx: &HostContext, id: usize, data: UploadPayload) -> ReplyFrame {
    let content = match data.kind {
        UploadKind::Text => SlotContent::Text(data.content),
        UploadKind::Image => match decode_base64_image(&data.content) {
            Ok(bytes) => SlotContent::Image(bytes),
            Err(e) => {
                return ReplyFrame::Ack(AckReply::error(format!("image upload rejected: {e}")))
            }
        },
    };

    let mut store = ctx.slots.lock().await;
    match store.set(id, content, None) {
        Ok(()) => {
            drop(store);
            clipboard_snapshot(ctx).await
        }
        Err(e) => ReplyFrame::Ack(AckReply::error(e.to_string())),
    }
}

/// Full snapshot of every slot: the reply to every clipboard mutation,
/// distinct from the diffed periodic push.
async fn clipboard_snapshot(ctx: &HostContext) -> ReplyFrame {
    let data = ctx.slots.lock().await.export_all();
    ReplyFrame::Envelope(HostMessage::ClipboardInfo { data })
}

/// Accepts plain base64 or a `data:<mime>;base64,` URI.
fn decode_base64_image(content: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = content
        .split_once(',')
        .map(|(_, rest)| rest)
        .unwrap_or(content);
    BASE64.decode(payload)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
