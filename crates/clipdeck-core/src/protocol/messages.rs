//! All Clipdeck wire message types.
//!
//! Every frame on the wire is a JSON object with a `"type"` field that
//! identifies the variant; remaining fields are flattened into the same
//! object.  Serde's `#[serde(tag = "type")]` attribute handles this
//! automatically:
//!
//! ```json
//! {"type":"clipboard_copy","id":3}
//! {"type":"system_info","data":{"cpu_usage":12.5,...},"info":{...}}
//! ```
//!
//! # Why separate inbound and outbound message types?
//!
//! The two directions carry different information:
//!
//! - The companion *sends* commands ([`ClientCommand`]): input replay,
//!   clipboard operations.
//! - The host *sends* state envelopes ([`HostMessage`]): metrics, media
//!   info, clipboard summaries, plus per-command acknowledgements
//!   ([`AckReply`]).
//!
//! Using distinct enums makes it a compile-time error to send a host-only
//! envelope as a command, and keeps command dispatch an exhaustive `match`
//! instead of string-tag lookups in untyped JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::slots::{SlotContent, SlotSummary};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

// ── Companion → Host commands ─────────────────────────────────────────────────

/// All commands a companion client can send to the host.
///
/// Slot indices arrive in the `id` field.  A frame whose `type` is not one
/// of these variants is not an error at the session level; it is echoed
/// back inside an [`AckReply`], which lets simple liveness pings succeed
/// without widening this enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Replay a named input command on the host (allow-listed; see the
    /// host's dispatch layer).
    Input { command: String },

    /// Read the current OS clipboard into slot `id` via the host's native
    /// copy shortcut.
    ClipboardCopy { id: usize },

    /// Write slot `id` into the OS clipboard and trigger the native paste
    /// shortcut.
    ClipboardPaste { id: usize },

    /// Store content supplied directly by the client into slot `id`,
    /// without any OS clipboard round trip.
    ClipboardUpload { id: usize, data: UploadPayload },

    /// Fetch the raw content of slot `id`: the only path that transmits
    /// non-text payloads in full.
    ClipboardDownload { id: usize },
}

/// Body of a [`ClientCommand::ClipboardUpload`].
///
/// `content` is the literal text for `"text"` uploads, or base64 image
/// bytes (with or without a `data:<mime>;base64,` prefix) for `"image"`
/// uploads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPayload {
    #[serde(rename = "type")]
    pub kind: UploadKind,
    pub content: String,
}

/// Content kinds a client may upload directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Text,
    Image,
}

// ── Host → Companion envelopes ────────────────────────────────────────────────

/// State envelopes pushed by the host, either periodically (diffed) or as
/// the reply to a clipboard command (full snapshot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    /// Live resource metrics plus static hardware descriptors.
    SystemInfo {
        data: SystemMetrics,
        info: HostFacts,
    },

    /// Currently playing media, or `null` when no media session is active.
    AudioInfo { data: Option<MediaInfo> },

    /// Slot summaries keyed `clipboard_<i>`.  Periodic pushes include only
    /// the slots that changed since the session's last push; command
    /// replies include every slot.
    ClipboardInfo {
        data: BTreeMap<String, SlotSummary>,
    },

    /// Raw content of exactly one slot, answering `clipboard_download`.
    ClipboardDownload { data: SlotPayload },
}

/// Resource usage sample, all percentages in `0.0..=100.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub disk_usage: f64,
    pub network_usage: NetworkUsage,
}

/// Cumulative network byte counters since boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkUsage {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}

/// Static hardware descriptors, sampled once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostFacts {
    pub cpu_name: String,
    pub cpu_cores: usize,
    pub cpu_threads: usize,
    pub memory_info: MemoryFacts,
}

/// Static memory description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryFacts {
    pub total_gb: u64,
}

/// Currently playing media track.
///
/// `album_thumbnail` is a base64-encoded image, produced and cached by the
/// media provider; it is compared like any other field when diffing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub artist: String,
    pub title: String,
    pub album_title: String,
    pub album_artist: String,
    pub track_number: u32,
    pub album_thumbnail: Option<String>,
}

/// Raw slot content for a `clipboard_download` reply.
///
/// Text slots send the string itself, image slots send standard base64 of
/// the stored bytes (also a string on the wire), and file slots send the
/// path list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotPayload {
    /// Text content, or base64-encoded image bytes.
    Text(String),
    /// File paths.
    Files(Vec<String>),
}

impl SlotPayload {
    /// Builds the wire payload for a slot's content.
    pub fn from_content(content: &SlotContent) -> Self {
        match content {
            SlotContent::Text(text) => SlotPayload::Text(text.clone()),
            SlotContent::Files(paths) => SlotPayload::Files(paths.clone()),
            SlotContent::Image(bytes) => SlotPayload::Text(BASE64.encode(bytes)),
        }
    }
}

// ── Command acknowledgements ──────────────────────────────────────────────────

/// Outcome of a reply, `"success"` or `"error"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Success,
    Error,
}

/// Acknowledgement frame: `{"response": ..., "status": "success"|"error"}`.
///
/// `response` is a string for input acks and rejections, or the client's
/// original frame for the unrecognized-command echo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AckReply {
    pub response: serde_json::Value,
    pub status: ReplyStatus,
}

impl AckReply {
    /// Successful acknowledgement with a message string.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            response: serde_json::Value::String(message.into()),
            status: ReplyStatus::Success,
        }
    }

    /// Error acknowledgement with a message string.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            response: serde_json::Value::String(message.into()),
            status: ReplyStatus::Error,
        }
    }

    /// Echoes an unrecognized frame back to the client.
    pub fn echo(original: serde_json::Value) -> Self {
        Self {
            response: original,
            status: ReplyStatus::Success,
        }
    }
}

/// Everything the host may send in direct response to one inbound frame.
///
/// Serialized untagged: an [`AckReply`] keeps its `response`/`status`
/// shape, a [`HostMessage`] keeps its `type` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyFrame {
    Envelope(HostMessage),
    Ack(AckReply),
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::slots::{SlotKind, SlotSummary};

    // ── ClientCommand deserialization ─────────────────────────────────────────

    #[test]
    fn test_input_command_deserializes_from_json() {
        let json = r#"{"type":"input","command":"play_pause"}"#;
        let cmd: ClientCommand = serde_json::from_str(json).unwrap();
        assert_eq!(
            cmd,
            ClientCommand::Input {
                command: "play_pause".to_string()
            }
        );
    }

    #[test]
    fn test_clipboard_copy_command_deserializes_with_id() {
        let json = r#"{"type":"clipboard_copy","id":4}"#;
        let cmd: ClientCommand = serde_json::from_str(json).unwrap();
        assert_eq!(cmd, ClientCommand::ClipboardCopy { id: 4 });
    }

    #[test]
    fn test_clipboard_upload_command_round_trips() {
        let original = ClientCommand::ClipboardUpload {
            id: 2,
            data: UploadPayload {
                kind: UploadKind::Text,
                content: "pasted from phone".to_string(),
            },
        };
        let json = serde_json::to_string(&original).unwrap();
        assert!(json.contains(r#""type":"clipboard_upload""#));
        assert!(json.contains(r#""type":"text""#));
        let decoded: ClientCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_unknown_command_type_returns_error() {
        let json = r#"{"type":"shutdown_host"}"#;
        let result: Result<ClientCommand, _> = serde_json::from_str(json);
        assert!(result.is_err(), "unknown type must not decode as a command");
    }

    #[test]
    fn test_command_missing_id_returns_error() {
        let json = r#"{"type":"clipboard_paste"}"#;
        let result: Result<ClientCommand, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    // ── HostMessage serialization ─────────────────────────────────────────────

    fn sample_metrics() -> SystemMetrics {
        SystemMetrics {
            cpu_usage: 12.5,
            memory_usage: 48.0,
            disk_usage: 73.2,
            network_usage: NetworkUsage {
                bytes_sent: 1024,
                bytes_recv: 4096,
            },
        }
    }

    fn sample_facts() -> HostFacts {
        HostFacts {
            cpu_name: "Example CPU".to_string(),
            cpu_cores: 8,
            cpu_threads: 16,
            memory_info: MemoryFacts { total_gb: 32 },
        }
    }

    #[test]
    fn test_system_info_serializes_with_data_and_info_sections() {
        let msg = HostMessage::SystemInfo {
            data: sample_metrics(),
            info: sample_facts(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"system_info""#));
        assert!(json.contains(r#""cpu_usage":12.5"#));
        assert!(json.contains(r#""bytes_recv":4096"#));
        assert!(json.contains(r#""cpu_threads":16"#));
    }

    #[test]
    fn test_audio_info_with_no_session_serializes_null_data() {
        let msg = HostMessage::AudioInfo { data: None };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"audio_info","data":null}"#);
    }

    #[test]
    fn test_clipboard_info_serializes_slot_map() {
        let mut data = BTreeMap::new();
        data.insert(
            "clipboard_1".to_string(),
            SlotSummary {
                label: "hello".to_string(),
                kind: SlotKind::Text,
                data: Some("hello".to_string()),
            },
        );
        let msg = HostMessage::ClipboardInfo { data };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(
            json,
            r#"{"type":"clipboard_info","data":{"clipboard_1":{"label":"hello","type":"text","data":"hello"}}}"#
        );
    }

    #[test]
    fn test_slot_summary_omits_absent_data_field() {
        let summary = SlotSummary {
            label: "report.pdf".to_string(),
            kind: SlotKind::File,
            data: None,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("data"), "absent data must be omitted, not null");
    }

    #[test]
    fn test_host_message_round_trips() {
        let original = HostMessage::SystemInfo {
            data: sample_metrics(),
            info: sample_facts(),
        };
        let json = serde_json::to_string(&original).unwrap();
        let decoded: HostMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(original, decoded);
    }

    // ── SlotPayload ───────────────────────────────────────────────────────────

    #[test]
    fn test_slot_payload_text_serializes_as_plain_string() {
        let payload = SlotPayload::from_content(&SlotContent::Text("abc".to_string()));
        assert_eq!(serde_json::to_string(&payload).unwrap(), r#""abc""#);
    }

    #[test]
    fn test_slot_payload_files_serializes_as_list() {
        let payload =
            SlotPayload::from_content(&SlotContent::Files(vec!["/tmp/a".to_string()]));
        assert_eq!(serde_json::to_string(&payload).unwrap(), r#"["/tmp/a"]"#);
    }

    #[test]
    fn test_slot_payload_image_serializes_as_base64_string() {
        let payload = SlotPayload::from_content(&SlotContent::Image(vec![1, 2, 3]));
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, format!("\"{}\"", BASE64.encode([1u8, 2, 3])));
    }

    // ── AckReply / ReplyFrame ─────────────────────────────────────────────────

    #[test]
    fn test_ack_reply_error_has_exact_wire_shape() {
        let reply = AckReply::error("Input command (shutdown) not allowed.");
        let json = serde_json::to_string(&reply).unwrap();
        assert_eq!(
            json,
            r#"{"response":"Input command (shutdown) not allowed.","status":"error"}"#
        );
    }

    #[test]
    fn test_ack_reply_echo_preserves_original_frame() {
        let original = serde_json::json!({"type": "ping", "nonce": 7});
        let reply = AckReply::echo(original.clone());
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["response"], original);
        assert_eq!(json["status"], "success");
    }

    #[test]
    fn test_reply_frame_envelope_serializes_as_host_message() {
        let frame = ReplyFrame::Envelope(HostMessage::AudioInfo { data: None });
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(json, r#"{"type":"audio_info","data":null}"#);
    }

    #[test]
    fn test_reply_frame_ack_serializes_without_type_tag() {
        let frame = ReplyFrame::Ack(AckReply::success("ok"));
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(json, r#"{"response":"ok","status":"success"}"#);
    }
}
