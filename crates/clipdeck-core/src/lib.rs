//! # clipdeck-core
//!
//! Shared library for Clipdeck containing the JSON wire protocol types, the
//! virtual clipboard slot domain model, and the per-connection delta-sync
//! engine.
//!
//! This crate is used by the host application and by anything that needs to
//! speak the protocol.  It has zero dependencies on OS APIs, UI frameworks,
//! or network sockets.
//!
//! # Architecture overview
//!
//! Clipdeck lets a companion device (phone or tablet) drive a host
//! machine's clipboard and media keys over the local network while the host
//! streams telemetry back.  The host multiplexes N virtual clipboard
//! "slots" onto the single shared OS clipboard, and keeps every connected
//! client consistent by pushing diffs of its state on a fixed interval.
//!
//! This crate is the shared foundation.  It defines:
//!
//! - **`protocol`** – What travels over the wire.  Every frame is a JSON
//!   object tagged by a `"type"` field; inbound commands and outbound state
//!   envelopes are separate closed enums, and an opaque [`FrameCodec`]
//!   hook lets the embedder layer symmetric encryption over the text of
//!   each frame.
//!
//! - **`domain`** – Pure business logic: the [`SlotStore`] holding the
//!   virtual clipboard slots and the deterministic label derivation rules.
//!
//! - **`sync`** – The delta-sync engine: a pure function that compares the
//!   current host state against a connection's last-observed snapshot and
//!   produces the minimal set of frames to transmit.

pub mod domain;
pub mod protocol;
pub mod sync;

// Re-export the most-used types at the crate root so callers can write
// `clipdeck_core::SlotStore` instead of `clipdeck_core::domain::slots::SlotStore`.
pub use domain::slots::{
    generate_label, SlotContent, SlotError, SlotKind, SlotStore, SlotSummary, LABEL_MAX_CHARS,
};
pub use protocol::codec::{CodecError, FrameCodec, PlainCodec};
pub use protocol::messages::{
    AckReply, ClientCommand, HostFacts, HostMessage, MediaInfo, MemoryFacts, NetworkUsage,
    ReplyFrame, ReplyStatus, SlotPayload, SystemMetrics, UploadKind, UploadPayload,
};
pub use sync::delta::{compute_delta, HostState, PushDelta, Snapshot};
