//! OS clipboard access and the backup/transfer/restore bridge.
//!
//! The real OS clipboard is a single shared resource that the user also
//! owns.  Everything in this module exists to let the virtual slot store
//! borrow it briefly, for one copy or paste, and hand it back bit-for-bit
//! unchanged, no matter how the transfer went.
//!
//! The clipboard itself sits behind the [`OsClipboard`] trait so the bridge
//! protocol is testable without a display server: [`SystemClipboard`] backs
//! it with `arboard`, and [`MemoryClipboard`] is an in-memory fake that
//! models the full format universe, including the file-list format that
//! `arboard` cannot reach.

pub mod bridge;
pub mod memory;
pub mod system;

pub use bridge::{ClipboardBridge, SettleDelays};
pub use memory::MemoryClipboard;
pub use system::SystemClipboard;

use clipdeck_core::SlotError;
use thiserror::Error;

use crate::infrastructure::providers::input::InputError;

/// Abstract clipboard formats the host understands.
///
/// This is the universe the bridge backs up and restores.  A backend is
/// free to support only a subset; unsupported formats surface as
/// [`ClipboardError::Unsupported`], which the backup loop tolerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipFormat {
    /// UTF-8 text.
    Text,
    /// PNG-encoded image bytes.
    Png,
    /// BMP-encoded image bytes (the lossless interchange format most
    /// clipboard consumers accept).
    Bitmap,
    /// UTF-8 file paths separated by `\n`.
    FileList,
}

/// All formats a backend may be asked to enumerate, in the order the
/// bridge probes them during classification.
pub const ALL_FORMATS: [ClipFormat; 4] = [
    ClipFormat::FileList,
    ClipFormat::Png,
    ClipFormat::Bitmap,
    ClipFormat::Text,
];

/// Error type for clipboard operations.
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// The requested slot index is invalid; raised before the OS clipboard
    /// is touched.
    #[error(transparent)]
    Slot(#[from] SlotError),

    /// The OS clipboard could not be opened, read, or written.
    #[error("clipboard access failure: {0}")]
    Access(String),

    /// The backend has no representation for this format.
    #[error("clipboard format {0:?} not supported by this backend")]
    Unsupported(ClipFormat),

    /// The simulated copy/paste keystroke could not be replayed.
    #[error(transparent)]
    Input(#[from] InputError),
}

/// Raw payloads captured from the OS clipboard before a transfer, in
/// enumeration order.  Scoped to a single backup/transfer/restore window.
pub type ClipboardBackup = Vec<(ClipFormat, Vec<u8>)>;

/// Minimal surface of the OS clipboard the bridge needs.
///
/// All methods are synchronous; real clipboard calls are short and the
/// bridge serializes them behind its global transfer lock anyway.
pub trait OsClipboard: Send + Sync {
    /// Enumerates the formats currently present on the clipboard.
    fn list_formats(&self) -> Result<Vec<ClipFormat>, ClipboardError>;

    /// Reads the raw payload for one format.
    fn read(&self, format: ClipFormat) -> Result<Vec<u8>, ClipboardError>;

    /// Writes the raw payload for one format, leaving other formats alone.
    fn write(&self, format: ClipFormat, data: &[u8]) -> Result<(), ClipboardError>;

    /// Clears every format from the clipboard.
    fn clear(&self) -> Result<(), ClipboardError>;
}
