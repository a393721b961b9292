//! The system clipboard bridge: backup → transfer → restore.
//!
//! Every transfer between a virtual slot and the OS clipboard follows the
//! same three-step protocol:
//!
//! 1. **Backup** – enumerate every format currently on the clipboard and
//!    capture its raw payload.  Individual formats that fail to read are
//!    skipped; a failed enumeration degrades to an empty backup.  Backup is
//!    never fatal.
//! 2. **Transfer** – exactly one of:
//!    - *copy*: replay the native copy shortcut, wait for the clipboard to
//!      settle, classify what landed (file list > image > text) and store
//!      it in the target slot;
//!    - *paste*: write the slot's content to the clipboard in its native
//!      format(s), then replay the native paste shortcut.
//! 3. **Restore** – clear the clipboard and re-set every backed-up format.
//!    Implemented as an RAII guard ([`RestoreGuard`]) so restore runs on
//!    every exit path: success, error, panic, or cancellation of the
//!    calling task (dropping the future drops the guard).
//!
//! The OS clipboard is one global resource, and the backup/restore windows
//! of two transfers must never interleave; a process-wide async mutex
//! serializes every transfer, across all sessions.

use std::sync::Arc;
use std::time::Duration;

use clipdeck_core::{SlotContent, SlotError, SlotStore};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::infrastructure::providers::input::InputExecutor;

use super::{ClipFormat, ClipboardBackup, ClipboardError, OsClipboard};

/// Bounded delays waited after a simulated keystroke so the clipboard (or
/// the receiving application) can settle before the next step.
#[derive(Debug, Clone, Copy)]
pub struct SettleDelays {
    /// After the copy shortcut, before reading the clipboard.
    pub copy: Duration,
    /// Around the paste shortcut for text and image content.
    pub paste: Duration,
    /// Around the paste shortcut for file lists, which shells handle more
    /// slowly than text.
    pub paste_file: Duration,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            copy: Duration::from_millis(200),
            paste: Duration::from_millis(100),
            paste_file: Duration::from_millis(200),
        }
    }
}

/// Mediates every transfer between a [`SlotStore`] slot and the OS
/// clipboard, guaranteeing the clipboard's pre-existing content survives
/// the operation.
pub struct ClipboardBridge {
    os: Arc<dyn OsClipboard>,
    input: Arc<dyn InputExecutor>,
    /// Global transfer lock; see the module docs.
    transfer_lock: Mutex<()>,
    delays: SettleDelays,
}

impl ClipboardBridge {
    /// Creates a bridge with the default settle delays.
    pub fn new(os: Arc<dyn OsClipboard>, input: Arc<dyn InputExecutor>) -> Self {
        Self::with_delays(os, input, SettleDelays::default())
    }

    /// Creates a bridge with custom settle delays (tests use zero delays).
    pub fn with_delays(
        os: Arc<dyn OsClipboard>,
        input: Arc<dyn InputExecutor>,
        delays: SettleDelays,
    ) -> Self {
        Self {
            os,
            input,
            transfer_lock: Mutex::new(()),
            delays,
        }
    }

    /// Copies the current OS clipboard content into slot `index`.
    ///
    /// Replays the native copy shortcut first so whatever the user has
    /// selected in the foreground application becomes the clipboard
    /// content, then classifies and stores it.
    ///
    /// # Errors
    ///
    /// [`ClipboardError::Slot`] when `index` is invalid, raised before the
    /// OS clipboard is touched.  [`ClipboardError::Input`] when the copy
    /// keystroke cannot be replayed.  The original clipboard content is
    /// restored in every case.
    pub async fn copy_into(
        &self,
        slots: &Mutex<SlotStore>,
        index: usize,
    ) -> Result<(), ClipboardError> {
        self.check_index(slots, index).await?;

        let _transfer = self.transfer_lock.lock().await;
        let _restore = RestoreGuard::capture(self.os.as_ref());

        self.input.execute("ctrl+c")?;
        tokio::time::sleep(self.delays.copy).await;

        let (content, label) = self.classify_current();
        debug!("copied {:?} content into slot {index}", content.kind());

        let mut store = slots.lock().await;
        store.set(index, content, label)?;
        Ok(())
    }

    /// Writes slot `index` to the OS clipboard and replays the native paste
    /// shortcut.
    ///
    /// Text goes out as a plain string, file lists in the file-list format,
    /// and images as both a lossless bitmap and a PNG so that the widest
    /// range of consumers can accept the paste.
    ///
    /// # Errors
    ///
    /// Same contract as [`copy_into`](Self::copy_into); the original
    /// clipboard content is restored on every path.
    pub async fn paste_from(
        &self,
        slots: &Mutex<SlotStore>,
        index: usize,
    ) -> Result<(), ClipboardError> {
        let content = { slots.lock().await.get(index)?.clone() };

        let _transfer = self.transfer_lock.lock().await;
        let _restore = RestoreGuard::capture(self.os.as_ref());

        let settle = match &content {
            SlotContent::Files(_) => self.delays.paste_file,
            _ => self.delays.paste,
        };

        match &content {
            SlotContent::Text(text) => {
                self.os.write(ClipFormat::Text, text.as_bytes())?;
            }
            SlotContent::Files(paths) => {
                self.os
                    .write(ClipFormat::FileList, paths.join("\n").as_bytes())?;
            }
            SlotContent::Image(bytes) => {
                self.write_image(bytes)?;
            }
        }

        tokio::time::sleep(settle).await;
        self.input.execute("ctrl+v")?;
        tokio::time::sleep(settle).await;

        debug!("pasted slot {index} ({:?})", content.kind());
        Ok(())
    }

    async fn check_index(
        &self,
        slots: &Mutex<SlotStore>,
        index: usize,
    ) -> Result<(), ClipboardError> {
        let len = slots.lock().await.len();
        if index >= len {
            return Err(SlotError::IndexOutOfRange { index, len }.into());
        }
        Ok(())
    }

    /// Reads the clipboard and classifies its content: file list, else
    /// image, else text.  Returns the slot content and an optional label
    /// override (file lists label themselves with quoted base names; other
    /// kinds use the derived label).
    fn classify_current(&self) -> (SlotContent, Option<String>) {
        if let Ok(bytes) = self.os.read(ClipFormat::FileList) {
            let paths: Vec<String> = String::from_utf8_lossy(&bytes)
                .lines()
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();
            if !paths.is_empty() {
                let label = quoted_file_label(&paths);
                return (SlotContent::Files(paths), Some(label));
            }
        }

        for format in [ClipFormat::Png, ClipFormat::Bitmap] {
            if let Ok(bytes) = self.os.read(format) {
                return (SlotContent::Image(bytes), None);
            }
        }

        let text = match self.os.read(ClipFormat::Text) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => String::new(),
        };
        (SlotContent::Text(text), None)
    }

    /// Writes image bytes as bitmap + PNG.  The bitmap write is
    /// best-effort; the PNG write is required.
    fn write_image(&self, bytes: &[u8]) -> Result<(), ClipboardError> {
        match transcode(bytes, image::ImageFormat::Bmp) {
            Ok(bmp) => {
                if let Err(e) = self.os.write(ClipFormat::Bitmap, &bmp) {
                    warn!("bitmap clipboard write failed, continuing with PNG only: {e}");
                }
            }
            Err(e) => warn!("bitmap transcode failed, continuing with PNG only: {e}"),
        }

        let png = match transcode(bytes, image::ImageFormat::Png) {
            Ok(png) => png,
            // Bytes that no longer decode still go out unmodified; the
            // consumer may understand the original encoding.
            Err(e) => {
                warn!("PNG transcode failed, writing stored bytes as-is: {e}");
                bytes.to_vec()
            }
        };
        self.os.write(ClipFormat::Png, &png)
    }
}

/// Scoped clipboard backup.  Captures on construction, restores on drop.
struct RestoreGuard<'a> {
    os: &'a dyn OsClipboard,
    backup: ClipboardBackup,
}

impl<'a> RestoreGuard<'a> {
    /// Best-effort capture of every format currently on the clipboard.
    fn capture(os: &'a dyn OsClipboard) -> Self {
        let backup = match os.list_formats() {
            Ok(formats) => formats
                .into_iter()
                .filter_map(|format| match os.read(format) {
                    Ok(data) => Some((format, data)),
                    Err(e) => {
                        debug!("skipping clipboard format {format:?} during backup: {e}");
                        None
                    }
                })
                .collect(),
            Err(e) => {
                warn!("clipboard enumeration failed, continuing with empty backup: {e}");
                Vec::new()
            }
        };
        Self { os, backup }
    }
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.os.clear() {
            warn!("clipboard clear before restore failed: {e}");
        }
        for (format, data) in &self.backup {
            if let Err(e) = self.os.write(*format, data) {
                warn!("failed to restore clipboard format {format:?}: {e}");
            }
        }
    }
}

/// `"a.txt", "b.png"`: the label shape for file content captured off the
/// OS clipboard.
fn quoted_file_label(paths: &[String]) -> String {
    paths
        .iter()
        .map(|path| {
            let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
            format!("\"{name}\"")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Decodes image bytes and re-encodes them in `format`.
fn transcode(bytes: &[u8], format: image::ImageFormat) -> Result<Vec<u8>, ClipboardError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| ClipboardError::Access(format!("image decode failed: {e}")))?;
    let mut out = Vec::new();
    decoded
        .write_to(&mut std::io::Cursor::new(&mut out), format)
        .map_err(|e| ClipboardError::Access(format!("image encode failed: {e}")))?;
    Ok(out)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
