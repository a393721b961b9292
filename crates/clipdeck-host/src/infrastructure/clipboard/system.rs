//! Real OS clipboard backend built on `arboard`.
//!
//! `arboard` exposes the clipboard as text or a decoded RGBA image, so this
//! backend maps the abstract format universe onto those two surfaces:
//!
//! - [`ClipFormat::Text`] ↔ the platform text clipboard.
//! - [`ClipFormat::Png`] / [`ClipFormat::Bitmap`] ↔ the platform image
//!   clipboard, transcoded through the `image` crate on the way in and out.
//! - [`ClipFormat::FileList`] is unsupported here (no portable arboard
//!   equivalent exists) and reports [`ClipboardError::Unsupported`], which
//!   the bridge's backup loop tolerates.
//!
//! Enumeration lists at most one image format (PNG) so a backup does not
//! capture the same picture twice.

use std::borrow::Cow;
use std::sync::Mutex;

use super::{ClipFormat, ClipboardError, OsClipboard};

/// [`OsClipboard`] backed by the real system clipboard.
pub struct SystemClipboard {
    // arboard's Clipboard is Send but not Sync; the mutex provides Sync.
    inner: Mutex<arboard::Clipboard>,
}

impl SystemClipboard {
    /// Opens a handle to the system clipboard.
    ///
    /// # Errors
    ///
    /// Fails when no clipboard is reachable, e.g. on a headless session
    /// with no display server.
    pub fn new() -> Result<Self, ClipboardError> {
        let clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Access(e.to_string()))?;
        Ok(Self {
            inner: Mutex::new(clipboard),
        })
    }
}

impl OsClipboard for SystemClipboard {
    fn list_formats(&self) -> Result<Vec<ClipFormat>, ClipboardError> {
        let mut clipboard = self.inner.lock().expect("lock poisoned");
        let mut formats = Vec::new();
        if clipboard.get_image().is_ok() {
            formats.push(ClipFormat::Png);
        }
        if clipboard.get_text().is_ok() {
            formats.push(ClipFormat::Text);
        }
        Ok(formats)
    }

    fn read(&self, format: ClipFormat) -> Result<Vec<u8>, ClipboardError> {
        let mut clipboard = self.inner.lock().expect("lock poisoned");
        match format {
            ClipFormat::Text => clipboard
                .get_text()
                .map(String::into_bytes)
                .map_err(|e| ClipboardError::Access(e.to_string())),
            ClipFormat::Png => read_image_as(&mut clipboard, image::ImageFormat::Png),
            ClipFormat::Bitmap => read_image_as(&mut clipboard, image::ImageFormat::Bmp),
            ClipFormat::FileList => Err(ClipboardError::Unsupported(ClipFormat::FileList)),
        }
    }

    fn write(&self, format: ClipFormat, data: &[u8]) -> Result<(), ClipboardError> {
        let mut clipboard = self.inner.lock().expect("lock poisoned");
        match format {
            ClipFormat::Text => clipboard
                .set_text(String::from_utf8_lossy(data).into_owned())
                .map_err(|e| ClipboardError::Access(e.to_string())),
            ClipFormat::Png | ClipFormat::Bitmap => {
                let decoded = image::load_from_memory(data)
                    .map_err(|e| ClipboardError::Access(format!("image decode failed: {e}")))?;
                let rgba = decoded.to_rgba8();
                let (width, height) = (rgba.width() as usize, rgba.height() as usize);
                clipboard
                    .set_image(arboard::ImageData {
                        width,
                        height,
                        bytes: Cow::Owned(rgba.into_raw()),
                    })
                    .map_err(|e| ClipboardError::Access(e.to_string()))
            }
            ClipFormat::FileList => Err(ClipboardError::Unsupported(ClipFormat::FileList)),
        }
    }

    fn clear(&self) -> Result<(), ClipboardError> {
        let mut clipboard = self.inner.lock().expect("lock poisoned");
        clipboard
            .clear()
            .map_err(|e| ClipboardError::Access(e.to_string()))
    }
}

/// Reads the clipboard image and encodes it in `format`.
fn read_image_as(
    clipboard: &mut arboard::Clipboard,
    format: image::ImageFormat,
) -> Result<Vec<u8>, ClipboardError> {
    let data = clipboard
        .get_image()
        .map_err(|e| ClipboardError::Access(e.to_string()))?;
    let rgba = image::RgbaImage::from_raw(
        data.width as u32,
        data.height as u32,
        data.bytes.into_owned(),
    )
    .ok_or_else(|| ClipboardError::Access("clipboard image has invalid dimensions".to_string()))?;
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(rgba)
        .write_to(&mut std::io::Cursor::new(&mut out), format)
        .map_err(|e| ClipboardError::Access(format!("image encode failed: {e}")))?;
    Ok(out)
}
