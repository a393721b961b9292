//! The virtual clipboard slot store.
//!
//! The host multiplexes N independent clipboard "slots" onto the single
//! shared OS clipboard.  This module owns the slot side of that design: a
//! fixed-size sequence of labeled entries, each holding text, a file list,
//! or image bytes.  It knows nothing about the OS clipboard itself; the
//! host's `ClipboardBridge` is responsible for moving content between a slot
//! and the real clipboard.
//!
//! # Labels
//!
//! Every slot carries a human-readable label shown in the companion UI.
//! Labels are derived deterministically from the content unless the caller
//! supplies an override:
//!
//! - **Text** – leading whitespace trimmed, newlines collapsed to spaces,
//!   carriage returns removed, commas replaced with a full-width comma
//!   (`，`) so labels stay parseable as flat comma-separated lists, then
//!   truncated to [`LABEL_MAX_CHARS`] code points.
//! - **File** – the base filenames (path separators stripped) joined with
//!   `", "`.
//! - **Image** – a `data:image/png;base64,…` URI re-encoded from the stored
//!   bytes.  The re-encode is for display only; the stored content keeps its
//!   original representation.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of a derived text label, in code points.
pub const LABEL_MAX_CHARS: usize = 120;

/// Error type for slot store operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotError {
    /// The requested index is outside `0..num_slots`.
    #[error("clipboard slot index {index} out of range (0..{len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// The kind of content a slot holds.
///
/// Serialized with lowercase tags (`"text"`, `"file"`, `"image"`) to match
/// the wire schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Text,
    File,
    Image,
}

/// The content of a single slot.
///
/// The kind is carried by the variant itself, so content representation and
/// kind can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotContent {
    /// Plain UTF-8 text.
    Text(String),
    /// Absolute file paths, one entry per file.
    Files(Vec<String>),
    /// Encoded image bytes in their original representation (PNG, BMP, …).
    Image(Vec<u8>),
}

impl SlotContent {
    /// Returns the [`SlotKind`] discriminant for this content.
    pub fn kind(&self) -> SlotKind {
        match self {
            SlotContent::Text(_) => SlotKind::Text,
            SlotContent::Files(_) => SlotKind::File,
            SlotContent::Image(_) => SlotKind::Image,
        }
    }
}

/// Wire-facing summary of one slot, as pushed in `clipboard_info` frames.
///
/// `data` is present only for text slots; binary and file payloads are
/// summarized by label alone and fetched in full via `clipboard_download`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSummary {
    pub label: String,
    #[serde(rename = "type")]
    pub kind: SlotKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// One labeled slot.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot {
    label: String,
    content: SlotContent,
}

/// Fixed-size store of virtual clipboard slots.
///
/// Created once at startup; slot indices are fixed for the process lifetime
/// and never reused.  All slots start as empty text with an empty label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotStore {
    slots: Vec<Slot>,
}

impl SlotStore {
    /// Creates a store with `num_slots` empty text slots.
    pub fn new(num_slots: usize) -> Self {
        let slots = (0..num_slots)
            .map(|_| Slot {
                label: String::new(),
                content: SlotContent::Text(String::new()),
            })
            .collect();
        Self { slots }
    }

    /// Number of slots in the store.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the store has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, index: usize) -> Result<&Slot, SlotError> {
        self.slots.get(index).ok_or(SlotError::IndexOutOfRange {
            index,
            len: self.slots.len(),
        })
    }

    /// Returns the content of the slot at `index`.
    pub fn get(&self, index: usize) -> Result<&SlotContent, SlotError> {
        Ok(&self.slot(index)?.content)
    }

    /// Returns the kind of the slot at `index`.
    pub fn kind(&self, index: usize) -> Result<SlotKind, SlotError> {
        Ok(self.slot(index)?.content.kind())
    }

    /// Returns the label of the slot at `index`.
    pub fn label(&self, index: usize) -> Result<&str, SlotError> {
        Ok(self.slot(index)?.label.as_str())
    }

    /// Stores `content` in the slot at `index`, overwriting the previous
    /// content irreversibly.
    ///
    /// When `label` is `None` the label is derived from the content via
    /// [`generate_label`].
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::IndexOutOfRange`] without any side effect when
    /// `index` is invalid.
    pub fn set(
        &mut self,
        index: usize,
        content: SlotContent,
        label: Option<String>,
    ) -> Result<(), SlotError> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(SlotError::IndexOutOfRange { index, len })?;
        slot.label = label.unwrap_or_else(|| generate_label(&content));
        slot.content = content;
        Ok(())
    }

    /// Exports a summary of every slot, keyed `clipboard_<i>`.
    ///
    /// Text slots include their full content in `data`; file and image slots
    /// carry only their label.
    pub fn export_all(&self) -> BTreeMap<String, SlotSummary> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                let data = match &slot.content {
                    SlotContent::Text(text) => Some(text.clone()),
                    _ => None,
                };
                (
                    format!("clipboard_{i}"),
                    SlotSummary {
                        label: slot.label.clone(),
                        kind: slot.content.kind(),
                        data,
                    },
                )
            })
            .collect()
    }
}

// ── Label derivation ──────────────────────────────────────────────────────────

/// Derives the display label for `content`.
///
/// Deterministic: identical content always yields an identical label.
pub fn generate_label(content: &SlotContent) -> String {
    match content {
        SlotContent::Text(text) => text_label(text),
        SlotContent::Files(paths) => paths
            .iter()
            .map(|path| base_name(path))
            .collect::<Vec<_>>()
            .join(", "),
        SlotContent::Image(bytes) => image_label(bytes),
    }
}

fn text_label(text: &str) -> String {
    text.trim_start()
        .replace('\n', " ")
        .replace('\r', "")
        .replace(',', "，")
        .chars()
        .take(LABEL_MAX_CHARS)
        .collect()
}

/// Returns the final path component, accepting both `/` and `\` separators
/// so labels look the same regardless of which platform produced the path.
fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Re-encodes the stored image bytes as a PNG data URI.
///
/// The stored content is left untouched; only the label is transcoded.
/// Bytes that do not decode as an image fall back to a plain `"Image"`
/// label instead of failing the whole `set`.
fn image_label(bytes: &[u8]) -> String {
    let Ok(decoded) = image::load_from_memory(bytes) else {
        return "Image".to_string();
    };
    let mut png = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut png);
    if decoded.write_to(&mut cursor, image::ImageFormat::Png).is_err() {
        return "Image".to_string();
    }
    format!("data:image/png;base64,{}", BASE64.encode(&png))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_png() -> Vec<u8> {
        // 1×1 opaque red pixel, encoded through the same codec the label
        // generator uses.
        let img = image::RgbaImage::from_raw(1, 1, vec![255, 0, 0, 255]).unwrap();
        let mut png = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        png
    }

    // ── Construction ──────────────────────────────────────────────────────────

    #[test]
    fn test_new_store_has_requested_slot_count() {
        let store = SlotStore::new(5);
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn test_new_store_slots_are_empty_text() {
        let store = SlotStore::new(3);
        for i in 0..3 {
            assert_eq!(store.get(i).unwrap(), &SlotContent::Text(String::new()));
            assert_eq!(store.kind(i).unwrap(), SlotKind::Text);
            assert_eq!(store.label(i).unwrap(), "");
        }
    }

    // ── set / get round trips ─────────────────────────────────────────────────

    #[test]
    fn test_set_then_get_returns_stored_content() {
        let mut store = SlotStore::new(3);
        store
            .set(1, SlotContent::Text("hello".to_string()), None)
            .unwrap();

        assert_eq!(store.get(1).unwrap(), &SlotContent::Text("hello".to_string()));
        assert_eq!(store.kind(1).unwrap(), SlotKind::Text);
    }

    #[test]
    fn test_set_overwrites_previous_content() {
        let mut store = SlotStore::new(1);
        store
            .set(0, SlotContent::Text("first".to_string()), None)
            .unwrap();
        store
            .set(0, SlotContent::Files(vec!["/tmp/a.txt".to_string()]), None)
            .unwrap();

        assert_eq!(store.kind(0).unwrap(), SlotKind::File);
        assert_eq!(store.label(0).unwrap(), "a.txt");
    }

    #[test]
    fn test_set_with_explicit_label_skips_derivation() {
        let mut store = SlotStore::new(1);
        store
            .set(
                0,
                SlotContent::Text("content".to_string()),
                Some("custom".to_string()),
            )
            .unwrap();
        assert_eq!(store.label(0).unwrap(), "custom");
    }

    // ── Out-of-range behavior ─────────────────────────────────────────────────

    #[test]
    fn test_get_out_of_range_returns_error() {
        let store = SlotStore::new(3);
        assert_eq!(
            store.get(3),
            Err(SlotError::IndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn test_set_out_of_range_has_no_side_effect() {
        let mut store = SlotStore::new(2);
        let before = store.clone();

        let result = store.set(2, SlotContent::Text("x".to_string()), None);

        assert!(matches!(result, Err(SlotError::IndexOutOfRange { .. })));
        assert_eq!(store, before, "a failed set must not modify any slot");
    }

    #[test]
    fn test_kind_and_label_out_of_range_return_error() {
        let store = SlotStore::new(1);
        assert!(store.kind(9).is_err());
        assert!(store.label(9).is_err());
    }

    // ── Label derivation ──────────────────────────────────────────────────────

    #[test]
    fn test_text_label_is_deterministic() {
        let content = SlotContent::Text("some text\nwith, stuff".to_string());
        assert_eq!(generate_label(&content), generate_label(&content));
    }

    #[test]
    fn test_text_label_collapses_newlines_and_trims_leading_whitespace() {
        let content = SlotContent::Text("  line one\r\nline two".to_string());
        assert_eq!(generate_label(&content), "line one line two");
    }

    #[test]
    fn test_text_label_replaces_commas_with_fullwidth_comma() {
        let content = SlotContent::Text("a,b,c".to_string());
        let label = generate_label(&content);
        assert_eq!(label, "a，b，c");
        assert!(!label.contains(','), "derived label must not contain a raw comma");
    }

    #[test]
    fn test_text_label_truncates_to_120_chars() {
        let content = SlotContent::Text("x".repeat(500));
        let label = generate_label(&content);
        assert_eq!(label.chars().count(), LABEL_MAX_CHARS);
    }

    #[test]
    fn test_text_label_counts_code_points_not_bytes() {
        // 200 three-byte characters; the cap applies to characters.
        let content = SlotContent::Text("あ".repeat(200));
        let label = generate_label(&content);
        assert_eq!(label.chars().count(), LABEL_MAX_CHARS);
    }

    #[test]
    fn test_file_label_joins_base_names() {
        let content = SlotContent::Files(vec![
            "C:\\Users\\me\\report.pdf".to_string(),
            "/home/me/notes.txt".to_string(),
        ]);
        assert_eq!(generate_label(&content), "report.pdf, notes.txt");
    }

    #[test]
    fn test_image_label_is_png_data_uri() {
        let content = SlotContent::Image(tiny_png());
        let label = generate_label(&content);
        assert!(label.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_image_label_falls_back_on_undecodable_bytes() {
        let content = SlotContent::Image(vec![0, 1, 2, 3]);
        assert_eq!(generate_label(&content), "Image");
    }

    // ── export_all ────────────────────────────────────────────────────────────

    #[test]
    fn test_export_all_includes_data_for_text_slots_only() {
        let mut store = SlotStore::new(3);
        store
            .set(1, SlotContent::Text("hello".to_string()), None)
            .unwrap();
        store
            .set(2, SlotContent::Files(vec!["/tmp/f.bin".to_string()]), None)
            .unwrap();

        let export = store.export_all();
        assert_eq!(export.len(), 3);

        let text_slot = &export["clipboard_1"];
        assert_eq!(text_slot.label, "hello");
        assert_eq!(text_slot.kind, SlotKind::Text);
        assert_eq!(text_slot.data.as_deref(), Some("hello"));

        let file_slot = &export["clipboard_2"];
        assert_eq!(file_slot.kind, SlotKind::File);
        assert_eq!(file_slot.data, None, "non-text slots must not leak data");
    }
}
