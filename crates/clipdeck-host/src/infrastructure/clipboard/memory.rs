//! In-memory clipboard fake for unit testing.
//!
//! Models the full abstract format universe, including the file-list
//! format the `arboard` backend cannot reach, so the bridge's backup,
//! classification, and restore logic can be exercised without a display
//! server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{ClipFormat, ClipboardError, OsClipboard, ALL_FORMATS};

/// A mock [`OsClipboard`] holding format payloads in a map.
#[derive(Default)]
pub struct MemoryClipboard {
    formats: Mutex<HashMap<ClipFormat, Vec<u8>>>,
    fail_enumeration: AtomicBool,
    write_log: Mutex<Vec<ClipFormat>>,
}

impl MemoryClipboard {
    /// Creates an empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, `list_formats` fails, simulating a clipboard that cannot
    /// be enumerated.  Reads and writes keep working.
    pub fn set_fail_enumeration(&self, fail: bool) {
        self.fail_enumeration.store(fail, Ordering::Relaxed);
    }

    /// Every format written since construction, in order.
    pub fn write_log(&self) -> Vec<ClipFormat> {
        self.write_log.lock().expect("lock poisoned").clone()
    }
}

impl OsClipboard for MemoryClipboard {
    fn list_formats(&self) -> Result<Vec<ClipFormat>, ClipboardError> {
        if self.fail_enumeration.load(Ordering::Relaxed) {
            return Err(ClipboardError::Access(
                "enumeration failed (injected)".to_string(),
            ));
        }
        let formats = self.formats.lock().expect("lock poisoned");
        Ok(ALL_FORMATS
            .into_iter()
            .filter(|format| formats.contains_key(format))
            .collect())
    }

    fn read(&self, format: ClipFormat) -> Result<Vec<u8>, ClipboardError> {
        self.formats
            .lock()
            .expect("lock poisoned")
            .get(&format)
            .cloned()
            .ok_or_else(|| ClipboardError::Access(format!("format {format:?} not present")))
    }

    fn write(&self, format: ClipFormat, data: &[u8]) -> Result<(), ClipboardError> {
        self.formats
            .lock()
            .expect("lock poisoned")
            .insert(format, data.to_vec());
        self.write_log.lock().expect("lock poisoned").push(format);
        Ok(())
    }

    fn clear(&self) -> Result<(), ClipboardError> {
        self.formats.lock().expect("lock poisoned").clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read_round_trips() {
        let clipboard = MemoryClipboard::new();
        clipboard.write(ClipFormat::Text, b"hello").unwrap();
        assert_eq!(clipboard.read(ClipFormat::Text).unwrap(), b"hello");
    }

    #[test]
    fn test_read_of_absent_format_fails() {
        let clipboard = MemoryClipboard::new();
        assert!(clipboard.read(ClipFormat::Png).is_err());
    }

    #[test]
    fn test_list_formats_reports_present_formats_only() {
        let clipboard = MemoryClipboard::new();
        clipboard.write(ClipFormat::Text, b"t").unwrap();
        clipboard.write(ClipFormat::Png, b"p").unwrap();
        let formats = clipboard.list_formats().unwrap();
        assert_eq!(formats, vec![ClipFormat::Png, ClipFormat::Text]);
    }

    #[test]
    fn test_clear_removes_everything() {
        let clipboard = MemoryClipboard::new();
        clipboard.write(ClipFormat::Text, b"t").unwrap();
        clipboard.clear().unwrap();
        assert!(clipboard.list_formats().unwrap().is_empty());
    }

    #[test]
    fn test_injected_enumeration_failure() {
        let clipboard = MemoryClipboard::new();
        clipboard.set_fail_enumeration(true);
        assert!(clipboard.list_formats().is_err());
        // Reads are unaffected.
        clipboard.write(ClipFormat::Text, b"t").unwrap();
        assert!(clipboard.read(ClipFormat::Text).is_ok());
    }
}
