//! Opaque frame codec applied to every wire frame.
//!
//! Transport encryption is negotiated out of band and supplied by the
//! embedder; this core treats it as a symmetric pass-through transform on
//! the JSON text of each frame.  Sessions call [`FrameCodec::encode`] on
//! every outbound frame and [`FrameCodec::decode`] on every inbound frame,
//! so swapping [`PlainCodec`] for a real cipher requires no session changes.

use thiserror::Error;

/// Error type for frame transformation.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("frame encode failed: {0}")]
    Encode(String),
    #[error("frame decode failed: {0}")]
    Decode(String),
}

/// Symmetric transform applied to the text of every frame.
pub trait FrameCodec: Send + Sync {
    /// Transforms an outbound plaintext frame into its wire form.
    fn encode(&self, frame: &str) -> Result<String, CodecError>;

    /// Transforms an inbound wire frame back into plaintext.
    fn decode(&self, frame: &str) -> Result<String, CodecError>;
}

/// Identity codec: frames travel as plain JSON text.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainCodec;

impl FrameCodec for PlainCodec {
    fn encode(&self, frame: &str) -> Result<String, CodecError> {
        Ok(frame.to_string())
    }

    fn decode(&self, frame: &str) -> Result<String, CodecError> {
        Ok(frame.to_string())
    }
}
