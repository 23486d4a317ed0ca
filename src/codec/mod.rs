//! Frame decompression.
//!
//! Every frame payload on disk is a raw LZ4 block (no size prefix, no frame
//! format).  The decompressed size is not stored per frame; it is always the
//! header's bytes-per-frame, so the decoder decompresses straight into a
//! caller-owned buffer of exactly that length.

use crate::error::CodecError;

// ── Codec trait ──────────────────────────────────────────────────────────────

/// A pure `compressed bytes + expected size → bytes | failure` primitive.
pub trait FrameDecompressor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Decompress `src` into `dst`.  Succeeds only if exactly `dst.len()`
    /// bytes were produced.  `dst` contents are unspecified on failure.
    fn decompress_into(&self, src: &[u8], dst: &mut [u8]) -> Result<(), CodecError>;
}

// ── Built-in implementations ─────────────────────────────────────────────────

pub struct Lz4BlockDecompressor;

impl FrameDecompressor for Lz4BlockDecompressor {
    fn name(&self) -> &'static str { "lz4-block" }

    fn decompress_into(&self, src: &[u8], dst: &mut [u8]) -> Result<(), CodecError> {
        let written = lz4_flex::block::decompress_into(src, dst)
            .map_err(|e| CodecError::Decompression(e.to_string()))?;
        if written != dst.len() {
            return Err(CodecError::SizeMismatch { expected: dst.len(), actual: written });
        }
        Ok(())
    }
}

/// Decompressor for files of the current format version.
pub fn default_decompressor() -> Box<dyn FrameDecompressor> {
    Box::new(Lz4BlockDecompressor)
}
