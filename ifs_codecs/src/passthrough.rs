use crate::codec::{Codec, CodecError, CODEC_PASSTHROUGH};

/// No-op codec: stores the delta stream verbatim.
///
/// Useful for:
/// - Verifying the container round-trip independently of any compressor.
/// - Inspecting delta-coded samples directly in a hex dump.
pub struct PassThroughCodec;

impl Codec for PassThroughCodec {
    fn id(&self) -> u16 {
        CODEC_PASSTHROUGH
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn compress(&self, raw: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(raw.to_vec())
    }

    fn decompress(&self, compressed: &[u8], limit: usize) -> Result<Vec<u8>, CodecError> {
        let keep = compressed.len().min(limit.saturating_add(1));
        Ok(compressed[..keep].to_vec())
    }
}
