use std::io::Read;

use crate::codec::{Codec, CodecError, CODEC_ZSTD};

/// Zstandard codec.
///
/// The high-ratio backend: at the default level (19) it is markedly slower
/// than [`Lz4Codec`](crate::Lz4Codec) to encode but produces the smallest
/// containers for delta-coded photographs. Decode speed is level-independent.
pub struct ZstdCodec {
    /// Compression level (1 = fast / larger, 22 = slow / smallest).
    pub level: i32,
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self { level: 19 }
    }
}

impl ZstdCodec {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Codec for ZstdCodec {
    fn id(&self) -> u16 {
        CODEC_ZSTD
    }

    fn name(&self) -> &'static str {
        "zstd"
    }

    fn compress(&self, raw: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(zstd::bulk::compress(raw, self.level)?)
    }

    fn decompress(&self, compressed: &[u8], limit: usize) -> Result<Vec<u8>, CodecError> {
        // The frame header carries a content size, but it is attacker
        // controlled; stream instead and stop one byte past the limit.
        let decoder =
            zstd::stream::read::Decoder::new(compressed).map_err(|e| CodecError::corrupt(self.name(), e))?;
        let mut raw = Vec::new();
        decoder
            .take((limit as u64).saturating_add(1))
            .read_to_end(&mut raw)
            .map_err(|e| CodecError::corrupt(self.name(), e))?;
        Ok(raw)
    }
}
