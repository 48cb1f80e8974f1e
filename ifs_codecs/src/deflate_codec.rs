use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression as ZlibLevel;

use crate::codec::{Codec, CodecError, CODEC_DEFLATE};

/// zlib (Deflate) codec.
///
/// Sits between LZ4 and zstd on both speed and ratio, and is readable by
/// practically every platform's standard library.
pub struct DeflateCodec {
    /// zlib level, 0..=9.
    pub level: u32,
}

impl Default for DeflateCodec {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl Codec for DeflateCodec {
    fn id(&self) -> u16 {
        CODEC_DEFLATE
    }

    fn name(&self) -> &'static str {
        "deflate"
    }

    fn compress(&self, raw: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(raw.len() / 2), ZlibLevel::new(self.level));
        encoder.write_all(raw)?;
        Ok(encoder.finish()?)
    }

    fn decompress(&self, compressed: &[u8], limit: usize) -> Result<Vec<u8>, CodecError> {
        let mut raw = Vec::new();
        ZlibDecoder::new(compressed)
            .take((limit as u64).saturating_add(1))
            .read_to_end(&mut raw)
            .map_err(|e| CodecError::corrupt(self.name(), e))?;
        Ok(raw)
    }
}
