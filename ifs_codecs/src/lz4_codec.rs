use lz4_flex::block::{compress_prepend_size, decompress};

use crate::codec::{Codec, CodecError, CODEC_LZ4};

/// LZ4 block codec.
///
/// Fastest of the bundled codecs in both directions, at the cost of ratio.
/// The block is prefixed with its uncompressed length (u32 LE), which lets
/// [`Codec::decompress`] refuse oversized payloads before allocating.
///
/// Best for: large images where encode/decode latency matters more than size.
pub struct Lz4Codec;

const SIZE_PREFIX: usize = 4;

impl Codec for Lz4Codec {
    fn id(&self) -> u16 {
        CODEC_LZ4
    }

    fn name(&self) -> &'static str {
        "lz4"
    }

    fn compress(&self, raw: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(compress_prepend_size(raw))
    }

    fn decompress(&self, compressed: &[u8], limit: usize) -> Result<Vec<u8>, CodecError> {
        if compressed.len() < SIZE_PREFIX {
            return Err(CodecError::corrupt(
                self.name(),
                format!("{} bytes is too short for the size prefix", compressed.len()),
            ));
        }
        let (prefix, block) = compressed.split_at(SIZE_PREFIX);
        let declared = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        if declared > limit {
            return Err(CodecError::LimitExceeded { limit, declared });
        }
        if declared == 0 {
            return Ok(Vec::new());
        }
        decompress(block, declared).map_err(|e| CodecError::corrupt(self.name(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_size_above_limit_is_rejected() {
        let packed = Lz4Codec.compress(&[7u8; 1000]).unwrap();
        let err = Lz4Codec.decompress(&packed, 999).unwrap_err();
        assert!(matches!(
            err,
            CodecError::LimitExceeded {
                limit: 999,
                declared: 1000
            }
        ));
    }

    #[test]
    fn short_input_is_corrupt() {
        let err = Lz4Codec.decompress(&[1, 2], usize::MAX).unwrap_err();
        assert!(matches!(err, CodecError::Corrupt { codec: "lz4", .. }));
    }
}
