use thiserror::Error;

// ── Codec IDs ──────────────────────────────────────────────────────────────

pub const CODEC_PASSTHROUGH: u16 = 0;
pub const CODEC_ZSTD: u16 = 1;
pub const CODEC_LZ4: u16 = 2;
pub const CODEC_DEFLATE: u16 = 3;

/// Failures raised by a [`Codec`].
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("{codec} payload is not valid compressed data: {reason}")]
    Corrupt { codec: &'static str, reason: String },

    #[error("payload declares {declared} decompressed bytes, limit is {limit}")]
    LimitExceeded { limit: usize, declared: usize },

    #[error("unknown codec id {0}")]
    UnknownCodec(u16),

    #[error("unknown compression '{0}'; valid options: store, fast, balanced, high-ratio")]
    UnknownCompression(String),

    #[error("codec I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    pub(crate) fn corrupt(codec: &'static str, reason: impl ToString) -> Self {
        Self::Corrupt {
            codec,
            reason: reason.to_string(),
        }
    }
}

/// Lossless byte compression abstraction.
///
/// Each `Codec` implementation:
/// - Is identified by a stable numeric `id()` stored in the IFS header, so a
///   container always names the algorithm that produced its payload.
/// - Is stateless between calls: `decompress(compress(b))` must return `b` for
///   any input, including the empty slice.
pub trait Codec: Send + Sync {
    /// Stable codec ID stored in the IFS header.
    fn id(&self) -> u16;

    /// Human-readable codec name for CLI display.
    fn name(&self) -> &'static str;

    fn compress(&self, raw: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Decompress a payload produced by [`Codec::compress`].
    ///
    /// `limit` caps how much output the codec is willing to produce. Streaming
    /// codecs stop after `limit + 1` bytes and hand back what they have, so the
    /// caller sees an over-long result; codecs that know the decoded size up
    /// front fail with [`CodecError::LimitExceeded`] instead of allocating it.
    fn decompress(&self, compressed: &[u8], limit: usize) -> Result<Vec<u8>, CodecError>;
}
