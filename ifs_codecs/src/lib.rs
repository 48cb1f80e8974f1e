pub mod codec;
mod deflate_codec;
mod lz4_codec;
mod passthrough;
mod zstd_codec;

pub use codec::{Codec, CodecError};
pub use deflate_codec::DeflateCodec;
pub use lz4_codec::Lz4Codec;
pub use passthrough::PassThroughCodec;
pub use zstd_codec::ZstdCodec;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use codec::{CODEC_DEFLATE, CODEC_LZ4, CODEC_PASSTHROUGH, CODEC_ZSTD};

/// Compression backend selected when encoding a container.
///
/// The variant's [`id`](Compression::id) is written into the container header,
/// so decoding never has to guess which algorithm produced a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Compression {
    /// No compression.
    Store,
    /// LZ4: fastest encode and decode.
    #[default]
    Fast,
    /// zlib level 6.
    Balanced,
    /// zstd level 19: smallest output.
    HighRatio,
}

impl Compression {
    pub const ALL: [Compression; 4] = [
        Compression::Store,
        Compression::Fast,
        Compression::Balanced,
        Compression::HighRatio,
    ];

    pub fn id(self) -> u16 {
        match self {
            Compression::Store => CODEC_PASSTHROUGH,
            Compression::HighRatio => CODEC_ZSTD,
            Compression::Fast => CODEC_LZ4,
            Compression::Balanced => CODEC_DEFLATE,
        }
    }

    pub fn from_id(id: u16) -> Result<Self, CodecError> {
        match id {
            CODEC_PASSTHROUGH => Ok(Compression::Store),
            CODEC_ZSTD => Ok(Compression::HighRatio),
            CODEC_LZ4 => Ok(Compression::Fast),
            CODEC_DEFLATE => Ok(Compression::Balanced),
            other => Err(CodecError::UnknownCodec(other)),
        }
    }

    /// Instantiate the codec backing this option.
    pub fn codec(self) -> Box<dyn Codec> {
        match self {
            Compression::Store => Box::new(PassThroughCodec),
            Compression::Fast => Box::new(Lz4Codec),
            Compression::Balanced => Box::new(DeflateCodec::default()),
            Compression::HighRatio => Box::new(ZstdCodec::default()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Compression::Store => "store",
            Compression::Fast => "fast",
            Compression::Balanced => "balanced",
            Compression::HighRatio => "high-ratio",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compression {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "store" | "none" | "passthrough" => Ok(Compression::Store),
            "fast" | "lz4" => Ok(Compression::Fast),
            "balanced" | "deflate" | "zlib" => Ok(Compression::Balanced),
            "high-ratio" | "zstd" => Ok(Compression::HighRatio),
            other => Err(CodecError::UnknownCompression(other.to_string())),
        }
    }
}

/// Resolve a codec from its on-disk `codec_id`.
///
/// Called when decoding an existing container, so the payload is always
/// handed to the codec that wrote it.
pub fn codec_by_id(id: u16) -> Result<Arc<dyn Codec>, CodecError> {
    let codec: Arc<dyn Codec> = match Compression::from_id(id)? {
        Compression::Store => Arc::new(PassThroughCodec),
        Compression::Fast => Arc::new(Lz4Codec),
        Compression::Balanced => Arc::new(DeflateCodec::default()),
        Compression::HighRatio => Arc::new(ZstdCodec::default()),
    };
    log::trace!("resolved codec id {} to {}", id, codec.name());
    Ok(codec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_resolve_back_to_the_same_option() {
        for option in Compression::ALL {
            assert_eq!(Compression::from_id(option.id()).unwrap(), option);
            assert_eq!(option.codec().id(), option.id());
            assert_eq!(codec_by_id(option.id()).unwrap().id(), option.id());
        }
    }

    #[test]
    fn unknown_id_is_rejected() {
        assert!(matches!(codec_by_id(42), Err(CodecError::UnknownCodec(42))));
    }

    #[test]
    fn parses_cli_aliases() {
        assert_eq!("lz4".parse::<Compression>().unwrap(), Compression::Fast);
        assert_eq!("zstd".parse::<Compression>().unwrap(), Compression::HighRatio);
        assert_eq!("zlib".parse::<Compression>().unwrap(), Compression::Balanced);
        assert_eq!("none".parse::<Compression>().unwrap(), Compression::Store);
        for option in Compression::ALL {
            assert_eq!(option.to_string().parse::<Compression>().unwrap(), option);
        }
        let err = "brotli".parse::<Compression>().unwrap_err();
        assert!(err.to_string().contains("brotli"));
    }
}
