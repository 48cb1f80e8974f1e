pub mod cipher;
pub mod container;
pub mod delta;
pub mod error;
pub mod format;
pub mod image;
pub mod options;
pub mod pixels;

pub use error::IfsError;
pub use format::{IfsHeader, Metadata, DELIMITER, HEADER_SIZE, MAGIC};
pub use ifs_codecs::Compression;
pub use image::{decode_image, encode_image, inspect};
pub use options::{DecodeOptions, EncodeOptions};
pub use pixels::{Channels, PixelBuffer};
