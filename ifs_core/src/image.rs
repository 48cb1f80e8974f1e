//! Encode/decode facade tying the pipeline stages together.
//!
//! ```text
//! encode: samples -> delta -> compress -> [seal] -> frame
//! decode: unframe -> [open] -> decompress -> inverse delta -> PixelBuffer
//! ```
//!
//! Every call owns its buffers end to end and keeps no state between calls.

use ifs_codecs::codec_by_id;

use crate::cipher;
use crate::container;
use crate::delta;
use crate::error::IfsError;
use crate::format::Metadata;
use crate::options::{DecodeOptions, EncodeOptions};
use crate::pixels::PixelBuffer;

/// Encode `pixels` into a self-contained IFS container.
///
/// The input buffer is only read. The whole container is built in memory, so
/// on error nothing partial is handed back.
pub fn encode_image(pixels: &PixelBuffer, options: &EncodeOptions) -> Result<Vec<u8>, IfsError> {
    let channels = pixels.channels();
    let deltas = delta::encode(pixels.samples(), channels.count())?;

    let codec = options.compression.codec();
    let compressed = codec.compress(&deltas)?;
    log::debug!(
        "{}x{} {:?}: {} samples -> {} bytes via {}",
        pixels.width(),
        pixels.height(),
        channels,
        deltas.len(),
        compressed.len(),
        codec.name()
    );

    let encrypted = options.password.is_some();
    let metadata = Metadata {
        width: pixels.width(),
        height: pixels.height(),
        channels,
        delete_metadata: options.delete_metadata,
        compression: options.compression,
        encrypted,
        kdf_iterations: if encrypted { options.kdf_iterations } else { 0 },
    };

    let payload = match &options.password {
        Some(password) => cipher::seal(
            &compressed,
            password,
            options.kdf_iterations,
            &metadata.associated_data(),
        )?,
        None => compressed,
    };

    let container = container::frame(&metadata, &payload);
    log::debug!("framed {} byte container", container.len());
    Ok(container)
}

/// Reconstruct the pixel buffer stored in an IFS container.
pub fn decode_image(bytes: &[u8], options: &DecodeOptions) -> Result<PixelBuffer, IfsError> {
    let (metadata, payload) = container::unframe(bytes)?;
    let expected = metadata.sample_count()?;

    let opened;
    let compressed = if metadata.encrypted {
        let password = options.password.as_deref().ok_or(IfsError::PasswordRequired)?;
        opened = cipher::open(
            payload,
            password,
            metadata.kdf_iterations,
            &metadata.associated_data(),
        )?;
        &opened[..]
    } else {
        if options.password.is_some() {
            log::warn!("container is not encrypted; ignoring the supplied password");
        }
        payload
    };

    let codec = codec_by_id(metadata.compression.id())?;
    let mut samples = codec.decompress(compressed, expected)?;
    if samples.len() != expected {
        return Err(IfsError::ShapeMismatch {
            expected,
            actual: samples.len(),
        });
    }
    log::debug!(
        "decoded {} payload bytes into {} samples via {}",
        compressed.len(),
        samples.len(),
        codec.name()
    );

    delta::decode_in_place(&mut samples, metadata.channels.count())?;
    PixelBuffer::new(metadata.width, metadata.height, metadata.channels, samples)
}

/// Read a container's metadata without touching its payload.
pub fn inspect(bytes: &[u8]) -> Result<Metadata, IfsError> {
    container::read_metadata(bytes)
}
