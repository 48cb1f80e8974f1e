//! Binds a [`Metadata`] header to an opaque payload and splits them again.
//!
//! ```text
//! [HEADER: 32 bytes][DELIMITER: "\n---"][PAYLOAD ...]
//! ```
//!
//! The delimiter sits at a fixed offset right after the fixed-width header,
//! so it is verified, never scanned for: header fields that happen to contain
//! the same bytes cannot cause a false split.

use xxhash_rust::xxh3::xxh3_64;

use crate::error::IfsError;
use crate::format::{IfsHeader, Metadata, DELIMITER, FLAG_HAS_CHECKSUM, HEADER_SIZE, PAYLOAD_OFFSET};

/// Serialize `metadata` and append `payload`.
///
/// Plain payloads get an xxhash3-64 checksum in the header. Encrypted payloads
/// skip it: their HMAC tag already covers every byte.
pub fn frame(metadata: &Metadata, payload: &[u8]) -> Vec<u8> {
    let checksum = (!metadata.encrypted).then(|| xxh3_64(payload));
    let header = metadata.to_header(checksum);
    let mut out = Vec::with_capacity(PAYLOAD_OFFSET + payload.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(DELIMITER);
    out.extend_from_slice(payload);
    out
}

/// Split a container into its metadata and payload.
///
/// Structural problems are [`IfsError::MalformedContainer`]; a payload that
/// does not match the header checksum is [`IfsError::CorruptPayload`].
pub fn unframe(bytes: &[u8]) -> Result<(Metadata, &[u8]), IfsError> {
    let header = read_header(bytes)?;
    let metadata = Metadata::from_header(&header)?;
    let payload = &bytes[PAYLOAD_OFFSET..];

    if header.has_flag(FLAG_HAS_CHECKSUM) {
        let computed = xxh3_64(payload);
        if computed != header.checksum {
            return Err(IfsError::CorruptPayload(format!(
                "payload checksum mismatch: expected {:016x}, got {:016x}",
                header.checksum, computed
            )));
        }
    }
    Ok((metadata, payload))
}

/// Parse only the header, leaving the payload untouched.
pub fn read_metadata(bytes: &[u8]) -> Result<Metadata, IfsError> {
    Metadata::from_header(&read_header(bytes)?)
}

fn read_header(bytes: &[u8]) -> Result<IfsHeader, IfsError> {
    if bytes.len() < PAYLOAD_OFFSET {
        return Err(IfsError::MalformedContainer(format!(
            "{} bytes is too short for an IFS header ({} required)",
            bytes.len(),
            PAYLOAD_OFFSET
        )));
    }
    let mut header_buf = [0u8; HEADER_SIZE];
    header_buf.copy_from_slice(&bytes[..HEADER_SIZE]);
    let header = IfsHeader::from_bytes(&header_buf)?;
    if &bytes[HEADER_SIZE..PAYLOAD_OFFSET] != DELIMITER {
        return Err(IfsError::MalformedContainer(
            "header delimiter missing after the metadata record".into(),
        ));
    }
    Ok(header)
}

#[cfg(test)]
mod tests {
    use ifs_codecs::Compression;

    use super::*;
    use crate::pixels::Channels;

    fn metadata(encrypted: bool) -> Metadata {
        Metadata {
            width: 3,
            height: 2,
            channels: Channels::Rgb,
            delete_metadata: true,
            compression: Compression::HighRatio,
            encrypted,
            kdf_iterations: if encrypted { 100_000 } else { 0 },
        }
    }

    #[test]
    fn frame_unframe_roundtrip() {
        for encrypted in [false, true] {
            let meta = metadata(encrypted);
            let payload = b"opaque \n--- payload bytes".to_vec();
            let blob = frame(&meta, &payload);
            assert_eq!(blob.len(), PAYLOAD_OFFSET + payload.len());
            let (back, body) = unframe(&blob).unwrap();
            assert_eq!(back, meta);
            assert_eq!(body, &payload[..]);
        }
    }

    #[test]
    fn empty_payload_is_allowed_by_the_framer() {
        let blob = frame(&metadata(false), &[]);
        let (_, body) = unframe(&blob).unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn delimiter_bytes_inside_the_header_do_not_split_it() {
        let mut meta = metadata(false);
        // width = "\n---" read as little-endian u32
        meta.width = u32::from_le_bytes(*DELIMITER);
        let blob = frame(&meta, b"xyz");
        assert_eq!(&blob[12..16], DELIMITER);
        let (back, body) = unframe(&blob).unwrap();
        assert_eq!(back.width, meta.width);
        assert_eq!(body, b"xyz");
    }

    #[test]
    fn missing_delimiter_is_malformed() {
        let mut blob = frame(&metadata(false), b"payload");
        blob[HEADER_SIZE + 1] = b'+';
        let err = unframe(&blob).unwrap_err();
        assert!(matches!(err, IfsError::MalformedContainer(_)));
        assert!(err.to_string().contains("delimiter"));

        let truncated = &frame(&metadata(false), b"")[..PAYLOAD_OFFSET - 1];
        assert!(matches!(unframe(truncated), Err(IfsError::MalformedContainer(_))));
        assert!(matches!(unframe(b"not a container at all, just text"), Err(IfsError::MalformedContainer(_))));
    }

    #[test]
    fn plain_payload_corruption_is_caught_by_checksum() {
        let mut blob = frame(&metadata(false), b"payload");
        let last = blob.len() - 1;
        blob[last] ^= 0xff;
        assert!(matches!(unframe(&blob), Err(IfsError::CorruptPayload(_))));
    }

    #[test]
    fn encrypted_containers_carry_no_checksum() {
        let mut blob = frame(&metadata(true), b"sealed");
        assert_eq!(&blob[24..32], &[0u8; 8]);
        let last = blob.len() - 1;
        blob[last] ^= 0xff;
        assert!(unframe(&blob).is_ok());
    }

    #[test]
    fn read_metadata_skips_payload_verification() {
        let mut blob = frame(&metadata(false), b"payload");
        let last = blob.len() - 1;
        blob[last] ^= 0xff;
        assert_eq!(read_metadata(&blob).unwrap(), metadata(false));
    }
}
