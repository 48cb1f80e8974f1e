use ifs_codecs::Compression;
use serde::{Deserialize, Serialize};

use crate::error::IfsError;
use crate::pixels::Channels;

/// Magic bytes opening every IFS container.
pub const MAGIC: &[u8; 4] = b"IFS1";

/// Current (and only) container format version.
pub const FORMAT_VERSION: u16 = 1;

/// Fixed size of the IFS header in bytes.
///   magic[4] + version:u16 + codec_id:u16 + flags:u16 + channels:u8
///   + reserved:u8 + width:u32 + height:u32 + kdf_iterations:u32
///   + checksum:u64
///   = 4 + 2 + 2 + 2 + 1 + 1 + 4 + 4 + 4 + 8 = 32
pub const HEADER_SIZE: usize = 32;

/// Separates the header from the payload. Always found at offset
/// `HEADER_SIZE`; it is never searched for.
pub const DELIMITER: &[u8; 4] = b"\n---";

/// Offset of the first payload byte.
pub const PAYLOAD_OFFSET: usize = HEADER_SIZE + DELIMITER.len();

// ── Flags ──────────────────────────────────────────────────────────────────

/// Payload is `salt || iv || ciphertext || tag`.
pub const FLAG_ENCRYPTED: u16 = 1 << 0;

/// Advisory: the producer asked for source metadata to be discarded.
pub const FLAG_DELETE_METADATA: u16 = 1 << 1;

/// Header carries an xxhash3-64 of the payload bytes.
pub const FLAG_HAS_CHECKSUM: u16 = 1 << 2;

const KNOWN_FLAGS: u16 = FLAG_ENCRYPTED | FLAG_DELETE_METADATA | FLAG_HAS_CHECKSUM;

const RESERVED_OFFSET: usize = 11;

const CHECKSUM_RANGE: std::ops::Range<usize> = 24..32;

// ── Header ─────────────────────────────────────────────────────────────────

/// Raw representation of the 32-byte IFS header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfsHeader {
    pub version: u16,
    pub codec_id: u16,
    pub flags: u16,
    pub channels: u8,
    pub width: u32,
    pub height: u32,
    /// PBKDF2 rounds used for the payload key; 0 for plain containers.
    pub kdf_iterations: u32,
    /// xxhash3-64 of the payload bytes, valid when `FLAG_HAS_CHECKSUM` is set.
    pub checksum: u64,
}

impl IfsHeader {
    /// Serialize to exactly `HEADER_SIZE` bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[..4].copy_from_slice(MAGIC);
        buf[4..6].copy_from_slice(&self.version.to_le_bytes());
        buf[6..8].copy_from_slice(&self.codec_id.to_le_bytes());
        buf[8..10].copy_from_slice(&self.flags.to_le_bytes());
        buf[10] = self.channels;
        // buf[RESERVED_OFFSET] stays zero
        buf[12..16].copy_from_slice(&self.width.to_le_bytes());
        buf[16..20].copy_from_slice(&self.height.to_le_bytes());
        buf[20..24].copy_from_slice(&self.kdf_iterations.to_le_bytes());
        buf[CHECKSUM_RANGE].copy_from_slice(&self.checksum.to_le_bytes());
        buf
    }

    /// Deserialize from `HEADER_SIZE` bytes, checking the magic and the
    /// reserved byte.
    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self, IfsError> {
        if &buf[..4] != MAGIC {
            return Err(IfsError::MalformedContainer(
                "invalid magic bytes, not an IFS container".into(),
            ));
        }
        if buf[RESERVED_OFFSET] != 0 {
            return Err(IfsError::MalformedContainer(format!(
                "reserved header byte is 0x{:02x}, expected zero",
                buf[RESERVED_OFFSET]
            )));
        }
        Ok(Self {
            version: u16::from_le_bytes([buf[4], buf[5]]),
            codec_id: u16::from_le_bytes([buf[6], buf[7]]),
            flags: u16::from_le_bytes([buf[8], buf[9]]),
            channels: buf[10],
            width: u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]),
            height: u32::from_le_bytes([buf[16], buf[17], buf[18], buf[19]]),
            kdf_iterations: u32::from_le_bytes([buf[20], buf[21], buf[22], buf[23]]),
            checksum: u64::from_le_bytes([
                buf[24], buf[25], buf[26], buf[27], buf[28], buf[29], buf[30], buf[31],
            ]),
        })
    }

    pub fn has_flag(&self, flag: u16) -> bool {
        self.flags & flag != 0
    }
}

// ── Metadata ───────────────────────────────────────────────────────────────

/// Validated, logical view of a container header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub width: u32,
    pub height: u32,
    pub channels: Channels,
    /// Advisory only; carried through untouched.
    pub delete_metadata: bool,
    pub compression: Compression,
    pub encrypted: bool,
    /// PBKDF2 rounds; 0 when `encrypted` is false.
    pub kdf_iterations: u32,
}

impl Metadata {
    /// Number of samples the payload must reconstruct.
    pub fn sample_count(&self) -> Result<usize, IfsError> {
        crate::pixels::sample_count(self.width, self.height, self.channels)
    }

    /// Build the wire header for this metadata with the given payload checksum.
    pub fn to_header(&self, checksum: Option<u64>) -> IfsHeader {
        let mut flags = 0;
        if self.encrypted {
            flags |= FLAG_ENCRYPTED;
        }
        if self.delete_metadata {
            flags |= FLAG_DELETE_METADATA;
        }
        if checksum.is_some() {
            flags |= FLAG_HAS_CHECKSUM;
        }
        IfsHeader {
            version: FORMAT_VERSION,
            codec_id: self.compression.id(),
            flags,
            channels: self.channels.count() as u8,
            width: self.width,
            height: self.height,
            kdf_iterations: if self.encrypted { self.kdf_iterations } else { 0 },
            checksum: checksum.unwrap_or(0),
        }
    }

    /// Validate a wire header and lift it into `Metadata`.
    pub fn from_header(header: &IfsHeader) -> Result<Self, IfsError> {
        if header.version != FORMAT_VERSION {
            return Err(IfsError::MalformedContainer(format!(
                "unsupported IFS version {} (only version {} is supported)",
                header.version, FORMAT_VERSION
            )));
        }
        if header.flags & !KNOWN_FLAGS != 0 {
            return Err(IfsError::MalformedContainer(format!(
                "unknown header flags 0x{:04x}",
                header.flags & !KNOWN_FLAGS
            )));
        }
        let channels = Channels::from_count(header.channels).ok_or_else(|| {
            IfsError::MalformedContainer(format!("unsupported channel count {}", header.channels))
        })?;
        if header.width == 0 || header.height == 0 {
            return Err(IfsError::MalformedContainer(format!(
                "zero image dimension {}x{}",
                header.width, header.height
            )));
        }
        let compression = Compression::from_id(header.codec_id)?;
        let encrypted = header.has_flag(FLAG_ENCRYPTED);
        if encrypted && header.kdf_iterations == 0 {
            return Err(IfsError::MalformedContainer(
                "encrypted container declares zero key-derivation rounds".into(),
            ));
        }
        if !encrypted && header.kdf_iterations != 0 {
            return Err(IfsError::MalformedContainer(format!(
                "plain container declares {} key-derivation rounds",
                header.kdf_iterations
            )));
        }
        // The tag of an encrypted container does not cover the checksum field,
        // so it must hold nothing.
        if encrypted && (header.has_flag(FLAG_HAS_CHECKSUM) || header.checksum != 0) {
            return Err(IfsError::MalformedContainer(
                "encrypted container must not carry a payload checksum".into(),
            ));
        }
        if !header.has_flag(FLAG_HAS_CHECKSUM) && header.checksum != 0 {
            return Err(IfsError::MalformedContainer(format!(
                "checksum {:016x} present without the has-checksum flag",
                header.checksum
            )));
        }
        Ok(Self {
            width: header.width,
            height: header.height,
            channels,
            delete_metadata: header.has_flag(FLAG_DELETE_METADATA),
            compression,
            encrypted,
            kdf_iterations: header.kdf_iterations,
        })
    }

    /// Header bytes bound into the encryption tag: everything but the
    /// checksum, which encrypted containers do not use.
    pub fn associated_data(&self) -> [u8; HEADER_SIZE] {
        self.to_header(None).to_bytes()
    }
}
