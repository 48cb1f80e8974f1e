use ifs_codecs::Compression;

use crate::cipher::DEFAULT_KDF_ITERATIONS;

/// Settings for [`encode_image`](crate::encode_image).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Encrypts the payload when set. Must not be empty.
    pub password: Option<String>,
    pub compression: Compression,
    /// Advisory flag persisted in the header; the codec does not act on it.
    pub delete_metadata: bool,
    /// PBKDF2 rounds for encrypted containers, at least
    /// [`MIN_KDF_ITERATIONS`](crate::cipher::MIN_KDF_ITERATIONS).
    pub kdf_iterations: u32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            password: None,
            compression: Compression::default(),
            delete_metadata: false,
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
        }
    }
}

impl EncodeOptions {
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_delete_metadata(mut self, delete_metadata: bool) -> Self {
        self.delete_metadata = delete_metadata;
        self
    }
}

/// Settings for [`decode_image`](crate::decode_image).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Required for encrypted containers, ignored otherwise.
    pub password: Option<String>,
}

impl DecodeOptions {
    pub fn with_password(password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
        }
    }
}
