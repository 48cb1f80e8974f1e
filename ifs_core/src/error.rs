//! The single error type returned by every fallible `ifs_core` operation.

use ifs_codecs::CodecError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IfsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("malformed container: {0}")]
    MalformedContainer(String),

    #[error("corrupt payload: {0}")]
    CorruptPayload(String),

    /// The HMAC tag did not verify: wrong password, or the container was
    /// modified after it was written.
    #[error("authentication failed: wrong password or tampered container")]
    AuthenticationFailed,

    #[error("container is encrypted but no password was supplied")]
    PasswordRequired,

    #[error("shape mismatch: header declares {expected} samples, payload holds {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
}

impl IfsError {
    /// True for every failure caused by payload bytes that could not be
    /// turned back into samples, authenticated or not.
    pub fn is_corrupt_payload(&self) -> bool {
        matches!(self, IfsError::CorruptPayload(_) | IfsError::AuthenticationFailed)
    }
}

impl From<CodecError> for IfsError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::LimitExceeded { limit, declared } => IfsError::ShapeMismatch {
                expected: limit,
                actual: declared,
            },
            CodecError::UnknownCodec(id) => {
                IfsError::MalformedContainer(format!("unknown codec id {id}"))
            }
            CodecError::UnknownCompression(name) => {
                IfsError::InvalidInput(format!("unknown compression '{name}'"))
            }
            other => IfsError::CorruptPayload(other.to_string()),
        }
    }
}
