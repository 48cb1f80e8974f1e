//! Password-based payload encryption.
//!
//! ```text
//! key material = PBKDF2-HMAC-SHA256(password, salt, rounds) -> 64 bytes
//!                [0..32]  AES-256 key
//!                [32..64] HMAC-SHA256 key
//! payload      = salt[16] || iv[16] || AES-256-CFB(PKCS#7(plaintext)) || tag[32]
//! tag          = HMAC-SHA256(associated_data || salt || iv || ciphertext)
//! ```
//!
//! Salt and IV are drawn fresh for every [`seal`]. The tag is checked before
//! anything is decrypted, so a wrong password and a modified container both
//! surface as [`IfsError::AuthenticationFailed`].

use std::time::Instant;

use aes::Aes256;
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::error::IfsError;

type Aes256CfbEnc = cfb_mode::Encryptor<Aes256>;
type Aes256CfbDec = cfb_mode::Decryptor<Aes256>;
type HmacSha256 = Hmac<Sha256>;

pub const SALT_LEN: usize = 16;
pub const IV_LEN: usize = 16;
/// AES block size; ciphertext is always a non-zero multiple of it.
pub const BLOCK_LEN: usize = 16;
pub const TAG_LEN: usize = 32;
const KEY_LEN: usize = 32;

/// Fewest PBKDF2 rounds [`seal`] accepts.
pub const MIN_KDF_ITERATIONS: u32 = 100_000;
pub const DEFAULT_KDF_ITERATIONS: u32 = MIN_KDF_ITERATIONS;
/// Most PBKDF2 rounds [`open`] will run for a container header.
pub const MAX_KDF_ITERATIONS: u32 = 10_000_000;

/// Smallest well-formed encrypted payload: one padded block plus framing.
pub const MIN_SEALED_LEN: usize = SALT_LEN + IV_LEN + BLOCK_LEN + TAG_LEN;

struct PayloadKeys {
    cipher: [u8; KEY_LEN],
    mac: [u8; KEY_LEN],
}

impl PayloadKeys {
    fn derive(password: &str, salt: &[u8], iterations: u32) -> Self {
        let started = Instant::now();
        let mut okm = [0u8; 2 * KEY_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut okm);
        let mut keys = Self {
            cipher: [0u8; KEY_LEN],
            mac: [0u8; KEY_LEN],
        };
        keys.cipher.copy_from_slice(&okm[..KEY_LEN]);
        keys.mac.copy_from_slice(&okm[KEY_LEN..]);
        log::trace!(
            "derived payload keys ({} PBKDF2 rounds) in {:.1}ms",
            iterations,
            started.elapsed().as_secs_f64() * 1000.0
        );
        keys
    }

    fn authenticator(
        &self,
        associated_data: &[u8],
        salt: &[u8],
        iv: &[u8],
        ciphertext: &[u8],
    ) -> Result<HmacSha256, IfsError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.mac)
            .map_err(|e| IfsError::InvalidInput(format!("hmac key: {e}")))?;
        mac.update(associated_data);
        mac.update(salt);
        mac.update(iv);
        mac.update(ciphertext);
        Ok(mac)
    }
}

/// Encrypt and authenticate `plaintext` under `password`.
///
/// `associated_data` is authenticated but not stored; [`open`] must be given
/// the same bytes.
pub fn seal(
    plaintext: &[u8],
    password: &str,
    iterations: u32,
    associated_data: &[u8],
) -> Result<Vec<u8>, IfsError> {
    if password.is_empty() {
        return Err(IfsError::InvalidInput("password must not be empty".into()));
    }
    if iterations < MIN_KDF_ITERATIONS {
        return Err(IfsError::InvalidInput(format!(
            "{iterations} key-derivation rounds is below the minimum of {MIN_KDF_ITERATIONS}"
        )));
    }

    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    let mut rng = rand::rng();
    rng.fill_bytes(&mut salt);
    rng.fill_bytes(&mut iv);

    let keys = PayloadKeys::derive(password, &salt, iterations);
    let mut ciphertext = pad(plaintext);
    Aes256CfbEnc::new(&keys.cipher.into(), &iv.into()).encrypt(&mut ciphertext);
    let tag = keys
        .authenticator(associated_data, &salt, &iv, &ciphertext)?
        .finalize()
        .into_bytes();

    let mut sealed = Vec::with_capacity(SALT_LEN + IV_LEN + ciphertext.len() + TAG_LEN);
    sealed.extend_from_slice(&salt);
    sealed.extend_from_slice(&iv);
    sealed.extend_from_slice(&ciphertext);
    sealed.extend_from_slice(&tag);
    log::debug!(
        "sealed {} plaintext bytes into {} payload bytes",
        plaintext.len(),
        sealed.len()
    );
    Ok(sealed)
}

/// Verify and decrypt a payload produced by [`seal`].
pub fn open(
    sealed: &[u8],
    password: &str,
    iterations: u32,
    associated_data: &[u8],
) -> Result<Vec<u8>, IfsError> {
    if password.is_empty() {
        return Err(IfsError::InvalidInput("password must not be empty".into()));
    }
    if iterations == 0 || iterations > MAX_KDF_ITERATIONS {
        return Err(IfsError::MalformedContainer(format!(
            "{iterations} key-derivation rounds is outside 1..={MAX_KDF_ITERATIONS}"
        )));
    }
    if sealed.len() < MIN_SEALED_LEN {
        return Err(IfsError::CorruptPayload(format!(
            "encrypted payload is {} bytes, at least {} required",
            sealed.len(),
            MIN_SEALED_LEN
        )));
    }

    let (salt, rest) = sealed.split_at(SALT_LEN);
    let (iv, rest) = rest.split_at(IV_LEN);
    let (ciphertext, tag) = rest.split_at(rest.len() - TAG_LEN);
    if ciphertext.len() % BLOCK_LEN != 0 {
        return Err(IfsError::CorruptPayload(format!(
            "ciphertext length {} is not a multiple of {}",
            ciphertext.len(),
            BLOCK_LEN
        )));
    }

    let keys = PayloadKeys::derive(password, salt, iterations);
    keys.authenticator(associated_data, salt, iv, ciphertext)?
        .verify_slice(tag)
        .map_err(|_| IfsError::AuthenticationFailed)?;

    let mut plaintext = ciphertext.to_vec();
    Aes256CfbDec::new_from_slices(&keys.cipher, iv)
        .map_err(|e| IfsError::CorruptPayload(format!("bad iv: {e}")))?
        .decrypt(&mut plaintext);
    unpad(plaintext)
}

/// PKCS#7: always append 1..=BLOCK_LEN bytes, each equal to the pad length.
fn pad(data: &[u8]) -> Vec<u8> {
    let pad_len = BLOCK_LEN - data.len() % BLOCK_LEN;
    let mut padded = Vec::with_capacity(data.len() + pad_len);
    padded.extend_from_slice(data);
    padded.resize(data.len() + pad_len, pad_len as u8);
    padded
}

fn unpad(mut padded: Vec<u8>) -> Result<Vec<u8>, IfsError> {
    let pad_len = padded.last().copied().unwrap_or(0) as usize;
    let valid = (1..=BLOCK_LEN).contains(&pad_len)
        && pad_len <= padded.len()
        && padded[padded.len() - pad_len..].iter().all(|&b| b as usize == pad_len);
    if !valid {
        return Err(IfsError::CorruptPayload("invalid block padding".into()));
    }
    padded.truncate(padded.len() - pad_len);
    Ok(padded)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AAD: &[u8] = b"header bytes";

    #[test]
    fn padding_is_reversible_and_unambiguous() {
        for len in [0usize, 1, 15, 16, 17, 31, 32] {
            let data: Vec<u8> = (0..len).map(|i| if i % 2 == 0 { 0 } else { i as u8 }).collect();
            let padded = pad(&data);
            assert_eq!(padded.len() % BLOCK_LEN, 0);
            assert!(padded.len() > data.len());
            assert_eq!(unpad(padded).unwrap(), data);
        }
        assert_eq!(pad(&[0u8; 16]).len(), 32);
    }

    #[test]
    fn bad_padding_is_corrupt() {
        for bad in [vec![0u8; 16], vec![17u8; 16], {
            let mut v = vec![4u8; 16];
            v[13] = 3;
            v
        }] {
            assert!(matches!(unpad(bad), Err(IfsError::CorruptPayload(_))));
        }
    }

    #[test]
    fn seal_open_roundtrip_keeps_trailing_zeros() {
        let plaintext = [9u8, 8, 7, 0, 0, 0, 0];
        let sealed = seal(&plaintext, "correct-horse", DEFAULT_KDF_ITERATIONS, AAD).unwrap();
        assert_eq!(sealed.len(), SALT_LEN + IV_LEN + BLOCK_LEN + TAG_LEN);
        let opened = open(&sealed, "correct-horse", DEFAULT_KDF_ITERATIONS, AAD).unwrap();
        assert_eq!(opened, plaintext);
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let sealed = seal(&[], "pw", DEFAULT_KDF_ITERATIONS, AAD).unwrap();
        assert_eq!(sealed.len(), MIN_SEALED_LEN);
        assert!(open(&sealed, "pw", DEFAULT_KDF_ITERATIONS, AAD).unwrap().is_empty());
    }

    #[test]
    fn salt_and_iv_are_fresh_per_call() {
        let a = seal(b"same input", "pw", DEFAULT_KDF_ITERATIONS, AAD).unwrap();
        let b = seal(b"same input", "pw", DEFAULT_KDF_ITERATIONS, AAD).unwrap();
        assert_ne!(a[..SALT_LEN], b[..SALT_LEN]);
        assert_ne!(a[SALT_LEN..SALT_LEN + IV_LEN], b[SALT_LEN..SALT_LEN + IV_LEN]);
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_password_fails_authentication() {
        let sealed = seal(b"pixels", "correct-horse", DEFAULT_KDF_ITERATIONS, AAD).unwrap();
        let err = open(&sealed, "wrong-horse", DEFAULT_KDF_ITERATIONS, AAD).unwrap_err();
        assert!(matches!(err, IfsError::AuthenticationFailed));
        assert!(err.is_corrupt_payload());
    }

    #[test]
    fn any_modified_byte_fails_authentication() {
        let sealed = seal(&[1u8; 40], "pw", DEFAULT_KDF_ITERATIONS, AAD).unwrap();
        for idx in [0, SALT_LEN, SALT_LEN + IV_LEN + 3, sealed.len() - 1] {
            let mut tampered = sealed.clone();
            tampered[idx] ^= 0x01;
            assert!(
                matches!(
                    open(&tampered, "pw", DEFAULT_KDF_ITERATIONS, AAD),
                    Err(IfsError::AuthenticationFailed)
                ),
                "flip at {idx} went unnoticed"
            );
        }
        assert!(matches!(
            open(&sealed, "pw", DEFAULT_KDF_ITERATIONS, b"other header"),
            Err(IfsError::AuthenticationFailed)
        ));
    }

    #[test]
    fn truncated_payload_is_corrupt() {
        let sealed = seal(b"abc", "pw", DEFAULT_KDF_ITERATIONS, AAD).unwrap();
        let err = open(&sealed[..MIN_SEALED_LEN - 1], "pw", DEFAULT_KDF_ITERATIONS, AAD).unwrap_err();
        assert!(matches!(err, IfsError::CorruptPayload(_)));

        let mut misaligned = sealed.clone();
        misaligned.insert(SALT_LEN + IV_LEN, 0);
        let err = open(&misaligned, "pw", DEFAULT_KDF_ITERATIONS, AAD).unwrap_err();
        assert!(err.to_string().contains("not a multiple"));
    }

    #[test]
    fn rejects_weak_parameters() {
        assert!(matches!(seal(b"x", "", DEFAULT_KDF_ITERATIONS, AAD), Err(IfsError::InvalidInput(_))));
        assert!(matches!(
            seal(b"x", "pw", MIN_KDF_ITERATIONS - 1, AAD),
            Err(IfsError::InvalidInput(_))
        ));
        assert!(matches!(
            open(&[0u8; MIN_SEALED_LEN], "pw", 0, AAD),
            Err(IfsError::MalformedContainer(_))
        ));
    }
}
