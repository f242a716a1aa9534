//! # Symmetric Encryption
//!
//! AES-256-GCM with a detached nonce and tag, keyed by a single-use
//! [`SessionKey`].
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  seal(session_key, plaintext)                                          │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  nonce  ← OsRng (12 bytes, fresh per call)                             │
//! │  (ciphertext, tag) ← AES-256-GCM(key, nonce, plaintext, aad = ∅)       │
//! │                                                                         │
//! │  Output: Sealed { nonce, ciphertext, tag (16 bytes) }                  │
//! │                                                                         │
//! │  open() verifies the tag BEFORE releasing any plaintext byte.          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce as AesNonce, Tag as AesTag,
};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{Error, Result};

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

/// Size of the session key in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// Largest plaintext a single AES-GCM invocation accepts (2^36 - 32 bytes)
pub const MAX_PLAINTEXT_LEN: u64 = (1 << 36) - 32;

/// A nonce (number used once) for AES-GCM encryption
///
/// ## Critical Security Requirement
///
/// **NEVER reuse a nonce with the same key!**
///
/// Every session key encrypts exactly one plaintext, and every nonce is
/// drawn fresh from the OS RNG, so reuse would need both a repeated key
/// and a repeated 96-bit random value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Nonce(pub [u8; NONCE_SIZE]);

impl Nonce {
    /// Generate a cryptographically random nonce
    pub fn random() -> Result<Self> {
        let mut bytes = [0u8; NONCE_SIZE];
        rand::rngs::OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|_| Error::RngFailed)?;
        Ok(Self(bytes))
    }

    /// Create from existing bytes
    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

/// A single-use AES-256-GCM key
///
/// Zeroized when dropped. Deliberately has no `Debug`, `Clone`, or
/// serialization support.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; KEY_SIZE]);

impl SessionKey {
    /// Generate a fresh random session key
    pub fn generate() -> Result<Self> {
        let mut key = Self([0u8; KEY_SIZE]);
        rand::rngs::OsRng
            .try_fill_bytes(&mut key.0)
            .map_err(|_| Error::RngFailed)?;
        Ok(key)
    }

    /// Rebuild from unwrapped bytes
    ///
    /// Fails with [`Error::KeyUnwrap`] if the slice is not exactly 32 bytes;
    /// this is only ever fed the output of an RSA unwrap.
    pub(crate) fn from_unwrapped(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(Error::KeyUnwrap);
        }
        let mut key = Self([0u8; KEY_SIZE]);
        key.0.copy_from_slice(bytes);
        Ok(key)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        Aes256Gcm::new_from_slice(&self.0)
            .map_err(|e| Error::EncryptionFailed(format!("Invalid key: {}", e)))
    }
}

/// Output of [`seal`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    /// Nonce used for this encryption
    pub nonce: Nonce,
    /// Ciphertext, same length as the plaintext
    pub ciphertext: Vec<u8>,
    /// Detached authentication tag
    pub tag: [u8; TAG_SIZE],
}

/// Encrypt `plaintext` under `key` with a fresh random nonce
pub fn seal(key: &SessionKey, plaintext: &[u8]) -> Result<Sealed> {
    let len = plaintext.len() as u64;
    if len > MAX_PLAINTEXT_LEN {
        return Err(Error::PlaintextTooLarge {
            len,
            max: MAX_PLAINTEXT_LEN,
        });
    }

    let nonce = Nonce::random()?;
    let cipher = key.cipher()?;

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(AesNonce::from_slice(&nonce.0), b"", &mut buffer)
        .map_err(|e| Error::EncryptionFailed(format!("Encryption failed: {}", e)))?;

    let mut tag_bytes = [0u8; TAG_SIZE];
    tag_bytes.copy_from_slice(tag.as_slice());

    Ok(Sealed {
        nonce,
        ciphertext: buffer,
        tag: tag_bytes,
    })
}

/// Decrypt and authenticate
///
/// ## Errors
///
/// Returns [`Error::Integrity`] if the ciphertext, nonce, or tag was
/// modified, or if `key` is not the key used to seal. The working buffer is
/// zeroized before the error is returned.
pub fn open(
    key: &SessionKey,
    nonce: &Nonce,
    ciphertext: &[u8],
    tag: &[u8; TAG_SIZE],
) -> Result<Vec<u8>> {
    let cipher = key.cipher()?;

    let mut buffer = Zeroizing::new(ciphertext.to_vec());
    cipher
        .decrypt_in_place_detached(
            AesNonce::from_slice(&nonce.0),
            b"",
            buffer.as_mut_slice(),
            AesTag::from_slice(tag),
        )
        .map_err(|_| Error::Integrity)?;

    Ok(std::mem::take(&mut *buffer))
}

// ============================================================================
// TESTS
// ============================================================================
