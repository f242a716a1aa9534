//! # Hybrid File Encryption
//!
//! Bulk data is encrypted with a fresh AES-256-GCM session key; the session
//! key is wrapped with the recipient's RSA public key (OAEP, SHA-256 for
//! both the label hash and MGF1).
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         HYBRID ENCRYPTION                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  SENDER (server, per upload)                                           │
//! │  ─────────────────────────────────────────────────────────────────      │
//! │                                                                         │
//! │  Step 1: session_key ← OsRng (32 bytes, single use)                    │
//! │                                                                         │
//! │  Step 2: AES-256-GCM(session_key, random nonce, plaintext)             │
//! │          → ciphertext + 16-byte tag                                    │
//! │                                                                         │
//! │  Step 3: RSA-OAEP-SHA256(recipient_public, session_key)                │
//! │          → wrapped_key (modulus size: 256 bytes for RSA-2048)          │
//! │                                                                         │
//! │  Step 4: session_key zeroized; bundle returned                         │
//! │                                                                         │
//! │  RECIPIENT                                                             │
//! │  ─────────────────────────────────────────────────────────────────      │
//! │                                                                         │
//! │  Step 1: RSA-OAEP unwrap → session_key   (failure: KeyUnwrap)          │
//! │  Step 2: AES-GCM verify tag, decrypt     (failure: Integrity)          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Properties
//!
//! | Property | Guarantee |
//! |----------|-----------|
//! | Confidentiality | Only the private-key holder can recover the session key |
//! | Integrity | Any bit flip in ciphertext, nonce, or tag is rejected |
//! | Atomic failure | No plaintext byte is released unless the tag verifies |
//! | Key isolation | Each file gets its own session key; nothing is reused |

use std::fmt;

use rand::rngs::OsRng;
use rsa::Oaep;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::encryption::{self, Nonce, SessionKey, NONCE_SIZE, TAG_SIZE};
use super::keys::{PrivateKey, PublicKey};
use crate::error::{Error, Result};

/// Everything a recipient needs to recover a file
///
/// The bundle is meaningless unless all four fields travel together. The
/// persistence collaborator usually stores `nonce`, `tag` and `wrapped_key`
/// as a record and hands `ciphertext` to blob storage.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiphertextBundle {
    /// AES-256-GCM ciphertext (same length as the plaintext)
    #[serde(with = "b64")]
    pub ciphertext: Vec<u8>,
    /// 96-bit nonce, unique per encryption
    #[serde(with = "hex_array")]
    pub nonce: [u8; NONCE_SIZE],
    /// 128-bit authentication tag
    #[serde(rename = "tag", with = "hex_array")]
    pub authentication_tag: [u8; TAG_SIZE],
    /// Session key wrapped under the recipient's RSA public key
    #[serde(with = "b64")]
    pub wrapped_key: Vec<u8>,
}

impl CiphertextBundle {
    /// Encode as JSON (binary fields as base64/hex strings)
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl fmt::Debug for CiphertextBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CiphertextBundle")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("nonce", &hex::encode(self.nonce))
            .field("tag", &hex::encode(self.authentication_tag))
            .field("wrapped_key_len", &self.wrapped_key.len())
            .finish()
    }
}

fn oaep() -> Oaep {
    // Oaep::new uses the same digest for the label hash and MGF1
    Oaep::new::<Sha256>()
}

fn wrap_key(session_key: &SessionKey, recipient: &PublicKey) -> Result<Vec<u8>> {
    recipient
        .rsa()
        .encrypt(&mut OsRng, oaep(), session_key.as_bytes())
        .map_err(|e| Error::EncryptionFailed(format!("Key wrap failed: {}", e)))
}

/// Unwrap with a single failure shape: every problem becomes `KeyUnwrap`.
/// The RSA private operation is blinded.
fn unwrap_key(wrapped_key: &[u8], recipient: &PrivateKey) -> Result<SessionKey> {
    let raw = recipient
        .rsa()
        .decrypt_blinded(&mut OsRng, oaep(), wrapped_key)
        .map(Zeroizing::new)
        .map_err(|_| Error::KeyUnwrap)?;

    SessionKey::from_unwrapped(&raw)
}

/// Encrypt `plaintext` for the holder of `recipient`'s private key
///
/// ## Errors
///
/// - [`Error::PlaintextTooLarge`] above the AES-GCM hard bound
/// - [`Error::RngFailed`] if the OS RNG is unavailable
/// - [`Error::EncryptionFailed`] if the RSA backend refuses the key
pub fn encrypt(plaintext: &[u8], recipient: &PublicKey) -> Result<CiphertextBundle> {
    let session_key = SessionKey::generate()?;
    let sealed = encryption::seal(&session_key, plaintext)?;
    let wrapped_key = wrap_key(&session_key, recipient)?;
    drop(session_key);

    tracing::debug!(
        plaintext_len = plaintext.len(),
        wrapped_key_len = wrapped_key.len(),
        recipient_bits = recipient.bits(),
        "Hybrid encryption complete"
    );

    Ok(CiphertextBundle {
        ciphertext: sealed.ciphertext,
        nonce: sealed.nonce.0,
        authentication_tag: sealed.tag,
        wrapped_key,
    })
}

/// Encrypt for a recipient given as a PEM public key
///
/// Convenience for callers that receive keys from an identity collaborator
/// as strings. Import failures are [`Error::KeyFormat`].
pub fn encrypt_for_pem(plaintext: &[u8], recipient_pem: &str) -> Result<CiphertextBundle> {
    let recipient = PublicKey::from_pem(recipient_pem)?;
    encrypt(plaintext, &recipient)
}

/// Decrypt a bundle with the recipient's private key
///
/// ## Errors
///
/// - [`Error::KeyUnwrap`] if the wrapped key cannot be recovered with this
///   private key. AES decryption is not attempted.
/// - [`Error::Integrity`] if the tag does not authenticate the ciphertext
///   and nonce. No plaintext is returned.
pub fn decrypt(bundle: &CiphertextBundle, recipient: &PrivateKey) -> Result<Vec<u8>> {
    let session_key = match unwrap_key(&bundle.wrapped_key, recipient) {
        Ok(key) => key,
        Err(e) => {
            tracing::warn!("Bundle rejected: session key unwrap failed");
            return Err(e);
        }
    };

    let nonce = Nonce::from_bytes(bundle.nonce);
    let plaintext = encryption::open(
        &session_key,
        &nonce,
        &bundle.ciphertext,
        &bundle.authentication_tag,
    )
    .map_err(|e| {
        tracing::warn!("Bundle rejected: authentication tag mismatch");
        e
    })?;

    tracing::debug!(plaintext_len = plaintext.len(), "Hybrid decryption complete");
    Ok(plaintext)
}

/// Serde helper for byte vectors as base64
mod b64 {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s.as_bytes()).map_err(serde::de::Error::custom)
    }
}

/// Serde helper for fixed-size byte arrays as hex
mod hex_array {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D, const N: usize>(
        deserializer: D,
    ) -> std::result::Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("Invalid length"))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::tests::{ALICE, BOB};
    use proptest::prelude::*;

    #[test]
    fn test_invoice_scenario() {
        let plaintext = b"invoice-2024.pdf contents";
        assert_eq!(plaintext.len(), 25);

        let bundle = encrypt(plaintext, &ALICE.public).unwrap();
        assert_eq!(bundle.authentication_tag.len(), 16);
        assert_eq!(bundle.nonce.len(), 12);
        assert_eq!(bundle.wrapped_key.len(), 256);
        assert_eq!(bundle.ciphertext.len(), 25);

        let decrypted = decrypt(&bundle, &ALICE.private).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_empty_plaintext() {
        let bundle = encrypt(b"", &ALICE.public).unwrap();
        assert_eq!(decrypt(&bundle, &ALICE.private).unwrap(), b"");
    }

    #[test]
    fn test_same_plaintext_twice_differs() {
        let plaintext = b"same bytes, same recipient";

        let b1 = encrypt(plaintext, &ALICE.public).unwrap();
        let b2 = encrypt(plaintext, &ALICE.public).unwrap();

        assert_ne!(b1.nonce, b2.nonce);
        assert_ne!(b1.ciphertext, b2.ciphertext);
        assert_ne!(b1.wrapped_key, b2.wrapped_key);
    }

    #[test]
    fn test_ciphertext_bit_flips_detected() {
        let plaintext = b"flip every bit of me";
        let bundle = encrypt(plaintext, &ALICE.public).unwrap();

        for byte in 0..bundle.ciphertext.len() {
            for bit in 0..8 {
                let mut tampered = bundle.clone();
                tampered.ciphertext[byte] ^= 1 << bit;
                assert!(matches!(
                    decrypt(&tampered, &ALICE.private),
                    Err(Error::Integrity)
                ));
            }
        }
    }

    #[test]
    fn test_nonce_and_tag_bit_flips_detected() {
        let bundle = encrypt(b"header fields", &ALICE.public).unwrap();

        for byte in 0..NONCE_SIZE {
            for bit in 0..8 {
                let mut tampered = bundle.clone();
                tampered.nonce[byte] ^= 1 << bit;
                assert!(matches!(
                    decrypt(&tampered, &ALICE.private),
                    Err(Error::Integrity)
                ));
            }
        }

        for byte in 0..TAG_SIZE {
            for bit in 0..8 {
                let mut tampered = bundle.clone();
                tampered.authentication_tag[byte] ^= 1 << bit;
                assert!(matches!(
                    decrypt(&tampered, &ALICE.private),
                    Err(Error::Integrity)
                ));
            }
        }
    }

    #[test]
    fn test_wrong_private_key_rejected() {
        let bundle = encrypt(b"for alice only", &ALICE.public).unwrap();

        let result = decrypt(&bundle, &BOB.private);
        assert!(matches!(result, Err(Error::KeyUnwrap | Error::Integrity)));
    }

    #[test]
    fn test_corrupted_wrapped_key_rejected() {
        let mut bundle = encrypt(b"payload", &ALICE.public).unwrap();
        bundle.wrapped_key[10] ^= 0xFF;
        assert!(matches!(
            decrypt(&bundle, &ALICE.private),
            Err(Error::KeyUnwrap)
        ));

        let mut truncated = encrypt(b"payload", &ALICE.public).unwrap();
        truncated.wrapped_key.truncate(100);
        assert!(matches!(
            decrypt(&truncated, &ALICE.private),
            Err(Error::KeyUnwrap)
        ));
    }

    #[test]
    fn test_wrapped_non_session_key_rejected() {
        // A correctly wrapped value of the wrong length is still an unwrap failure
        let mut bundle = encrypt(b"payload", &ALICE.public).unwrap();
        bundle.wrapped_key = ALICE
            .public
            .rsa()
            .encrypt(&mut OsRng, oaep(), &[7u8; 16])
            .unwrap();

        assert!(matches!(
            decrypt(&bundle, &ALICE.private),
            Err(Error::KeyUnwrap)
        ));
    }

    #[test]
    fn test_encrypt_for_pem() {
        let pem = ALICE.public.to_pem().unwrap();
        let bundle = encrypt_for_pem(b"via pem", &pem).unwrap();
        assert_eq!(decrypt(&bundle, &ALICE.private).unwrap(), b"via pem");

        assert!(matches!(
            encrypt_for_pem(b"x", "-----BEGIN PUBLIC KEY-----"),
            Err(Error::KeyFormat(_))
        ));
    }

    #[test]
    fn test_bundle_json_round_trip() {
        let bundle = encrypt(b"serialize me", &ALICE.public).unwrap();

        let json = bundle.to_json().unwrap();
        assert!(json.contains("\"wrapped_key\""));
        assert!(json.contains("\"tag\""));

        let restored = CiphertextBundle::from_json(&json).unwrap();
        assert_eq!(restored, bundle);
        assert_eq!(decrypt(&restored, &ALICE.private).unwrap(), b"serialize me");
    }

    #[test]
    fn test_bundle_json_rejects_short_nonce() {
        let bundle = encrypt(b"x", &ALICE.public).unwrap();
        let json = bundle
            .to_json()
            .unwrap()
            .replace(&hex::encode(bundle.nonce), "0011");

        assert!(matches!(
            CiphertextBundle::from_json(&json),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_error_messages_do_not_leak_plaintext() {
        let secret = b"TOP-SECRET-PAYLOAD";
        let mut bundle = encrypt(secret, &ALICE.public).unwrap();
        bundle.authentication_tag[0] ^= 1;

        let err = decrypt(&bundle, &ALICE.private).unwrap_err();
        assert!(!err.to_string().contains("TOP-SECRET"));
        assert!(!format!("{:?}", bundle).contains("TOP-SECRET"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn encrypt_decrypt_always_roundtrips(plaintext in proptest::collection::vec(any::<u8>(), 0..4096)) {
            let bundle = encrypt(&plaintext, &ALICE.public).unwrap();
            prop_assert_eq!(bundle.ciphertext.len(), plaintext.len());
            let recovered = decrypt(&bundle, &ALICE.private).unwrap();
            prop_assert_eq!(recovered, plaintext);
        }
    }
}
