//! # Cryptography Module
//!
//! All cryptographic primitives used by Sealdrop Core.
//!
//! ## Security Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 FILE ENCRYPTION (hybrid)                        │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  1. Session key: 256 bits from OsRng, one per file             │   │
//! │  │                                                                 │   │
//! │  │  2. Bulk encryption: AES-256-GCM                               │   │
//! │  │     • 96-bit nonce (random per file)                           │   │
//! │  │     • 128-bit authentication tag (detached)                    │   │
//! │  │                                                                 │   │
//! │  │  3. Key wrapping: RSA-OAEP                                     │   │
//! │  │     • SHA-256 label hash, MGF1-SHA-256                         │   │
//! │  │     • 2048-bit recipient keys by default                       │   │
//! │  │                                                                 │   │
//! │  │  Bundle = { ciphertext, nonce, tag, wrapped_key }              │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 OTP AUTHENTICATION                              │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  Signature over SHA-256(otp_code) with Ed25519                 │   │
//! │  │                                                                 │   │
//! │  │  • Signature size: 64 bytes                                    │   │
//! │  │  • Public key size: 32 bytes                                   │   │
//! │  │  • Verification returns bool; tamper is never an error         │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm Choices & Rationale
//!
//! | Algorithm | Purpose | Why Chosen |
//! |-----------|---------|------------|
//! | AES-256-GCM | Bulk encryption | Hardware acceleration, AEAD |
//! | RSA-OAEP-SHA256 | Key wrapping | PEM keys interoperate with existing clients |
//! | Ed25519 | OTP signatures | Deterministic, compact, constant-time |
//! | SHA-256 | OTP digest | Fixed-size input to the signer |
//!
//! ## Security Considerations
//!
//! 1. **Key Zeroization**: Session keys, RSA private keys and signing keys are zeroized on drop
//! 2. **Blinded RSA**: Unwrapping uses a blinded private-key operation
//! 3. **Secure Random**: `rand::rngs::OsRng` for every key and nonce
//! 4. **No Key Reuse**: One session key and one nonce per file
//!
//! Every function here is synchronous, pure over its inputs (aside from the
//! RNG), and safe to call from many threads at once.

mod encryption;
mod hybrid;
mod keys;
mod signing;

pub use encryption::{
    open, seal, Nonce, Sealed, SessionKey, KEY_SIZE, MAX_PLAINTEXT_LEN, NONCE_SIZE, TAG_SIZE,
};
pub use hybrid::{decrypt, encrypt, encrypt_for_pem, CiphertextBundle};
pub use keys::{
    export_private, export_public, generate_encryption_keypair, import_private, import_public,
    AsymmetricKeyPair, PrivateKey, PublicKey, DEFAULT_RSA_BITS, SUPPORTED_RSA_BITS,
};
pub use signing::{
    sign_otp, verify_otp, verify_otp_pem, OtpSignature, SigningKeyPair, VerifyKey,
    SIGNATURE_SIZE,
};

#[cfg(test)]
pub(crate) use keys::tests as fixtures;
