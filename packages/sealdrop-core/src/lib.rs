//! # Sealdrop Core
//!
//! Hybrid file encryption and OTP signing for the Sealdrop document service.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SEALDROP CORE MODULES                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────────────────────┐   ┌──────────────────────────────┐   │
//! │  │          Vault               │   │            MFA               │   │
//! │  │                              │   │                              │   │
//! │  │ - Enroll recipients          │   │ - Issue OTP challenges       │   │
//! │  │ - Upload (encrypt + store)   │   │ - Check (one-time, expiry)   │   │
//! │  │ - Download (fetch + decrypt) │   │                              │   │
//! │  └──────────────┬───────────────┘   └──────────────┬───────────────┘   │
//! │                 │                                  │                   │
//! │                 └────────────────┬─────────────────┘                   │
//! │                                  │                                     │
//! │  ┌─────────────────────────────┐ │ ┌─────────────────────────────────┐ │
//! │  │          Crypto             │ │ │           Storage               │ │
//! │  │                             │◄┘►│                                 │ │
//! │  │ - RSA-OAEP key wrapping     │   │ - BlobStore (ciphertext)        │ │
//! │  │ - AES-256-GCM               │   │ - FileRecordStore (metadata)    │ │
//! │  │ - Ed25519 OTP signatures    │   │ - ChallengeStore (OTP)          │ │
//! │  └─────────────────────────────┘   └─────────────────────────────────┘ │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`config`] - Engine configuration (TOML)
//! - [`crypto`] - Key handling, hybrid encryption, OTP signatures
//! - [`storage`] - Collaborator traits and in-memory implementations
//! - [`vault`] - Encrypted file upload and download
//! - [`mfa`] - One-time passcode issuance and checking
//!
//! ## Security Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          SECURITY LAYERS                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Confidentiality: AES-256-GCM under a fresh key per file               │
//! │  ─────────────────────────────────────────────────────                  │
//! │  Only the holder of the recipient's RSA private key can unwrap the     │
//! │  session key. The service stores ciphertext and wrapped keys only.     │
//! │                                                                         │
//! │  Integrity: 128-bit GCM tag                                             │
//! │  ──────────────────────────                                             │
//! │  Any modification of ciphertext, nonce or tag fails decryption         │
//! │  before a single plaintext byte is released.                           │
//! │                                                                         │
//! │  Authentication: Ed25519-signed one-time passcodes                     │
//! │  ─────────────────────────────────────────────────                      │
//! │  Only signatures are persisted. A code answers its challenge once.     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use sealdrop_core::crypto::{decrypt, encrypt, generate_encryption_keypair};
//!
//! # fn main() -> sealdrop_core::Result<()> {
//! let pair = generate_encryption_keypair(2048)?;
//! let bundle = encrypt(b"hello", &pair.public)?;
//! assert_eq!(decrypt(&bundle, &pair.private)?, b"hello");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod config;
pub mod crypto;
pub mod error;
pub mod mfa;
pub mod storage;
pub mod vault;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use config::{EngineConfig, OtpConfig};
pub use crypto::{CiphertextBundle, OtpSignature, PrivateKey, PublicKey, SigningKeyPair, VerifyKey};
pub use error::{Error, Result};
pub use mfa::{IssuedOtp, OtpAuthenticator, OtpCode};
pub use storage::{BlobStore, ChallengeStore, FileRecord, FileRecordStore, OtpChallenge};
pub use vault::{FileVault, RecipientKeys};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of Sealdrop Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================================
// TESTS
// ============================================================================
