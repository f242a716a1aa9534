//! # Error Handling
//!
//! Error types for Sealdrop Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Key Errors (100-199)                                              │
//! │  │   ├── KeyFormat             - Malformed / unsupported key material  │
//! │  │   └── InvalidKey            - Wrong key type or size for operation  │
//! │  │                                                                      │
//! │  ├── Cipher Errors (200-299)                                           │
//! │  │   ├── Integrity             - AEAD tag mismatch                     │
//! │  │   ├── KeyUnwrap             - RSA-OAEP unwrap failed                │
//! │  │   ├── PlaintextTooLarge     - Exceeds AES-GCM hard bound            │
//! │  │   ├── EncryptionFailed      - Cipher backend refused input          │
//! │  │   └── RngFailed             - OS randomness unavailable             │
//! │  │                                                                      │
//! │  ├── Config Errors (300-349)                                           │
//! │  │   └── Config                - Invalid engine configuration          │
//! │  │                                                                      │
//! │  ├── Input Errors (350-399)                                            │
//! │  │   └── InvalidInput          - Caller-supplied name or ID rejected   │
//! │  │                                                                      │
//! │  ├── Collaborator Errors (400-499)                                     │
//! │  │   ├── StorageRead           - Blob/record store read failed         │
//! │  │   ├── StorageWrite          - Blob/record store write failed        │
//! │  │   └── NotFound              - Record or blob does not exist         │
//! │  │                                                                      │
//! │  └── Internal Errors (900-999)                                         │
//! │      ├── Serialization         - Bundle / config encoding failed       │
//! │      └── Internal              - Blocking task panicked or cancelled   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Non-leaking failures
//!
//! `Integrity` and `KeyUnwrap` carry fixed messages. They never include
//! key bytes, plaintext, or the underlying backend error, so a caller
//! cannot learn more than the error kind itself.
//!
//! Signature verification of OTPs is not an error at all: a tampered or
//! mismatched signature yields `false` (see [`crate::crypto::verify_otp`]).

use thiserror::Error;

/// Result type alias for Sealdrop Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Sealdrop Core
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Key Errors (100-199)
    // ========================================================================

    /// Key material could not be parsed, or has an unsupported algorithm/size
    #[error("Invalid key format: {0}")]
    KeyFormat(String),

    /// Key is well-formed but not usable for the requested operation
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    // ========================================================================
    // Cipher Errors (200-299)
    // ========================================================================

    /// Authentication tag did not verify (tampered bundle or wrong session key)
    #[error("Integrity check failed: ciphertext could not be authenticated")]
    Integrity,

    /// The wrapped session key could not be recovered
    #[error("Key unwrap failed: wrapped key does not match this private key")]
    KeyUnwrap,

    /// Plaintext exceeds what a single AES-GCM invocation can process
    #[error("Plaintext too large: {len} bytes exceeds limit of {max} bytes")]
    PlaintextTooLarge {
        /// Size of the rejected input
        len: u64,
        /// Largest accepted size
        max: u64,
    },

    /// Encryption failed in the cipher backend
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Random number generation failed
    #[error("Random number generation failed")]
    RngFailed,

    // ========================================================================
    // Config Errors (300-399)
    // ========================================================================

    /// Engine configuration is invalid
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Caller-supplied argument (owner, user ID) is not acceptable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // Collaborator Errors (400-499)
    // ========================================================================

    /// Failed to read from a storage collaborator
    #[error("Failed to read from storage: {0}")]
    StorageRead(String),

    /// Failed to write to a storage collaborator
    #[error("Failed to write to storage: {0}")]
    StorageWrite(String),

    /// Item not found in storage
    #[error("Item not found: {0}")]
    NotFound(String),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the stable numeric error code
    ///
    /// Error codes are organized by category:
    /// - 100-199: Keys
    /// - 200-299: Ciphers
    /// - 300-399: Configuration and caller input
    /// - 400-499: Storage collaborators
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            // Keys (100-199)
            Error::KeyFormat(_) => 100,
            Error::InvalidKey(_) => 101,

            // Ciphers (200-299)
            Error::Integrity => 200,
            Error::KeyUnwrap => 201,
            Error::PlaintextTooLarge { .. } => 202,
            Error::EncryptionFailed(_) => 203,
            Error::RngFailed => 204,

            // Configuration (300-399)
            Error::Config(_) => 300,
            Error::InvalidInput(_) => 350,

            // Storage (400-499)
            Error::StorageRead(_) => 400,
            Error::StorageWrite(_) => 401,
            Error::NotFound(_) => 402,

            // Internal (900-999)
            Error::Serialization(_) => 900,
            Error::Internal(_) => 901,
        }
    }

    /// Check if the operation may succeed when retried with the same inputs
    ///
    /// Cryptographic failures are terminal: the same bundle and key will fail
    /// the same way every time. Only collaborator I/O is worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::StorageRead(_) | Error::StorageWrite(_))
    }

    /// Check if this error originated in the cryptographic core
    pub fn is_crypto(&self) -> bool {
        (100..300).contains(&self.code())
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Internal(format!("blocking task failed: {}", err))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::KeyFormat("test".into()).code(), 100);
        assert_eq!(Error::InvalidKey("test".into()).code(), 101);
        assert_eq!(Error::Integrity.code(), 200);
        assert_eq!(Error::KeyUnwrap.code(), 201);
        assert_eq!(Error::Config("test".into()).code(), 300);
        assert_eq!(Error::InvalidInput("test".into()).code(), 350);
        assert_eq!(Error::NotFound("test".into()).code(), 402);
        assert_eq!(Error::Internal("test".into()).code(), 901);
    }

    #[test]
    fn test_crypto_errors_are_terminal() {
        assert!(!Error::Integrity.is_retryable());
        assert!(!Error::KeyUnwrap.is_retryable());
        assert!(!Error::KeyFormat("pem".into()).is_retryable());
        assert!(Error::StorageWrite("bucket offline".into()).is_retryable());
    }

    #[test]
    fn test_is_crypto() {
        assert!(Error::Integrity.is_crypto());
        assert!(Error::KeyFormat("x".into()).is_crypto());
        assert!(!Error::NotFound("x".into()).is_crypto());
    }

    #[test]
    fn test_fixed_messages_do_not_echo_details() {
        assert_eq!(
            Error::Integrity.to_string(),
            "Integrity check failed: ciphertext could not be authenticated"
        );
        assert_eq!(
            Error::KeyUnwrap.to_string(),
            "Key unwrap failed: wrapped key does not match this private key"
        );
    }

    #[test]
    fn test_plaintext_too_large_message() {
        let err = Error::PlaintextTooLarge { len: 10, max: 5 };
        assert!(err.to_string().contains("10 bytes"));
        assert_eq!(err.code(), 202);
    }
}
