//! # Storage Module
//!
//! Collaborator interfaces the vault and MFA services persist through.
//!
//! ## Storage Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         STORAGE SYSTEM                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  BlobStore (ciphertext only)                                    │   │
//! │  │  ───────────────────────────                                     │   │
//! │  │                                                                 │   │
//! │  │  put(path, bytes) ──► locator   e.g. mem://files/alice/<id>.bin │   │
//! │  │  get(locator), delete(locator)                                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  FileRecordStore (metadata)                                     │   │
//! │  │  ──────────────────────────                                      │   │
//! │  │                                                                 │   │
//! │  │  id, owner, filename, locator, wrapped_key, nonce, tag, size    │   │
//! │  │  Never: plaintext, session key, private key                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  ChallengeStore (OTP)                                           │   │
//! │  │  ────────────────────                                            │   │
//! │  │                                                                 │   │
//! │  │  Signed OTP challenges, consumed on first take                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Production deployments plug in object storage and a document database
//! behind these traits. The [`memory`] implementations back tests, the demos
//! and single-process use.

pub mod memory;

pub use memory::{MemoryBlobStore, MemoryChallengeStore, MemoryFileRecordStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::{CiphertextBundle, OtpSignature, NONCE_SIZE, TAG_SIZE};
use crate::error::Result;

// ============================================================================
// RECORDS
// ============================================================================

/// Metadata for one encrypted file
///
/// Everything needed to rebuild a [`CiphertextBundle`] except the ciphertext,
/// which lives in the blob store under `locator`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Unique file ID
    pub id: Uuid,
    /// Owning user
    pub owner: String,
    /// Original filename as supplied at upload
    pub filename: String,
    /// Blob path, `<owner>/<id>.bin`
    pub storage_path: String,
    /// Locator returned by the blob store
    pub locator: String,
    /// Session key wrapped under the recipient's public key
    pub wrapped_key: Vec<u8>,
    /// AES-GCM nonce
    pub nonce: [u8; NONCE_SIZE],
    /// AES-GCM authentication tag
    pub tag: [u8; TAG_SIZE],
    /// Plaintext size in bytes
    pub size: u64,
    /// Upload time
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    /// Blob path for a file owned by `owner`
    pub fn storage_path_for(owner: &str, id: &Uuid) -> String {
        format!("{}/{}.bin", owner, id)
    }

    /// Reassemble the bundle from this record and its ciphertext
    pub fn to_bundle(&self, ciphertext: Vec<u8>) -> CiphertextBundle {
        CiphertextBundle {
            ciphertext,
            nonce: self.nonce,
            authentication_tag: self.tag,
            wrapped_key: self.wrapped_key.clone(),
        }
    }
}

/// A signed one-time passcode waiting to be answered
///
/// Only the signature is kept; the code itself goes to the user out of band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpChallenge {
    /// Challenge ID
    pub id: Uuid,
    /// User the code was issued to
    pub user_id: String,
    /// Signature over the issued code
    pub signature: OtpSignature,
    /// Issue time
    pub issued_at: DateTime<Utc>,
    /// After this instant the challenge no longer verifies
    pub expires_at: DateTime<Utc>,
}

impl OtpChallenge {
    /// Whether the challenge has expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

// ============================================================================
// TRAITS
// ============================================================================

/// Object storage for ciphertext blobs
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `ciphertext` at `path`, returning a locator for later retrieval
    async fn put(&self, path: &str, ciphertext: Vec<u8>) -> Result<String>;

    /// Fetch the bytes behind `locator`
    async fn get(&self, locator: &str) -> Result<Vec<u8>>;

    /// Delete the blob behind `locator`
    async fn delete(&self, locator: &str) -> Result<()>;
}

/// Persistence for [`FileRecord`]s
#[async_trait]
pub trait FileRecordStore: Send + Sync {
    /// Insert a new record
    async fn insert(&self, record: FileRecord) -> Result<()>;

    /// Look up a record by ID
    async fn get(&self, id: &Uuid) -> Result<Option<FileRecord>>;

    /// All records for `owner`, oldest first
    async fn list_for_owner(&self, owner: &str) -> Result<Vec<FileRecord>>;

    /// Delete a record; returns whether it existed
    async fn delete(&self, id: &Uuid) -> Result<bool>;
}

/// Persistence for [`OtpChallenge`]s
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Store a challenge
    ///
    /// A store may keep only the newest challenge per user; an older one
    /// is never answerable once a newer one exists.
    async fn put(&self, challenge: OtpChallenge) -> Result<()>;

    /// Remove and return the most recent challenge for `user_id`
    ///
    /// Any older challenges for the same user are discarded too, so a code
    /// can be answered at most once.
    async fn take_latest(&self, user_id: &str) -> Result<Option<OtpChallenge>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_storage_path() {
        let id = Uuid::nil();
        assert_eq!(
            FileRecord::storage_path_for("alice", &id),
            "alice/00000000-0000-0000-0000-000000000000.bin"
        );
    }

    #[test]
    fn test_challenge_expiry_boundary() {
        let issued_at = Utc::now();
        let challenge = OtpChallenge {
            id: Uuid::new_v4(),
            user_id: "alice".into(),
            signature: OtpSignature::from_bytes(vec![0u8; 64]),
            issued_at,
            expires_at: issued_at + Duration::seconds(300),
        };

        assert!(!challenge.is_expired_at(issued_at));
        assert!(!challenge.is_expired_at(issued_at + Duration::seconds(299)));
        assert!(challenge.is_expired_at(issued_at + Duration::seconds(300)));
    }
}
