//! # File Vault
//!
//! Upload and download of encrypted files through the storage collaborators.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           UPLOAD FLOW                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  bytes + recipient public PEM                                           │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────┐   blocking pool                                   │
//! │  │ hybrid encrypt   │   (RSA wrap + AES-GCM)                            │
//! │  └────────┬─────────┘                                                   │
//! │           │                                                             │
//! │     ┌─────┴──────────────────────┐                                      │
//! │     ▼                            ▼                                      │
//! │  BlobStore                  FileRecordStore                             │
//! │  <owner>/<id>.bin           wrapped_key, nonce, tag, size               │
//! │  (ciphertext)               (no plaintext, no session key)              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Private keys never enter the vault except as a borrowed argument to
//! [`FileVault::download`]. Enrollment hands both PEMs back to the caller
//! and keeps nothing.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::config::EngineConfig;
use crate::crypto::{self, AsymmetricKeyPair, PrivateKey};
use crate::error::{Error, Result};
use crate::storage::{BlobStore, FileRecord, FileRecordStore};

/// Key material produced by [`FileVault::enroll_recipient`]
pub struct RecipientKeys {
    /// SPKI PEM, safe to publish
    pub public_pem: String,
    /// PKCS#8 PEM, returned exactly once; zeroized on drop
    pub private_pem: Zeroizing<String>,
}

impl fmt::Debug for RecipientKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecipientKeys")
            .field("public_pem", &self.public_pem)
            .field("private_pem", &"<redacted>")
            .finish()
    }
}

/// Owners become the first blob path segment, so they must be a single
/// plain segment.
fn validate_owner(owner: &str) -> Result<()> {
    if owner.trim().is_empty() {
        return Err(Error::InvalidInput("Owner must not be empty".into()));
    }
    if owner.contains(|c| c == '/' || c == '\\') || owner == "." || owner.contains("..") {
        return Err(Error::InvalidInput(format!(
            "Owner {:?} must not contain path separators or '..'",
            owner
        )));
    }
    if owner.chars().any(char::is_control) {
        return Err(Error::InvalidInput("Owner must not contain control characters".into()));
    }
    Ok(())
}

/// Run CPU-heavy crypto off the async executor
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Encrypted file storage for many owners
pub struct FileVault<B, R> {
    blobs: Arc<B>,
    records: Arc<R>,
    config: EngineConfig,
}

impl<B: BlobStore, R: FileRecordStore> FileVault<B, R> {
    /// Create a vault over the given collaborators
    ///
    /// Fails with [`Error::Config`] if `config` does not validate.
    pub fn new(blobs: Arc<B>, records: Arc<R>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            blobs,
            records,
            config,
        })
    }

    /// The active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generate a recipient key pair of the configured size
    pub async fn enroll_recipient(&self) -> Result<RecipientKeys> {
        let bits = self.config.rsa_key_bits;
        let pair = blocking(move || AsymmetricKeyPair::generate(bits)).await?;

        let keys = RecipientKeys {
            public_pem: crypto::export_public(&pair.public)?,
            private_pem: crypto::export_private(&pair.private)?,
        };

        tracing::info!(bits, "Enrolled recipient");
        Ok(keys)
    }

    /// Encrypt `bytes` for the holder of `recipient_public_pem` and store it
    ///
    /// ## Errors
    ///
    /// - [`Error::InvalidInput`] for an empty owner or one that is not a
    ///   single path segment
    /// - [`Error::PlaintextTooLarge`] above `max_upload_bytes`
    /// - [`Error::KeyFormat`] if the recipient PEM does not parse
    /// - storage errors from either collaborator
    pub async fn upload(
        &self,
        owner: &str,
        filename: &str,
        bytes: Vec<u8>,
        recipient_public_pem: &str,
    ) -> Result<FileRecord> {
        validate_owner(owner)?;

        let size = bytes.len() as u64;
        if size > self.config.max_upload_bytes {
            return Err(Error::PlaintextTooLarge {
                len: size,
                max: self.config.max_upload_bytes,
            });
        }

        let recipient = crypto::import_public(recipient_public_pem)?;
        let bundle = blocking(move || crypto::encrypt(&bytes, &recipient)).await?;

        let id = Uuid::new_v4();
        let storage_path = FileRecord::storage_path_for(owner, &id);
        let locator = self.blobs.put(&storage_path, bundle.ciphertext).await?;

        let record = FileRecord {
            id,
            owner: owner.to_string(),
            filename: filename.to_string(),
            storage_path,
            locator,
            wrapped_key: bundle.wrapped_key,
            nonce: bundle.nonce,
            tag: bundle.authentication_tag,
            size,
            created_at: Utc::now(),
        };

        if let Err(e) = self.records.insert(record.clone()).await {
            // Orphaned ciphertext is unreadable without the record; drop it.
            if let Err(cleanup) = self.blobs.delete(&record.locator).await {
                tracing::warn!(file_id = %id, error = %cleanup, "Failed to remove orphaned blob");
            }
            return Err(e);
        }

        tracing::info!(file_id = %id, owner, size, "Stored encrypted file");
        Ok(record)
    }

    /// Fetch and decrypt a file
    ///
    /// ## Errors
    ///
    /// - [`Error::NotFound`] for an unknown `file_id`
    /// - [`Error::KeyUnwrap`] or [`Error::Integrity`] if `recipient` is the
    ///   wrong key or the stored data was tampered with
    pub async fn download(&self, file_id: &Uuid, recipient: &PrivateKey) -> Result<Vec<u8>> {
        let record = self
            .records
            .get(file_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("File {}", file_id)))?;

        let ciphertext = self.blobs.get(&record.locator).await?;
        let bundle = record.to_bundle(ciphertext);
        let recipient = recipient.clone();

        let plaintext = blocking(move || crypto::decrypt(&bundle, &recipient)).await?;

        tracing::debug!(file_id = %file_id, size = plaintext.len(), "Decrypted file");
        Ok(plaintext)
    }

    /// Records owned by `owner`, oldest first
    pub async fn files_for(&self, owner: &str) -> Result<Vec<FileRecord>> {
        self.records.list_for_owner(owner).await
    }

    /// Delete a file's ciphertext and record
    ///
    /// A blob that is already gone does not block removal of the record.
    pub async fn remove(&self, file_id: &Uuid) -> Result<()> {
        let record = self
            .records
            .get(file_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("File {}", file_id)))?;

        match self.blobs.delete(&record.locator).await {
            Ok(()) => {}
            Err(Error::NotFound(_)) => {
                tracing::warn!(file_id = %file_id, "Blob already missing; removing record");
            }
            Err(e) => return Err(e),
        }
        self.records.delete(file_id).await?;

        tracing::info!(file_id = %file_id, owner = %record.owner, "Removed file");
        Ok(())
    }
}
