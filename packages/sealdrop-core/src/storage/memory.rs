//! In-memory collaborators.
//!
//! All three stores are `parking_lot::RwLock` maps. Locks are never held
//! across an `.await`.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{BlobStore, ChallengeStore, FileRecord, FileRecordStore, OtpChallenge};
use crate::error::{Error, Result};

const LOCATOR_SCHEME: &str = "mem://";

/// Blob store keyed by `mem://<bucket>/<path>` locators
pub struct MemoryBlobStore {
    bucket: String,
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Create an empty store for `bucket`
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored blobs
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    fn locator_for(&self, path: &str) -> String {
        format!("{}{}/{}", LOCATOR_SCHEME, self.bucket, path)
    }

    fn check_locator(&self, locator: &str) -> Result<()> {
        let prefix = format!("{}{}/", LOCATOR_SCHEME, self.bucket);
        if locator.starts_with(&prefix) {
            Ok(())
        } else {
            Err(Error::StorageRead(format!(
                "Locator {} does not belong to bucket {}",
                locator, self.bucket
            )))
        }
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new("sealdrop")
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, path: &str, ciphertext: Vec<u8>) -> Result<String> {
        if path.is_empty() {
            return Err(Error::StorageWrite("Empty blob path".into()));
        }
        let locator = self.locator_for(path);
        self.blobs.write().insert(locator.clone(), ciphertext);
        Ok(locator)
    }

    async fn get(&self, locator: &str) -> Result<Vec<u8>> {
        self.check_locator(locator)?;
        self.blobs
            .read()
            .get(locator)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Blob {}", locator)))
    }

    async fn delete(&self, locator: &str) -> Result<()> {
        self.check_locator(locator)?;
        self.blobs
            .write()
            .remove(locator)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("Blob {}", locator)))
    }
}

/// File record store
#[derive(Default)]
pub struct MemoryFileRecordStore {
    records: RwLock<HashMap<Uuid, FileRecord>>,
}

impl MemoryFileRecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FileRecordStore for MemoryFileRecordStore {
    async fn insert(&self, record: FileRecord) -> Result<()> {
        let mut records = self.records.write();
        if records.contains_key(&record.id) {
            return Err(Error::StorageWrite(format!(
                "Record {} already exists",
                record.id
            )));
        }
        records.insert(record.id, record);
        Ok(())
    }

    async fn get(&self, id: &Uuid) -> Result<Option<FileRecord>> {
        Ok(self.records.read().get(id).cloned())
    }

    async fn list_for_owner(&self, owner: &str) -> Result<Vec<FileRecord>> {
        let mut owned: Vec<FileRecord> = self
            .records
            .read()
            .values()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect();
        owned.sort_by_key(|r| r.created_at);
        Ok(owned)
    }

    async fn delete(&self, id: &Uuid) -> Result<bool> {
        Ok(self.records.write().remove(id).is_some())
    }
}

/// Challenge store holding at most one challenge per user
///
/// A newer challenge replaces the pending one, so repeated issuance never
/// grows the map beyond one entry per user.
#[derive(Default)]
pub struct MemoryChallengeStore {
    challenges: RwLock<HashMap<String, OtpChallenge>>,
}

impl MemoryChallengeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Outstanding challenges for `user_id` (0 or 1)
    pub fn pending_for(&self, user_id: &str) -> usize {
        usize::from(self.challenges.read().contains_key(user_id))
    }

    /// Number of users with a pending challenge
    pub fn len(&self) -> usize {
        self.challenges.read().len()
    }

    /// Whether no challenge is pending
    pub fn is_empty(&self) -> bool {
        self.challenges.read().is_empty()
    }
}

#[async_trait]
impl ChallengeStore for MemoryChallengeStore {
    async fn put(&self, challenge: OtpChallenge) -> Result<()> {
        let mut challenges = self.challenges.write();
        match challenges.get(&challenge.user_id) {
            // An out-of-order older challenge never displaces a newer one
            Some(pending) if pending.issued_at > challenge.issued_at => {}
            _ => {
                challenges.insert(challenge.user_id.clone(), challenge);
            }
        }
        Ok(())
    }

    async fn take_latest(&self, user_id: &str) -> Result<Option<OtpChallenge>> {
        Ok(self.challenges.write().remove(user_id))
    }
}
