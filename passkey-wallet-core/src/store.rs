//! Durable device-local storage for the credential-to-account mapping.
//!
//! The store holds at most one record of interest: the credential created on
//! this device and the account address derived from it. It is written once at
//! wallet creation, read on every authentication, and cleared only by an
//! explicit "forget device" action.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the credential record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O operation failed.
    #[error("store_io: {context}: {source}")]
    Io {
        /// Context describing the operation.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// (De)serialization of the record failed.
    #[error("store_serialization: {0}")]
    Serialization(String),
    /// A record for this credential already exists with a different address.
    ///
    /// The account address is immutable once written; disagreement is an
    /// integrity violation, never resolved by overwriting.
    #[error("store_conflict: credential {credential_id} is already bound to a different address")]
    Conflict {
        /// The credential whose record was refused.
        credential_id: String,
    },
    /// The in-memory store's lock was poisoned.
    #[error("store_lock: {0}")]
    Lock(String),
}

/// The only information persisted across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentialRecord {
    /// String identifier of the platform credential.
    pub credential_id: String,
    /// Opaque user identifier minted at wallet creation.
    pub user_id: String,
    /// Account address derived at creation. Immutable once written.
    pub account_address: String,
    /// Unix seconds at which the wallet was created.
    pub created_at: u64,
}

/// Device-local persistence for the single credential record.
///
/// Operations are invoked strictly sequentially by the orchestrator; no
/// concurrency control beyond interior mutability is required.
pub trait CredentialStore: Send + Sync {
    /// Persists the record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if a record with the same credential
    /// id but a different account address already exists, or an I/O error if
    /// the write fails.
    fn save(&self, record: &StoredCredentialRecord) -> Result<(), StoreError>;

    /// Loads the record, if one was ever saved on this device.
    ///
    /// Absence means "no wallet previously created here", not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the read or deserialization fails.
    fn load(&self) -> Result<Option<StoredCredentialRecord>, StoreError>;

    /// Removes the record ("forget device").
    ///
    /// # Errors
    ///
    /// Returns an error if the removal fails.
    fn clear(&self) -> Result<(), StoreError>;
}

fn check_conflict(
    existing: Option<&StoredCredentialRecord>,
    incoming: &StoredCredentialRecord,
) -> Result<(), StoreError> {
    if let Some(existing) = existing {
        if existing.credential_id == incoming.credential_id
            && existing.account_address != incoming.account_address
        {
            return Err(StoreError::Conflict {
                credential_id: incoming.credential_id.clone(),
            });
        }
    }
    Ok(())
}

/// File-backed store: one JSON document, written atomically.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Creates a store backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, record: &StoredCredentialRecord) -> Result<(), StoreError> {
        check_conflict(self.load()?.as_ref(), record)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                context: format!("creating {}", parent.display()),
                source,
            })?;
        }

        let json = serde_json::to_vec_pretty(record)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;

        // Write-then-rename so a crash never leaves a torn record behind.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| StoreError::Io {
            context: format!("writing {}", tmp.display()),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Io {
            context: format!("renaming into {}", self.path.display()),
            source,
        })
    }

    fn load(&self) -> Result<Option<StoredCredentialRecord>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    context: format!("reading {}", self.path.display()),
                    source,
                })
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|err| StoreError::Serialization(err.to_string()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                context: format!("removing {}", self.path.display()),
                source,
            }),
        }
    }
}

/// In-memory store used by tests and short-lived embeddings.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    record: Mutex<Option<StoredCredentialRecord>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with a record.
    #[must_use]
    pub fn with_record(record: StoredCredentialRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, record: &StoredCredentialRecord) -> Result<(), StoreError> {
        let mut guard = self
            .record
            .lock()
            .map_err(|_| StoreError::Lock("record mutex poisoned".to_string()))?;
        check_conflict(guard.as_ref(), record)?;
        *guard = Some(record.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<StoredCredentialRecord>, StoreError> {
        self.record
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| StoreError::Lock("record mutex poisoned".to_string()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.record
            .lock()
            .map(|mut guard| *guard = None)
            .map_err(|_| StoreError::Lock("record mutex poisoned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(credential_id: &str, address: &str) -> StoredCredentialRecord {
        StoredCredentialRecord {
            credential_id: credential_id.to_string(),
            user_id: "dXNlci1oYW5kbGU".to_string(),
            account_address: address.to_string(),
            created_at: 1_754_000_000,
        }
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credential.json"));

        assert!(store.load().unwrap().is_none());
        let rec = record("cred-1", "aa".repeat(32).as_str());
        store.save(&rec).unwrap();
        assert_eq!(store.load().unwrap(), Some(rec));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // Clearing an already-empty store is not an error.
        store.clear().unwrap();
    }

    #[test]
    fn file_store_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            FileCredentialStore::new(dir.path().join("nested/deeper/credential.json"));
        store.save(&record("cred-1", "ab")).unwrap();
        assert!(store.load().unwrap().is_some());
    }

    #[test]
    fn save_refuses_conflicting_address_for_same_credential() {
        let store = MemoryCredentialStore::new();
        store.save(&record("cred-1", "addr-a")).unwrap();

        let err = store.save(&record("cred-1", "addr-b")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        // The original record is untouched.
        assert_eq!(
            store.load().unwrap().unwrap().account_address,
            "addr-a".to_string()
        );
    }

    #[test]
    fn save_allows_identical_rewrite_and_new_credential() {
        let store = MemoryCredentialStore::new();
        store.save(&record("cred-1", "addr-a")).unwrap();
        store.save(&record("cred-1", "addr-a")).unwrap();
        store.save(&record("cred-2", "addr-b")).unwrap();
        assert_eq!(store.load().unwrap().unwrap().credential_id, "cred-2");
    }

    #[test]
    fn memory_store_seeding() {
        let store = MemoryCredentialStore::with_record(record("cred-9", "addr-z"));
        assert_eq!(store.load().unwrap().unwrap().credential_id, "cred-9");
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
