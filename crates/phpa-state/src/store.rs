//! StateStore — redb-backed model persistence.
//!
//! Values are JSON-serialized [`StoredModel`] records in redb's `&[u8]`
//! value column. The store supports both on-disk and in-memory backends
//! (the latter for testing).

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use redb::{Database, DatabaseError, ReadableDatabase, ReadableTable, StorageError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{StateError, StateResult};
use crate::tables::MODELS;
use crate::types::StoredModel;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe model store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent store at the given path.
    ///
    /// Fails with [`StateError::Busy`] while another process holds the file.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(|e| match e {
            DatabaseError::DatabaseAlreadyOpen => StateError::Busy(path.display().to_string()),
            DatabaseError::Storage(StorageError::Corrupted(msg)) => StateError::Corrupt(msg),
            other => StateError::Open(other.to_string()),
        })?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "model store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory model store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        txn.open_table(MODELS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Load the model stored under `key`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> StateResult<StoredModel<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(MODELS).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => decode(key, guard.value()),
            None => Err(StateError::ModelNotFound(key.to_string())),
        }
    }

    /// Store `model` under `key`, replacing whatever was there.
    ///
    /// Returns the new version.
    pub fn save<T: Serialize>(&self, key: &str, model: &T) -> StateResult<u64> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let version = {
            let mut table = txn.open_table(MODELS).map_err(map_err!(Table))?;
            let current = match table.get(key).map_err(map_err!(Read))? {
                Some(guard) => stored_version(key, guard.value()).unwrap_or_else(|e| {
                    warn!(%key, error = %e, "replacing undecodable model");
                    0
                }),
                None => 0,
            };
            let stored = StoredModel {
                version: current + 1,
                updated_at: epoch_secs(),
                model,
            };
            let value = serde_json::to_vec(&stored).map_err(map_err!(Serialize))?;
            table
                .insert(key, value.as_slice())
                .map_err(map_err!(Write))?;
            stored.version
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, version, "model stored");
        Ok(version)
    }

    /// Load, modify, and persist the model under `key` as one exclusive,
    /// atomic transaction.
    ///
    /// `f` runs while the write transaction is held. If it fails, nothing
    /// is written. Returns `f`'s output and the new version.
    pub fn update<T, R, E, F>(&self, key: &str, f: F) -> Result<(R, u64), E>
    where
        T: Serialize + DeserializeOwned,
        E: From<StateError>,
        F: FnOnce(&mut T) -> Result<R, E>,
    {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let (output, version) = {
            let mut table = txn.open_table(MODELS).map_err(map_err!(Table))?;
            let bytes = table
                .get(key)
                .map_err(map_err!(Read))?
                .map(|guard| guard.value().to_vec())
                .ok_or_else(|| StateError::ModelNotFound(key.to_string()))?;
            let mut stored: StoredModel<T> = decode(key, &bytes)?;

            let output = f(&mut stored.model)?;

            stored.version += 1;
            stored.updated_at = epoch_secs();
            let value = serde_json::to_vec(&stored).map_err(map_err!(Serialize))?;
            table
                .insert(key, value.as_slice())
                .map_err(map_err!(Write))?;
            (output, stored.version)
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%key, version, "model updated");
        Ok((output, version))
    }
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> StateResult<StoredModel<T>> {
    serde_json::from_slice(bytes).map_err(|e| StateError::Corrupt(format!("{key}: {e}")))
}

/// Version of a stored record without decoding its model.
fn stored_version(key: &str, bytes: &[u8]) -> StateResult<u64> {
    decode::<serde_json::Value>(key, bytes).map(|stored| stored.version)
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
