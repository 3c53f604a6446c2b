//! StateStore: redb-backed persistence for dnsha.
//!
//! Values are JSON-serialized into redb's `&[u8]` value columns. The store
//! supports both on-disk and in-memory backends (the latter for testing
//! and as a last-resort fallback when the disk is unusable).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::{Database, DatabaseError, ReadableDatabase, ReadableTable, StorageError};
use tracing::{debug, warn};

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    ///
    /// Fails with [`StateError::Locked`] while another handle holds the file,
    /// and with [`StateError::Corrupt`] when the file is not a readable
    /// redb database.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(|e| open_error(path, e))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Open the store, moving aside a file redb cannot read.
    ///
    /// The parent directory is created if needed. Only a corrupt file is
    /// renamed to `<path>.corrupt` and replaced by a fresh store; any other
    /// failure (locked, I/O, format upgrade, not a file) is returned and
    /// the path is left untouched.
    pub fn open_or_recover(path: &Path) -> StateResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(map_err!(Open))?;
        }

        match Self::open(path) {
            Ok(store) => Ok(store),
            Err(e @ StateError::Corrupt(_)) if path.is_file() => {
                let quarantine = quarantine_path(path);
                warn!(?path, ?quarantine, error = %e, "state store unreadable, quarantining");
                std::fs::rename(path, &quarantine).map_err(map_err!(Quarantine))?;
                Self::open(path)
            }
            Err(e) => Err(e),
        }
    }

    /// Create an ephemeral in-memory state store.
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(FAILURE_COUNTERS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Failure counters ───────────────────────────────────────────

    /// Insert or update a node's failure counter.
    pub fn put_counter(&self, node: &str, counter: &FailureCounter) -> StateResult<()> {
        let value = serde_json::to_vec(counter).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(FAILURE_COUNTERS).map_err(map_err!(Table))?;
            table
                .insert(node, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%node, count = counter.count, "failure counter stored");
        Ok(())
    }

    /// Get a node's failure counter.
    pub fn get_counter(&self, node: &str) -> StateResult<Option<FailureCounter>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(FAILURE_COUNTERS).map_err(map_err!(Table))?;
        match table.get(node).map_err(map_err!(Read))? {
            Some(guard) => {
                let counter: FailureCounter =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(counter))
            }
            None => Ok(None),
        }
    }

    /// List every stored counter. Unreadable records are skipped.
    pub fn list_counters(&self) -> StateResult<Vec<(String, FailureCounter)>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(FAILURE_COUNTERS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            match serde_json::from_slice::<FailureCounter>(value.value()) {
                Ok(counter) => results.push((key.value().to_string(), counter)),
                Err(e) => warn!(node = %key.value(), error = %e, "skipping unreadable counter"),
            }
        }
        Ok(results)
    }

    /// Delete a node's counter. Returns true if it existed.
    pub fn delete_counter(&self, node: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(FAILURE_COUNTERS).map_err(map_err!(Table))?;
            existed = table.remove(node).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%node, existed, "failure counter deleted");
        Ok(existed)
    }

    #[cfg(test)]
    pub(crate) fn put_raw(&self, node: &str, bytes: &[u8]) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(FAILURE_COUNTERS).map_err(map_err!(Table))?;
            table.insert(node, bytes).map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }
}

fn open_error(path: &Path, e: DatabaseError) -> StateError {
    match e {
        DatabaseError::DatabaseAlreadyOpen => StateError::Locked(path.display().to_string()),
        DatabaseError::Storage(StorageError::Corrupted(msg)) => StateError::Corrupt(msg),
        DatabaseError::Storage(StorageError::Io(io))
            if matches!(
                io.kind(),
                std::io::ErrorKind::InvalidData | std::io::ErrorKind::UnexpectedEof
            ) =>
        {
            StateError::Corrupt(io.to_string())
        }
        other => StateError::Open(other.to_string()),
    }
}

fn quarantine_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".corrupt");
    PathBuf::from(name)
}
