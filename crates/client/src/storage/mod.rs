//! Persistent key-value storage for session state.
//!
//! The session store survives restarts by mirroring the signed-in identity
//! into a small string-keyed store. Writes go through a [`WriteBatch`] so a
//! login or logout lands as one unit: no reader ever sees a token without an
//! email, or the other way round.
//!
//! # Backends
//!
//! - [`FileStore`] - JSON object on disk, replaced atomically on every commit
//! - [`MemoryStore`] - in-process map for tests and ephemeral sessions

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::collections::BTreeMap;

use thiserror::Error;

/// Errors raised by a [`KeyValueStore`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but is not a JSON object of strings.
    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// A previous writer panicked while holding the store lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// A single mutation inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Set { key: String, value: String },
    Remove { key: String },
}

/// An ordered set of mutations applied all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// An empty batch.
    #[must_use]
    pub const fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Queue a write of `value` under `key`.
    #[must_use]
    pub fn set(mut self, key: &str, value: impl Into<String>) -> Self {
        self.ops.push(WriteOp::Set {
            key: key.to_owned(),
            value: value.into(),
        });
        self
    }

    /// Queue removal of `key`. Removing a missing key is not an error.
    #[must_use]
    pub fn remove(mut self, key: &str) -> Self {
        self.ops.push(WriteOp::Remove {
            key: key.to_owned(),
        });
        self
    }

    /// The queued operations, in order.
    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Apply the batch to an in-memory map.
    pub(crate) fn apply_to(self, map: &mut BTreeMap<String, String>) {
        for op in self.ops {
            match op {
                WriteOp::Set { key, value } => {
                    map.insert(key, value);
                }
                WriteOp::Remove { key } => {
                    map.remove(&key);
                }
            }
        }
    }
}

/// String-keyed persistent storage.
///
/// Implementations must make [`commit`](Self::commit) atomic: after it
/// returns, either every operation in the batch is visible or none is.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Read every present key among `keys` from one consistent view.
    ///
    /// A commit from another handle or process lands either entirely before
    /// or entirely after the read. Missing keys are absent from the result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get_many(&self, keys: &[&str]) -> Result<BTreeMap<String, String>, StorageError>;

    /// Apply every operation in `batch` as one unit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written; nothing from
    /// the batch is applied in that case.
    fn commit(&self, batch: WriteBatch) -> Result<(), StorageError>;
}
