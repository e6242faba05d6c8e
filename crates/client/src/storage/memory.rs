//! In-memory store.

use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{KeyValueStore, StorageError, WriteBatch};

/// Process-local [`KeyValueStore`].
///
/// Nothing survives the process; useful for tests and for running the client
/// without touching disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `entries`, as if left behind by an earlier run.
    #[must_use]
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Copy of every stored entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Poisoned` if a writer panicked.
    pub fn snapshot(&self) -> Result<BTreeMap<String, String>, StorageError> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .map_err(|_| StorageError::Poisoned)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn get_many(&self, keys: &[&str]) -> Result<BTreeMap<String, String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(keys
            .iter()
            .filter_map(|key| entries.get(*key).map(|v| ((*key).to_owned(), v.clone())))
            .collect())
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        batch.apply_to(&mut entries);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_and_get() {
        let store = MemoryStore::new();
        store
            .commit(WriteBatch::new().set("userEmail", "fan@example.com"))
            .unwrap();

        assert_eq!(
            store.get("userEmail").unwrap().as_deref(),
            Some("fan@example.com")
        );
        assert_eq!(store.get("token").unwrap(), None);
    }

    #[test]
    fn test_with_entries() {
        let store = MemoryStore::with_entries([("token", "abc")]);
        assert_eq!(store.get("token").unwrap().as_deref(), Some("abc"));
        assert_eq!(store.snapshot().unwrap().len(), 1);
    }

    #[test]
    fn test_get_many_skips_missing_keys() {
        let store = MemoryStore::with_entries([("token", "abc"), ("other", "x")]);
        let found = store.get_many(&["token", "userEmail"]).unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found.get("token").map(String::as_str), Some("abc"));
    }
}
