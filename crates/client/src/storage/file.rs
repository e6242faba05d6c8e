//! JSON file store.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::{KeyValueStore, StorageError, WriteBatch};

/// [`KeyValueStore`] backed by a single JSON object on disk.
///
/// Each commit reads the current file, applies the batch, writes the result
/// to a sibling temp file and renames it over the original, so a crash
/// mid-write leaves either the old or the new contents. A missing file reads
/// as empty.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (lazily) the store at `path`. The file is created on first commit.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn get_many(&self, keys: &[&str]) -> Result<BTreeMap<String, String>, StorageError> {
        let mut entries = self.read_all()?;
        entries.retain(|key, _| keys.contains(&key.as_str()));
        Ok(entries)
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::Poisoned)?;

        let mut entries = self.read_all()?;
        let ops = batch.ops().len();
        batch.apply_to(&mut entries);
        self.write_all(&entries)?;

        debug!(path = %self.path.display(), ops, "Session storage committed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("stagedoor-test-{}", uuid::Uuid::new_v4()))
            .join("session.json")
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let store = FileStore::new(scratch_path());
        assert_eq!(store.get("token").unwrap(), None);
    }

    #[test]
    fn test_commit_persists_across_instances() {
        let path = scratch_path();
        FileStore::new(&path)
            .commit(
                WriteBatch::new()
                    .set("token", "tok")
                    .set("userEmail", "fan@example.com"),
            )
            .unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("token").unwrap().as_deref(), Some("tok"));
        assert_eq!(
            reopened.get("userEmail").unwrap().as_deref(),
            Some("fan@example.com")
        );

        reopened
            .commit(WriteBatch::new().remove("token").remove("userEmail"))
            .unwrap();
        assert_eq!(FileStore::new(&path).get("token").unwrap(), None);

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_get_many_reads_requested_keys() {
        let path = scratch_path();
        let store = FileStore::new(&path);
        store
            .commit(
                WriteBatch::new()
                    .set("token", "tok")
                    .set("userEmail", "fan@example.com")
                    .set("theme", "dark"),
            )
            .unwrap();

        let found = store.get_many(&["token", "userEmail", "userId"]).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found.get("token").map(String::as_str), Some("tok"));
        assert!(!found.contains_key("theme"));

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let path = scratch_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        let store = FileStore::new(&path);
        assert!(matches!(store.get("token"), Err(StorageError::Corrupt(_))));

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }
}
