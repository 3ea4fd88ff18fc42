//! Wholesale persistence of the collection document.
//!
//! `collection.json` is the single unit of persistence for all journal
//! metadata: every mutating call re-serializes and overwrites the whole
//! document. There is no partial patching and no optimistic-concurrency
//! check; the advisory store lock is the guard against concurrent writers.

use std::fs;
use std::path::PathBuf;

use crate::error::{QuillError, Result};
use crate::fs::write_atomic;
use crate::paths::DataDir;
use crate::storage::types::Collection;

pub struct CollectionStore {
    path: PathBuf,
}

impl CollectionStore {
    pub fn new(dirs: &DataDir) -> Self {
        Self {
            path: dirs.collection_path(),
        }
    }

    /// Load the collection document.
    ///
    /// A store that has never been saved yields a new empty collection;
    /// a corrupt document is a decode error, never silently replaced.
    pub fn load(&self) -> Result<Collection> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Collection::new());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Overwrite the collection document atomically, owner-only.
    pub fn save(&self, collection: &Collection) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let document = serde_json::to_vec_pretty(collection)?;
        write_atomic(&self.path, &document, true)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::JournalMeta;
    use tempfile::tempdir;

    fn store_in(root: &std::path::Path) -> CollectionStore {
        CollectionStore::new(&DataDir::at(root.join("store")))
    }

    #[test]
    fn test_load_missing_yields_empty_collection() {
        let tmp = tempdir().unwrap();
        let store = store_in(tmp.path());

        let collection = store.load().unwrap();
        assert!(collection.journals.is_empty());
        assert_eq!(collection.default_journal, "");
    }

    #[test]
    fn test_save_load_round_trip() {
        let tmp = tempdir().unwrap();
        let store = store_in(tmp.path());

        let mut collection = Collection::new();
        collection.add_journal(JournalMeta::new("diary")).unwrap();
        collection.add_entry_id("diary", "0001".to_string()).unwrap();
        collection.key_id = Some("legacy".to_string());
        store.save(&collection).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.default_journal, "diary");
        assert_eq!(loaded.get("diary").unwrap().entry_ids, ["0001"]);
        assert_eq!(loaded.key_id.as_deref(), Some("legacy"));
    }

    #[test]
    fn test_save_overwrites_wholesale() {
        let tmp = tempdir().unwrap();
        let store = store_in(tmp.path());

        let mut collection = Collection::new();
        collection.add_journal(JournalMeta::new("diary")).unwrap();
        collection.add_journal(JournalMeta::new("work")).unwrap();
        store.save(&collection).unwrap();

        collection.remove_journal("work").unwrap();
        store.save(&collection).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.journals.len(), 1);
        assert!(loaded.get("work").is_err());
    }

    #[test]
    fn test_corrupt_document_is_decode_error() {
        let tmp = tempdir().unwrap();
        let store = store_in(tmp.path());

        fs::create_dir_all(store.path.parent().unwrap()).unwrap();
        fs::write(&store.path, b"{ truncated").unwrap();

        assert!(matches!(store.load(), Err(QuillError::Json { .. })));
    }
}
