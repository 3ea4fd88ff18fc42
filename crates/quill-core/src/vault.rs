//! The vault: aggregate root over the key pair, entry records, and the
//! journal index.
//!
//! An entry record and its journal's ID list reference each other with no
//! shared transaction, so all mutation flows through this one API: each
//! operation acquires the advisory store lock, reloads the collection,
//! updates both sides, and saves, closing the window where one side
//! updates and the other does not.
//!
//! The key pair is explicit session state: restored once at open,
//! injected into every cipher call, zeroized when the vault is dropped.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, warn};

use crate::crypto::{KeyPair, KeyStore};
use crate::error::{QuillError, Result};
use crate::lock::StoreLock;
use crate::paths::DataDir;
use crate::storage::types::JournalMeta;
use crate::storage::{Collection, CollectionStore, EntryRecord, EntryStore};

/// An entry with its body decrypted, as handed to consumers.
#[derive(Debug, Clone)]
pub struct DecryptedEntry {
    pub id: String,
    pub created: DateTime<Utc>,
    pub body: String,
}

/// One half of a broken entry/journal reference: a listed ID with no
/// backing record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingRef {
    pub journal: String,
    pub id: String,
}

/// Result of the orphan maintenance scan.
#[derive(Debug, Clone, Default)]
pub struct OrphanReport {
    /// Record files no journal lists.
    pub unreferenced_records: Vec<String>,
    /// Listed entry IDs with no record file.
    pub dangling_refs: Vec<DanglingRef>,
}

impl OrphanReport {
    pub fn is_empty(&self) -> bool {
        self.unreferenced_records.is_empty() && self.dangling_refs.is_empty()
    }
}

/// A session over one data root.
pub struct Vault {
    dirs: DataDir,
    keys: KeyPair,
    entries: EntryStore,
    collection_store: CollectionStore,
    collection: Collection,
}

impl Vault {
    /// Open an existing store: restore the key pair and load the
    /// collection, once each for the session.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` if the installation has no key backup yet (see
    /// [`Vault::init`]), `Decode`/`Json` on corrupt documents.
    pub fn open(dirs: DataDir) -> Result<Self> {
        let keys = KeyStore::new(&dirs).restore()?;
        let collection_store = CollectionStore::new(&dirs);
        let collection = collection_store.load()?;
        debug!(root = %dirs.root().display(), journals = collection.journals.len(), "vault opened");
        Ok(Self {
            entries: EntryStore::new(&dirs),
            collection_store,
            collection,
            keys,
            dirs,
        })
    }

    /// First-run bootstrap: create the data root, generate the key pair
    /// if none exists, then open.
    pub fn init(dirs: DataDir) -> Result<Self> {
        dirs.ensure()?;
        let key_store = KeyStore::new(&dirs);
        if !key_store.exists() {
            key_store.generate()?;
        }
        Self::open(dirs)
    }

    /// The base64-encoded installation public key.
    pub fn public_key(&self) -> String {
        self.keys.public_b64()
    }

    // --- Journal operations ---

    /// Create a journal. The first journal ever created becomes the
    /// default.
    ///
    /// # Errors
    ///
    /// `DuplicateJournal` if the name exists.
    pub fn create_journal(&mut self, name: &str) -> Result<()> {
        let _lock = self.lock()?;
        let mut collection = self.collection_store.load()?;
        collection.add_journal(JournalMeta::new(name))?;
        self.commit(collection)
    }

    /// Delete a journal and, best-effort, its entry records.
    ///
    /// Each owned record is deleted individually; failures are logged and
    /// collected but never abort the deletion. Removal from the
    /// collection always succeeds, even if some records are left
    /// orphaned. Clears the default pointer if it referenced this
    /// journal.
    ///
    /// Returns the IDs whose record deletion failed.
    pub fn delete_journal(&mut self, name: &str) -> Result<Vec<String>> {
        let _lock = self.lock()?;
        let mut collection = self.collection_store.load()?;
        let meta = collection.remove_journal(name)?;

        let mut failed = Vec::new();
        for id in &meta.entry_ids {
            if let Err(e) = self.entries.delete(id) {
                warn!(entry_id = %id, error = %e, "failed to delete entry record");
                failed.push(id.clone());
            }
        }

        self.commit(collection)?;
        Ok(failed)
    }

    /// Point the default at an existing journal.
    ///
    /// # Errors
    ///
    /// `JournalNotFound` if the name is absent.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        let _lock = self.lock()?;
        let mut collection = self.collection_store.load()?;
        collection.set_default(name)?;
        self.commit(collection)
    }

    /// Name of the default journal, `""` when unset.
    pub fn default_journal(&self) -> &str {
        &self.collection.default_journal
    }

    /// Journal names in sorted order, the default marked with an asterisk.
    pub fn list(&self) -> Vec<String> {
        self.collection
            .journals
            .keys()
            .map(|name| {
                if *name == self.collection.default_journal {
                    format!("{name} *")
                } else {
                    name.clone()
                }
            })
            .collect()
    }

    /// A transient read view of one journal.
    pub fn journal(&self, name: &str) -> Result<Journal<'_>> {
        let meta = self.collection.get(name)?;
        Ok(Journal { vault: self, meta })
    }

    // --- Entry operations ---

    /// Append a new encrypted entry to a journal.
    ///
    /// ID allocation, record creation, and the index update happen under
    /// one lock acquisition; a colliding allocation from a racing process
    /// is a fatal `Consistency` error rather than a silent overwrite.
    ///
    /// Returns the new entry's ID.
    pub fn add_entry(&mut self, journal: &str, text: &str) -> Result<String> {
        let _lock = self.lock()?;
        let mut collection = self.collection_store.load()?;
        collection.get(journal)?;

        let id = self.entries.next_id()?;
        let record = EntryRecord::seal(id.clone(), journal, text, &self.keys)?;
        self.entries.put_new(&record)?;

        collection.add_entry_id(journal, id.clone())?;
        self.commit(collection)?;
        Ok(id)
    }

    /// Remove an entry from a journal and delete its record.
    ///
    /// The index is updated and saved before the record is deleted, so a
    /// failure in between leaves an unreferenced record (visible to
    /// [`Vault::orphans`]), never a listed ID with no backing record.
    ///
    /// # Errors
    ///
    /// `EntryNotFound` if the ID is not in the journal's list; the
    /// collection is left unchanged.
    pub fn remove_entry(&mut self, journal: &str, id: &str) -> Result<()> {
        let _lock = self.lock()?;
        let mut collection = self.collection_store.load()?;
        collection.remove_entry_id(journal, id)?;
        self.commit(collection)?;
        self.entries.delete(id)
    }

    /// Load and decrypt a single entry by ID.
    pub fn entry(&self, id: &str) -> Result<DecryptedEntry> {
        let record = self.entries.get(id)?;
        Ok(DecryptedEntry {
            body: record.decrypted_body(&self.keys)?,
            id: record.id,
            created: record.created,
        })
    }

    // --- Maintenance ---

    /// Scan for both halves of a broken entry/journal reference: record
    /// files no journal lists, and listed IDs with no backing record.
    pub fn orphans(&self) -> Result<OrphanReport> {
        let _lock = self.lock()?;
        let collection = self.collection_store.load()?;
        let on_disk = self.entries.ids()?;

        let mut referenced = std::collections::BTreeSet::new();
        let mut report = OrphanReport::default();

        for meta in collection.journals.values() {
            for id in &meta.entry_ids {
                referenced.insert(id.clone());
                if !on_disk.contains(id) {
                    report.dangling_refs.push(DanglingRef {
                        journal: meta.name.clone(),
                        id: id.clone(),
                    });
                }
            }
        }
        for id in on_disk {
            if !referenced.contains(&id) {
                report.unreferenced_records.push(id);
            }
        }

        Ok(report)
    }

    // --- Internals ---

    fn lock(&self) -> Result<StoreLock> {
        StoreLock::acquire(&self.dirs.lock_path())
    }

    /// Persist a mutated collection and adopt it as the session snapshot.
    fn commit(&mut self, collection: Collection) -> Result<()> {
        self.collection_store.save(&collection)?;
        self.collection = collection;
        Ok(())
    }
}

/// Transient read view into one journal of a loaded collection.
pub struct Journal<'a> {
    vault: &'a Vault,
    meta: &'a JournalMeta,
}

impl Journal<'_> {
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.meta.created
    }

    pub fn entry_ids(&self) -> &[String] {
        &self.meta.entry_ids
    }

    /// Metadata summary: name, creation time, entry count.
    pub fn describe(&self) -> String {
        format!(
            "Journal: {}\nCreated: {}\nEntries: {}",
            self.meta.name,
            self.meta.created.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.meta.entry_ids.len()
        )
    }

    /// Load and decrypt every entry, in list order.
    pub fn entries(&self) -> Result<Vec<DecryptedEntry>> {
        self.meta
            .entry_ids
            .iter()
            .map(|id| self.vault.entry(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn vault_in(root: &std::path::Path) -> Vault {
        Vault::init(DataDir::at(root.join("store"))).unwrap()
    }

    #[test]
    fn test_init_generates_keys_once() {
        let tmp = tempdir().unwrap();
        let dirs = DataDir::at(tmp.path().join("store"));

        let first = Vault::init(dirs.clone()).unwrap().public_key();
        let second = Vault::init(dirs).unwrap().public_key();

        assert_eq!(first, second);
    }

    #[test]
    fn test_open_without_keys_is_key_not_found() {
        let tmp = tempdir().unwrap();
        let dirs = DataDir::at(tmp.path().join("store"));

        assert!(matches!(Vault::open(dirs), Err(QuillError::KeyNotFound)));
    }

    #[test]
    fn test_journal_view_describe() {
        let tmp = tempdir().unwrap();
        let mut vault = vault_in(tmp.path());
        vault.create_journal("diary").unwrap();
        vault.add_entry("diary", "first").unwrap();

        let description = vault.journal("diary").unwrap().describe();
        assert!(description.starts_with("Journal: diary\nCreated: "));
        assert!(description.ends_with("Entries: 1"));
    }

    #[test]
    fn test_journal_view_missing() {
        let tmp = tempdir().unwrap();
        let vault = vault_in(tmp.path());

        assert!(matches!(
            vault.journal("absent"),
            Err(QuillError::JournalNotFound(_))
        ));
    }

    #[test]
    fn test_list_marks_default() {
        let tmp = tempdir().unwrap();
        let mut vault = vault_in(tmp.path());
        vault.create_journal("diary").unwrap();
        vault.create_journal("work").unwrap();

        assert_eq!(vault.list(), ["diary *", "work"]);

        vault.set_default("work").unwrap();
        assert_eq!(vault.list(), ["diary", "work *"]);
    }
}
