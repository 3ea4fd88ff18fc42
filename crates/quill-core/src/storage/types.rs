//! Core data types for the storage layer.
//!
//! These are the documents persisted under the data root: one
//! `EntryRecord` file per entry, and the `Collection` document holding
//! every journal's metadata plus the default-journal pointer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{self, KeyPair};
use crate::error::{QuillError, Result};

/// A single persisted entry.
///
/// The body holds `nonce || ciphertext+tag` and is stored as base64 text
/// inside the JSON document. Plaintext never touches disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryRecord {
    /// 4-digit zero-padded decimal identifier, unique across the store
    pub id: String,

    /// When this entry was created
    pub created: DateTime<Utc>,

    /// Encrypted body
    #[serde(with = "base64_bytes")]
    pub body: Vec<u8>,

    /// Name of the owning journal
    #[serde(rename = "journalId")]
    pub journal: String,
}

impl EntryRecord {
    /// Seal a new entry body under the installation key pair.
    pub fn seal(id: String, journal: &str, text: &str, keys: &KeyPair) -> Result<Self> {
        Ok(Self {
            id,
            created: Utc::now(),
            body: crypto::seal(text, keys)?,
            journal: journal.to_string(),
        })
    }

    /// Decrypt the entry body.
    ///
    /// # Errors
    ///
    /// `Authentication` on a wrong key or tampered ciphertext, never a
    /// partial or empty fallback.
    pub fn decrypted_body(&self, keys: &KeyPair) -> Result<String> {
        crypto::open(&self.body, keys)
    }
}

/// Metadata for one journal: name, creation time, and the insertion-ordered
/// list of owned entry IDs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalMeta {
    pub name: String,
    pub created: DateTime<Utc>,
    pub entry_ids: Vec<String>,
}

impl JournalMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created: Utc::now(),
            entry_ids: Vec::new(),
        }
    }
}

/// The aggregate document describing all journals.
///
/// The single source of truth for journal membership; persisted wholesale
/// on every mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collection {
    pub journals: BTreeMap<String, JournalMeta>,

    /// Name of the default journal, `""` when unset. When set it always
    /// names a key present in `journals`.
    #[serde(default)]
    pub default_journal: String,

    /// Legacy key-identifier field. Read and written for compatibility,
    /// consulted by no code path: decryption always uses the single
    /// installation key pair.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a journal. The first journal ever added becomes the default.
    ///
    /// # Errors
    ///
    /// `DuplicateJournal` if the name is already present.
    pub fn add_journal(&mut self, meta: JournalMeta) -> Result<()> {
        if self.journals.contains_key(&meta.name) {
            return Err(QuillError::DuplicateJournal(meta.name));
        }
        let first = self.journals.is_empty();
        if first {
            self.default_journal = meta.name.clone();
        }
        self.journals.insert(meta.name.clone(), meta);
        Ok(())
    }

    /// Remove a journal, clearing the default pointer if it referenced it.
    ///
    /// Returns the removed metadata so the caller can cascade to the
    /// entry records.
    pub fn remove_journal(&mut self, name: &str) -> Result<JournalMeta> {
        let meta = self
            .journals
            .remove(name)
            .ok_or_else(|| QuillError::JournalNotFound(name.to_string()))?;
        if self.default_journal == name {
            self.default_journal.clear();
        }
        Ok(meta)
    }

    /// Point the default at an existing journal.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.journals.contains_key(name) {
            return Err(QuillError::JournalNotFound(name.to_string()));
        }
        self.default_journal = name.to_string();
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&JournalMeta> {
        self.journals
            .get(name)
            .ok_or_else(|| QuillError::JournalNotFound(name.to_string()))
    }

    /// Append an entry ID to a journal's list.
    pub fn add_entry_id(&mut self, journal: &str, id: String) -> Result<()> {
        let meta = self
            .journals
            .get_mut(journal)
            .ok_or_else(|| QuillError::JournalNotFound(journal.to_string()))?;
        meta.entry_ids.push(id);
        Ok(())
    }

    /// Remove an entry ID from a journal's list by value.
    ///
    /// # Errors
    ///
    /// `EntryNotFound` if the ID is not in the list.
    pub fn remove_entry_id(&mut self, journal: &str, id: &str) -> Result<()> {
        let meta = self
            .journals
            .get_mut(journal)
            .ok_or_else(|| QuillError::JournalNotFound(journal.to_string()))?;
        let position = meta
            .entry_ids
            .iter()
            .position(|listed| listed == id)
            .ok_or_else(|| QuillError::EntryNotFound(id.to_string()))?;
        meta.entry_ids.remove(position);
        Ok(())
    }
}

/// Serialize binary ciphertext as base64 text inside JSON documents.
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_journal_becomes_default() {
        let mut collection = Collection::new();

        collection.add_journal(JournalMeta::new("diary")).unwrap();
        assert_eq!(collection.default_journal, "diary");

        collection.add_journal(JournalMeta::new("work")).unwrap();
        assert_eq!(collection.default_journal, "diary");
    }

    #[test]
    fn test_duplicate_journal_rejected() {
        let mut collection = Collection::new();
        collection.add_journal(JournalMeta::new("diary")).unwrap();

        let result = collection.add_journal(JournalMeta::new("diary"));
        assert!(matches!(result, Err(QuillError::DuplicateJournal(name)) if name == "diary"));
    }

    #[test]
    fn test_remove_default_journal_clears_pointer() {
        let mut collection = Collection::new();
        collection.add_journal(JournalMeta::new("work")).unwrap();
        collection.set_default("work").unwrap();

        collection.remove_journal("work").unwrap();
        assert_eq!(collection.default_journal, "");
    }

    #[test]
    fn test_remove_other_journal_keeps_default() {
        let mut collection = Collection::new();
        collection.add_journal(JournalMeta::new("diary")).unwrap();
        collection.add_journal(JournalMeta::new("work")).unwrap();

        collection.remove_journal("work").unwrap();
        assert_eq!(collection.default_journal, "diary");
    }

    #[test]
    fn test_set_default_missing_journal() {
        let mut collection = Collection::new();
        assert!(matches!(
            collection.set_default("absent"),
            Err(QuillError::JournalNotFound(_))
        ));
    }

    #[test]
    fn test_entry_id_list_preserves_insertion_order() {
        let mut collection = Collection::new();
        collection.add_journal(JournalMeta::new("diary")).unwrap();

        for id in ["0002", "0001", "0003"] {
            collection.add_entry_id("diary", id.to_string()).unwrap();
        }
        assert_eq!(collection.get("diary").unwrap().entry_ids, ["0002", "0001", "0003"]);

        collection.remove_entry_id("diary", "0001").unwrap();
        assert_eq!(collection.get("diary").unwrap().entry_ids, ["0002", "0003"]);
    }

    #[test]
    fn test_remove_missing_entry_id() {
        let mut collection = Collection::new();
        collection.add_journal(JournalMeta::new("diary")).unwrap();

        let result = collection.remove_entry_id("diary", "9999");
        assert!(matches!(result, Err(QuillError::EntryNotFound(id)) if id == "9999"));
    }

    #[test]
    fn test_collection_document_shape() {
        let mut collection = Collection::new();
        collection.add_journal(JournalMeta::new("diary")).unwrap();

        let doc = serde_json::to_value(&collection).unwrap();
        assert!(doc.get("journals").unwrap().get("diary").is_some());
        assert_eq!(doc.get("default_journal").unwrap(), "diary");
        // Unset key_id stays out of the document entirely.
        assert!(doc.get("key_id").is_none());

        collection.key_id = Some("legacy".to_string());
        let doc = serde_json::to_value(&collection).unwrap();
        assert_eq!(doc.get("key_id").unwrap(), "legacy");
    }

    #[test]
    fn test_entry_record_body_serializes_as_base64() {
        let record = EntryRecord {
            id: "0001".to_string(),
            created: Utc::now(),
            body: vec![0xde, 0xad, 0xbe, 0xef],
            journal: "diary".to_string(),
        };

        let doc = serde_json::to_value(&record).unwrap();
        assert_eq!(doc.get("body").unwrap(), "3q2+7w==");
        assert_eq!(doc.get("journalId").unwrap(), "diary");

        let back: EntryRecord = serde_json::from_value(doc).unwrap();
        assert_eq!(back.body, record.body);
    }
}
