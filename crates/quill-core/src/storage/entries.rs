//! File-per-entry record store.
//!
//! Each entry is an independent owner-only JSON document under
//! `entries/`, keyed by its 4-digit ID. Records are written atomically
//! but overwritten unconditionally: there is no compare-and-swap, which
//! is why creation goes through [`EntryStore::put_new`].

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{QuillError, Result};
use crate::fs::write_atomic;
use crate::paths::DataDir;
use crate::storage::types::EntryRecord;

/// Width of formatted entry IDs.
const ID_DIGITS: usize = 4;

pub struct EntryStore {
    dir: PathBuf,
    counter_path: PathBuf,
}

impl EntryStore {
    pub fn new(dirs: &DataDir) -> Self {
        Self {
            dir: dirs.entries_dir(),
            counter_path: dirs.counter_path(),
        }
    }

    /// Allocate the next sequential entry ID.
    ///
    /// The last allocated ID lives in a counter file guarded by the store
    /// lock; callers must hold the lock from allocation through `put_new`.
    /// A store without a counter (created by an older version, or empty)
    /// seeds it from a scan of the record file names: each stem is parsed
    /// as an integer, non-numeric names are ignored, and the maximum wins.
    /// An empty store yields `"0001"`. Once the counter exists, IDs are
    /// never reissued, even after records are deleted.
    pub fn next_id(&self) -> Result<String> {
        let last = match fs::read_to_string(&self.counter_path) {
            Ok(text) => text.trim().parse::<u64>().map_err(|e| {
                QuillError::Decode(format!("entry counter: {e}"))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let seeded = self.scan_max()?;
                debug!(seeded, "seeding entry counter from directory scan");
                seeded
            }
            Err(e) => return Err(e.into()),
        };

        let next = last + 1;
        fs::create_dir_all(&self.dir)?;
        write_atomic(&self.counter_path, next.to_string().as_bytes(), true)?;
        Ok(format!("{next:0width$}", width = ID_DIGITS))
    }

    fn scan_max(&self) -> Result<u64> {
        let reader = match fs::read_dir(&self.dir) {
            Ok(reader) => reader,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut max = 0;
        for dirent in reader {
            let name = dirent?.file_name();
            let stem = name
                .to_string_lossy()
                .trim_end_matches(".json")
                .to_string();
            if let Ok(id) = stem.parse::<u64>() {
                max = max.max(id);
            }
        }
        Ok(max)
    }

    /// Persist a record, overwriting unconditionally if the ID exists.
    pub fn put(&self, record: &EntryRecord) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let document = serde_json::to_vec_pretty(record)?;
        write_atomic(&self.entry_path(&record.id), &document, true)?;
        Ok(())
    }

    /// Persist a record that must not exist yet.
    ///
    /// # Errors
    ///
    /// `Consistency` if a record with this ID is already on disk: a
    /// colliding allocation must fail loudly, never silently overwrite.
    pub fn put_new(&self, record: &EntryRecord) -> Result<()> {
        if self.entry_path(&record.id).exists() {
            return Err(QuillError::Consistency(format!(
                "entry ID collision: {} already has a record",
                record.id
            )));
        }
        self.put(record)
    }

    /// Load a record by ID.
    pub fn get(&self, id: &str) -> Result<EntryRecord> {
        let bytes = match fs::read(self.entry_path(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(QuillError::EntryNotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Delete a record. Idempotent: a missing record is not an error.
    pub fn delete(&self, id: &str) -> Result<()> {
        match fs::remove_file(self.entry_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn exists(&self, id: &str) -> bool {
        self.entry_path(id).is_file()
    }

    /// IDs of all records present on disk, in numeric order.
    pub fn ids(&self) -> Result<Vec<String>> {
        let reader = match fs::read_dir(&self.dir) {
            Ok(reader) => reader,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for dirent in reader {
            let name = dirent?.file_name();
            let name = name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".json") {
                if stem.chars().all(|c| c.is_ascii_digit()) && !stem.is_empty() {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort_by_key(|id| id.parse::<u64>().unwrap_or(u64::MAX));
        Ok(ids)
    }

    fn entry_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}
