//! Data-root resolution and on-disk layout.
//!
//! All Quill state lives under a single per-user directory (by default
//! `~/.quill`). The layout:
//!
//! ```text
//! collection.json          # all journal metadata, one document
//! entries/<id>.json        # one record per entry
//! entries/.counter         # last allocated entry ID
//! backup/quill.pub         # base64 public key, world-readable
//! backup/quill.sec         # base64 private key, owner-only
//! .lock                    # advisory lock file
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{QuillError, Result};

const DATA_DIR_NAME: &str = ".quill";
const COLLECTION_FILE: &str = "collection.json";
const ENTRIES_DIR: &str = "entries";
const COUNTER_FILE: &str = ".counter";
const BACKUP_DIR: &str = "backup";
const PUB_KEY_FILE: &str = "quill.pub";
const SEC_KEY_FILE: &str = "quill.sec";
const LOCK_FILE: &str = ".lock";

/// The per-user data root and the paths of everything stored under it.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Resolve the default data root under the user's home directory.
    pub fn default_root() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            QuillError::Io {
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "home directory not found",
                ),
            }
        })?;
        Ok(Self::at(home.join(DATA_DIR_NAME)))
    }

    /// Use an explicit data root (tests, alternate profiles).
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The data root itself.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn collection_path(&self) -> PathBuf {
        self.root.join(COLLECTION_FILE)
    }

    pub fn entries_dir(&self) -> PathBuf {
        self.root.join(ENTRIES_DIR)
    }

    pub fn entry_path(&self, id: &str) -> PathBuf {
        self.entries_dir().join(format!("{id}.json"))
    }

    pub fn counter_path(&self) -> PathBuf {
        self.entries_dir().join(COUNTER_FILE)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join(BACKUP_DIR)
    }

    pub fn public_key_path(&self) -> PathBuf {
        self.backup_dir().join(PUB_KEY_FILE)
    }

    pub fn private_key_path(&self) -> PathBuf {
        self.backup_dir().join(SEC_KEY_FILE)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    /// Create the root and its subdirectories, owner-only.
    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.root, &self.entries_dir(), &self.backup_dir()] {
            fs::create_dir_all(dir)?;
            restrict_dir(dir)?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_dir(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o700))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_dir(_path: &Path) -> Result<()> {
    Ok(())
}
