//! Advisory cross-process locking for the shared data root.
//!
//! The core is single-threaded, but several OS processes may point at the
//! same store. Every collection mutation holds this lock for its full
//! reload-mutate-save span, and entry creation holds it from ID allocation
//! through record write, so concurrent processes serialize instead of
//! silently overwriting each other.

use std::fs::{File, OpenOptions};
use std::path::Path;

use fs2::FileExt;

use crate::error::Result;

/// RAII guard for an exclusive advisory lock on the data root.
///
/// Blocks until the lock is available; released when dropped. The lock is
/// advisory: it only coordinates processes that also acquire it.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
}

impl StoreLock {
    /// Acquire the lock, blocking until it is free.
    pub fn acquire(lock_path: &Path) -> Result<Self> {
        let mut options = OpenOptions::new();
        options.write(true).create(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let file = options.open(lock_path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
