//! Cross-process guard for the storage root.
//!
//! Ledger locks only exclude threads inside one process, so the server
//! holds an `fs2` lock on a marker file for as long as it runs.

use anyhow::{Context, Result, bail};
use fs2::FileExt;
use std::fs::{self, File};
use std::path::Path;

const MARKER: &str = ".calzone.lock";

/// Held for the server's lifetime; dropping it unlocks the root.
#[derive(Debug)]
pub struct StorageLock {
    _marker: File,
}

/// Lock `storage_root` for this process, creating the directory if needed.
pub fn lock_storage_root(storage_root: &Path) -> Result<StorageLock> {
    fs::create_dir_all(storage_root)
        .with_context(|| format!("cannot create {}", storage_root.display()))?;

    let marker_path = storage_root.join(MARKER);
    let marker = File::create(&marker_path)
        .with_context(|| format!("cannot open {}", marker_path.display()))?;

    if marker.try_lock_exclusive().is_err() {
        bail!(
            "{} is locked by a running calzone-server (marker: {})",
            storage_root.display(),
            marker_path.display()
        );
    }

    Ok(StorageLock { _marker: marker })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cannot_be_locked_twice() {
        let dir = tempfile::tempdir().unwrap();
        let _held = lock_storage_root(dir.path()).unwrap();

        let err = lock_storage_root(dir.path()).unwrap_err();
        assert!(err.to_string().contains("locked by a running calzone-server"));
    }

    #[test]
    fn test_dropping_lock_frees_root() {
        let dir = tempfile::tempdir().unwrap();
        let held = lock_storage_root(dir.path()).unwrap();
        drop(held);

        lock_storage_root(dir.path()).unwrap();
        assert!(dir.path().join(MARKER).exists());
    }
}
