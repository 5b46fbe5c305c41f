//! Month ledger files.
//!
//! Each (month, year) pair owns one `MM_YYYY.csv` file under the storage
//! root. Mutations of a ledger take that ledger's write lock; reads take
//! its read lock, so a reader sees either the old or the new content of a
//! rewrite, never a mix.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{CalzoneError, CalzoneResult};
use crate::month::LedgerKey;
use crate::record::Row;

pub struct LedgerStore {
    root: PathBuf,
    locks: Mutex<HashMap<LedgerKey, Arc<RwLock<()>>>>,
}

impl LedgerStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LedgerStore {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: LedgerKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    /// Run `f` inside the ledger's exclusion scope. The lock entry is
    /// dropped from the map again once nobody else holds it.
    fn locked<T>(
        &self,
        key: LedgerKey,
        exclusive: bool,
        f: impl FnOnce() -> CalzoneResult<T>,
    ) -> CalzoneResult<T> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key).or_default())
        };

        let result = if exclusive {
            let _guard = lock.write().unwrap_or_else(PoisonError::into_inner);
            f()
        } else {
            let _guard = lock.read().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // the map's reference plus ours
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&key);
        }

        result
    }

    /// Append one row, creating the ledger (and storage root) if needed.
    pub fn append(&self, key: LedgerKey, row: &Row) -> CalzoneResult<()> {
        self.locked(key, true, || self.append_unlocked(key, row))?;
        info!(ledger = %key, "appended event");
        Ok(())
    }

    /// All rows in order. A ledger that does not exist yet is empty.
    pub fn read_all(&self, key: LedgerKey) -> CalzoneResult<Vec<Row>> {
        self.locked(key, false, || self.read_unlocked(key))
    }

    /// Replace the ledger's content with `rows`, in order.
    pub fn rewrite_all(&self, key: LedgerKey, rows: &[Row]) -> CalzoneResult<()> {
        self.locked(key, true, || self.rewrite_unlocked(key, rows))
    }

    /// Read, modify and rewrite a ledger while holding its write lock.
    /// Nothing is written if `f` fails.
    pub fn update<T>(
        &self,
        key: LedgerKey,
        f: impl FnOnce(&mut Vec<Row>) -> CalzoneResult<T>,
    ) -> CalzoneResult<T> {
        self.locked(key, true, || {
            let mut rows = self.read_unlocked(key)?;
            let result = f(&mut rows)?;
            self.rewrite_unlocked(key, &rows)?;
            Ok(result)
        })
    }

    fn append_unlocked(&self, key: LedgerKey, row: &Row) -> CalzoneResult<()> {
        let path = self.path_for(key);
        fs::create_dir_all(&self.root).map_err(|e| CalzoneError::storage(&self.root, e))?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| CalzoneError::storage(&path, e))?;

        let mut line = String::new();
        if !ends_with_newline(&mut file).map_err(|e| CalzoneError::storage(&path, e))? {
            line.push('\n');
        }
        line.push_str(&row.to_line());
        line.push('\n');

        file.write_all(line.as_bytes())
            .map_err(|e| CalzoneError::storage(&path, e))
    }

    fn read_unlocked(&self, key: LedgerKey) -> CalzoneResult<Vec<Row>> {
        let path = self.path_for(key);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(ledger = %key, "no ledger yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(CalzoneError::storage(&path, e)),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(position, line)| {
                Row::parse_line(line).map_err(|source| CalzoneError::CorruptRecord {
                    ledger: key.file_name(),
                    position,
                    source,
                })
            })
            .collect()
    }

    fn rewrite_unlocked(&self, key: LedgerKey, rows: &[Row]) -> CalzoneResult<()> {
        let path = self.path_for(key);
        fs::create_dir_all(&self.root).map_err(|e| CalzoneError::storage(&self.root, e))?;

        let mut tmp =
            NamedTempFile::new_in(&self.root).map_err(|e| CalzoneError::storage(&self.root, e))?;

        let mut content = String::new();
        for row in rows {
            content.push_str(&row.to_line());
            content.push('\n');
        }

        tmp.write_all(content.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| CalzoneError::storage(tmp.path(), e))?;

        // keep the ledger's mode instead of the temp file's 0600
        match fs::metadata(&path) {
            Ok(meta) => tmp
                .as_file()
                .set_permissions(meta.permissions())
                .map_err(|e| CalzoneError::storage(tmp.path(), e))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(CalzoneError::storage(&path, e)),
        }

        tmp.persist(&path)
            .map_err(|e| CalzoneError::storage(&path, e.error))?;

        info!(ledger = %key, rows = rows.len(), "rewrote ledger");
        Ok(())
    }
}

#[cfg(test)]
impl LedgerStore {
    fn tracked_locks(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// True for an empty file or one whose last byte is `\n`.
fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
