//! Locked, atomic file writes.
//!
//! A writer takes an exclusive lock on a sidecar `<file>.lock` for the
//! duration of the write, writes `<file>.tmp`, syncs it and renames it over
//! the target. Readers never lock; they see either the previous complete
//! file or the new one. The lock is released when the [`WriteLock`] drops,
//! including on every error path.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{MasterError, Result};

/// Exclusive write lock scoped to one target file.
#[derive(Debug)]
pub struct WriteLock {
    target: PathBuf,
    lock_path: PathBuf,
    file: File,
}

impl WriteLock {
    /// Blocks until the exclusive lock for `target` is held.
    pub fn acquire(target: &Path) -> Result<Self> {
        if let Some(parent) = target.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|e| MasterError::io("create directory", parent, e))?;
        }
        let lock_path = sidecar(target, ".lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| MasterError::io("open lock file", &lock_path, e))?;
        file.lock()
            .map_err(|e| MasterError::io("lock", &lock_path, e))?;
        debug!(path = %target.display(), "write lock acquired");
        Ok(Self {
            target: target.to_path_buf(),
            lock_path,
            file,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Writes `bytes` to a temp file and renames it over the target.
    pub fn commit(&self, bytes: &[u8]) -> Result<()> {
        let temp_path = sidecar(&self.target, ".tmp");
        let result = write_and_sync(&temp_path, bytes).and_then(|()| {
            fs::rename(&temp_path, &self.target).map_err(|source| {
                MasterError::AtomicWriteFailed {
                    temp_path: temp_path.clone(),
                    target_path: self.target.clone(),
                    source,
                }
            })
        });
        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        if let Err(error) = self.file.unlock() {
            debug!(path = %self.lock_path.display(), %error, "unlock failed");
        }
    }
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| MasterError::io("create", path, e))?;
    file.write_all(bytes)
        .map_err(|e| MasterError::io("write", path, e))?;
    file.sync_all().map_err(|e| MasterError::io("sync", path, e))?;
    Ok(())
}

fn sidecar(target: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn commit_replaces_target_and_leaves_no_temp() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("A.master.json");
        fs::write(&target, "old").unwrap();

        let lock = WriteLock::acquire(&target).unwrap();
        lock.commit(b"new").unwrap();
        drop(lock);

        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
        assert!(!dir.path().join("A.master.json.tmp").exists());
    }

    #[test]
    fn lock_is_released_on_drop() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("B.master.json");
        {
            let _first = WriteLock::acquire(&target).unwrap();
        }
        let second = OpenOptions::new()
            .write(true)
            .open(dir.path().join("B.master.json.lock"))
            .unwrap();
        assert!(second.try_lock().is_ok());
    }

    #[test]
    fn creates_missing_parent_directory() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("masterFiles").join("C.master.json");
        let lock = WriteLock::acquire(&target).unwrap();
        lock.commit(b"[]").unwrap();
        assert!(target.exists());
    }
}
