//! Path-scoped exclusive locks
//!
//! Two layers guard one cache path: a tokio mutex keyed by path serializes
//! tasks inside this process, and an advisory `flock` on `<file>.lock`
//! serializes processes sharing the cache directory. The in-process mutex
//! is taken first so only one task per process ever blocks in `flock`.
//! A path's mutex is dropped from the table when its last holder releases
//! it with nobody waiting, so the table only holds paths in use.

use dashmap::DashMap;
use fs2::FileExt;
use graft_errors::{CacheError, Error};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Table = Arc<DashMap<PathBuf, Arc<Mutex<()>>>>;

/// Held for the duration of a check-then-download critical section
pub struct PathLock {
    local: OwnedMutexGuard<()>,
    file: File,
    path: PathBuf,
    key: PathBuf,
    table: Table,
}

impl PathLock {
    /// Path of the lock file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PathLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::debug!(path = %self.path.display(), error = %e, "failed to release cache lock");
        }
        // The table and this guard are the only owners unless a task waits
        let mutex = OwnedMutexGuard::mutex(&self.local);
        self.table
            .remove_if(&self.key, |_, entry| Arc::ptr_eq(entry, mutex) && Arc::strong_count(entry) == 2);
    }
}

/// Lock file guarding `path`
#[must_use]
pub fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

#[derive(Default)]
pub(crate) struct LockTable {
    locks: Table,
}

impl LockTable {
    pub(crate) async fn acquire(&self, path: &Path) -> Result<PathLock, Error> {
        let mutex = self
            .locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let local = mutex.lock_owned().await;
        let key = path.to_path_buf();

        let lock_path = lock_path_for(path);
        let blocking_path = lock_path.clone();
        let file = tokio::task::spawn_blocking(move || -> std::io::Result<File> {
            if let Some(parent) = blocking_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&blocking_path)?;
            file.lock_exclusive()?;
            Ok(file)
        })
        .await
        .map_err(|e| CacheError::LockFailed {
            path: lock_path.display().to_string(),
            message: e.to_string(),
        })?
        .map_err(|e| CacheError::LockFailed {
            path: lock_path.display().to_string(),
            message: e.to_string(),
        })?;

        Ok(PathLock {
            local,
            file,
            path: lock_path,
            key,
            table: Arc::clone(&self.locks),
        })
    }

    /// Paths with a live or awaited lock
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_lock_path() {
        assert_eq!(
            lock_path_for(Path::new("/cache/g/m/1/m-1.jar")),
            PathBuf::from("/cache/g/m/1/m-1.jar.lock")
        );
    }

    #[tokio::test]
    async fn test_second_acquire_waits_for_release() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("g/m/1/m-1.jar");
        let table = Arc::new(LockTable::default());

        let first = table.acquire(&target).await.unwrap();
        assert!(first.path().exists());

        let waiter = {
            let table = Arc::clone(&table);
            let target = target.clone();
            tokio::spawn(async move { table.acquire(&target).await.map(|_| ()) })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(first);
        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(table.len(), 0);
    }

    #[tokio::test]
    async fn test_released_paths_leave_the_table() {
        let dir = tempfile::tempdir().unwrap();
        let table = LockTable::default();

        for name in ["a.jar", "b.jar", "c.jar"] {
            let lock = table.acquire(&dir.path().join(name)).await.unwrap();
            assert_eq!(table.len(), 1);
            drop(lock);
        }
        assert_eq!(table.len(), 0);
    }
}
