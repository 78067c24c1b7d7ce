//! Host-local single-flight lock keyed by feed name.
//!
//! Each acquisition opens its own descriptor on `<dir>/nrfeed_<key>.lock` and
//! takes a non-blocking exclusive `flock(2)`. Separate descriptors conflict
//! even inside one process, so the lock excludes threads, tasks and worker
//! processes alike. The kernel drops the lock when the descriptor closes,
//! which includes the holder crashing. Lock files are left in place: removing
//! one would let two holders lock different inodes under the same name.

mod key;

pub use key::lock_file_name;

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use crate::Error;

/// Namespace of per-feed locks rooted at one directory.
#[derive(Debug, Clone)]
pub struct FeedLocks {
    dir: PathBuf,
}

impl FeedLocks {
    /// Use `dir` as the lock namespace, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(Error::Lock)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Try to take the lock for `key` without waiting.
    ///
    /// Returns `Ok(None)` when another holder has it.
    pub fn try_acquire(&self, key: &str) -> Result<Option<FeedLockGuard>, Error> {
        let path = self.dir.join(lock_file_name(key));
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(Error::Lock)?;

        // SAFETY: the descriptor belongs to `file`, which stays open for the call.
        let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if rc == 0 {
            tracing::trace!(key, "feed lock acquired");
            return Ok(Some(FeedLockGuard { file, key: key.to_string() }));
        }

        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::WouldBlock {
            Ok(None)
        } else {
            Err(Error::Lock(err))
        }
    }
}

/// Held feed lock. Released when dropped.
#[derive(Debug)]
pub struct FeedLockGuard {
    file: File,
    key: String,
}

impl FeedLockGuard {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Release the lock now.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for FeedLockGuard {
    fn drop(&mut self) {
        // Closing `file` after this releases the flock; unlocking first keeps
        // the release independent of any duplicated descriptors.
        // SAFETY: `self.file` is still open here.
        unsafe {
            libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
        }
        tracing::trace!(key = %self.key, "feed lock released");
    }
}
