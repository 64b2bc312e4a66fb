//! Exclusive file lock on the knowledge-base directory.
//!
//! The store supports exactly one logical writer per instant, so the whole
//! directory is locked for the lifetime of the process that opened it. The
//! lock is advisory, non-blocking, and released when the guard is dropped.

use std::fs::{File, OpenOptions};
use std::io::{Error as IoError, ErrorKind, Result as IoResult};
use std::path::{Path, PathBuf};

/// Guard holding the exclusive lock on a knowledge-base directory.
#[derive(Debug)]
pub struct FileLock {
    _file: File,
    path: PathBuf,
}

impl FileLock {
    /// Attempts to acquire the lock, creating the lock file if needed.
    ///
    /// # Errors
    /// - `ErrorKind::WouldBlock` if another process holds the lock
    /// - other I/O errors if the lock file cannot be created
    pub fn acquire(dir: &Path) -> IoResult<Self> {
        let path = dir.join("kb.lock");
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        Self::try_lock(&file)?;

        Ok(Self { _file: file, path })
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(unix)]
    fn try_lock(file: &File) -> IoResult<()> {
        use std::os::unix::io::AsRawFd;

        let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if rc != 0 {
            let errno = IoError::last_os_error();
            if errno.raw_os_error() == Some(libc::EWOULDBLOCK) {
                return Err(IoError::new(
                    ErrorKind::WouldBlock,
                    "knowledge base locked by another process",
                ));
            }
            return Err(errno);
        }
        Ok(())
    }

    #[cfg(windows)]
    fn try_lock(file: &File) -> IoResult<()> {
        use std::os::windows::io::AsRawHandle;
        use windows_sys::Win32::Foundation::HANDLE;
        use windows_sys::Win32::Storage::FileSystem::{
            LockFileEx, LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY,
        };

        let handle = file.as_raw_handle() as HANDLE;
        let rc = unsafe {
            let mut overlapped = std::mem::zeroed::<windows_sys::Win32::System::IO::OVERLAPPED>();
            LockFileEx(
                handle,
                LOCKFILE_EXCLUSIVE_LOCK | LOCKFILE_FAIL_IMMEDIATELY,
                0,
                1,
                0,
                &mut overlapped,
            )
        };

        if rc == 0 {
            return Err(IoError::new(
                ErrorKind::WouldBlock,
                format!(
                    "knowledge base locked by another process: {}",
                    IoError::last_os_error()
                ),
            ));
        }
        Ok(())
    }

    #[cfg(not(any(unix, windows)))]
    fn try_lock(_file: &File) -> IoResult<()> {
        Err(IoError::new(
            ErrorKind::Unsupported,
            "file locking not supported on this platform",
        ))
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // The OS releases the lock when the file handle closes.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn acquire_creates_lock_file() {
        let dir = tempdir().unwrap();
        let lock = FileLock::acquire(dir.path()).unwrap();
        assert!(lock.path().exists());
    }

    #[test]
    fn second_acquire_in_same_process_is_refused() {
        let dir = tempdir().unwrap();
        let _held = FileLock::acquire(dir.path()).unwrap();

        let second = FileLock::acquire(dir.path());
        assert!(second.is_err());
        assert_eq!(second.unwrap_err().kind(), ErrorKind::WouldBlock);
    }

    #[test]
    fn lock_is_released_on_drop() {
        let dir = tempdir().unwrap();
        {
            let _lock = FileLock::acquire(dir.path()).unwrap();
        }
        let reacquired = FileLock::acquire(dir.path());
        assert!(reacquired.is_ok());
    }
}
