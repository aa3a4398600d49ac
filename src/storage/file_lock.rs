use std::fs::{File, OpenOptions};
use tracing::warn;
use crate::core::error::{Error, ErrorKind, Result};
use crate::storage::layout::StorageLayout;

/// Single writer guarantee: an exclusive flock on `<root>/write.lock`,
/// released when the lock is dropped
pub struct FileLock {
    pub file: File,
}

impl FileLock {
    pub fn acquire(storage: &StorageLayout) -> Result<Self> {
        let lock_path = storage.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            use libc::{flock, LOCK_EX, LOCK_NB};

            let fd = file.as_raw_fd();
            let rc = unsafe { flock(fd, LOCK_EX | LOCK_NB) };
            if rc != 0 {
                let err = std::io::Error::last_os_error();
                if err.kind() == std::io::ErrorKind::WouldBlock {
                    warn!(path = %lock_path.display(), "index is locked by another writer");
                    return Err(Error::new(
                        ErrorKind::LockHeld,
                        format!("write lock {} is held", lock_path.display()),
                    ));
                }
                return Err(err.into());
            }
        }

        Ok(FileLock { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            use libc::{flock, LOCK_UN};

            let fd = self.file.as_raw_fd();
            unsafe {
                flock(fd, LOCK_UN);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_lock_is_refused_until_release() {
        let dir = TempDir::new().unwrap();
        let layout = StorageLayout::create(dir.path()).unwrap();

        let first = FileLock::acquire(&layout).unwrap();
        let err = FileLock::acquire(&layout).err().unwrap();
        assert_eq!(err.kind, ErrorKind::LockHeld);

        drop(first);
        assert!(FileLock::acquire(&layout).is_ok());
    }
}
