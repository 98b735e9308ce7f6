use advisory_lock::{AdvisoryFileLock, FileLockError, FileLockMode};
use derive_more::{Display, Error};
use miette::Diagnostic;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

/// Error when acquiring a [`VendorLock`].
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum VendorLockError {
    #[display("Another installation is running on the vendor directory guarded by {path:?}")]
    #[diagnostic(
        code(podvend_installer::vendor_locked),
        help("Wait for the other installation to finish, then try again")
    )]
    Locked { path: PathBuf },

    #[display("Failed to open the guard file at {path:?}: {error}")]
    #[diagnostic(code(podvend_installer::open_guard))]
    OpenGuard {
        path: PathBuf,
        #[error(source)]
        error: io::Error,
    },

    #[display("Failed to lock the guard file at {path:?}: {error}")]
    #[diagnostic(code(podvend_installer::lock_guard))]
    LockGuard {
        path: PathBuf,
        #[error(source)]
        error: io::Error,
    },
}

/// Exclusive advisory lock on the guard file of a vendor directory, released on drop.
#[derive(Debug)]
pub struct VendorLock {
    file: File,
    path: PathBuf,
}

impl VendorLock {
    /// Lock `path`, creating it and its parent directory if needed.
    ///
    /// Fails fast with [`VendorLockError::Locked`] if another handle holds the lock.
    pub fn acquire(path: &Path) -> Result<Self, VendorLockError> {
        let open_error = |error| VendorLockError::OpenGuard { path: path.to_path_buf(), error };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(open_error)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(open_error)?;

        match AdvisoryFileLock::try_lock(&file, FileLockMode::Exclusive) {
            Ok(()) => {}
            Err(FileLockError::AlreadyLocked) => {
                return Err(VendorLockError::Locked { path: path.to_path_buf() })
            }
            Err(FileLockError::Io(error)) => {
                return Err(VendorLockError::LockGuard { path: path.to_path_buf(), error })
            }
        }

        tracing::debug!(target: "podvend::install", ?path, "Vendor directory locked");
        Ok(VendorLock { file, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &'_ Path {
        &self.path
    }
}

impl Drop for VendorLock {
    fn drop(&mut self) {
        if let Err(error) = AdvisoryFileLock::unlock(&self.file) {
            tracing::warn!(target: "podvend::install", path = ?self.path, %error, "Failed to unlock the vendor directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn second_lock_fails_until_release() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vendor").join(".install-guard");

        let first = VendorLock::acquire(&path).unwrap();
        assert!(matches!(VendorLock::acquire(&path), Err(VendorLockError::Locked { .. })));
        drop(first);

        let again = VendorLock::acquire(&path).unwrap();
        assert_eq!(again.path(), path);
    }
}
