mod copy_dir;
mod write_atomic;

pub use copy_dir::{copy_dir_all, CopyDirError};
pub use write_atomic::{write_atomic, WriteAtomicError};

use std::{fs, io, path::Path};

/// Create a symlink to a directory.
///
/// The `link` path will be a symbolic link pointing to `original`.
pub fn symlink_dir(original: &Path, link: &Path) -> io::Result<()> {
    #[cfg(unix)]
    return std::os::unix::fs::symlink(original, link);
    #[cfg(windows)]
    return junction::create(original, link); // symlinks may require elevated privileges
}

/// Check if a path is a symlink or a junction.
pub fn is_symlink_or_junction(path: &Path) -> io::Result<bool> {
    #[cfg(windows)]
    return junction::exists(path);

    #[cfg(not(windows))]
    return Ok(path.is_symlink());
}

/// Remove a directory link created by [`symlink_dir`], doing nothing if it doesn't exist.
pub fn remove_link(link: &Path) -> io::Result<()> {
    if fs::symlink_metadata(link).is_err() {
        return Ok(());
    }

    #[cfg(windows)]
    return junction::delete(link).and_then(|()| fs::remove_dir(link));

    #[cfg(not(windows))]
    return fs::remove_file(link);
}

/// Remove a directory and all of its content, doing nothing if it doesn't exist.
pub fn remove_dir_if_exists(dir: &Path) -> io::Result<()> {
    match fs::remove_dir_all(dir) {
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        result => result,
    }
}
