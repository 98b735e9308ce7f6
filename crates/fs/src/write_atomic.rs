use derive_more::{Display, Error};
use miette::Diagnostic;
use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

/// Error type of [`write_atomic`].
#[derive(Debug, Display, Error, Diagnostic)]
pub enum WriteAtomicError {
    #[display("Failed to create the parent directory at {parent_dir:?}: {error}")]
    CreateDir {
        parent_dir: PathBuf,
        #[error(source)]
        error: io::Error,
    },
    #[display("Failed to write to temporary file at {temp_path:?}: {error}")]
    WriteTemp {
        temp_path: PathBuf,
        #[error(source)]
        error: io::Error,
    },
    #[display("Failed to move {temp_path:?} into {file_path:?}: {error}")]
    Rename {
        temp_path: PathBuf,
        file_path: PathBuf,
        #[error(source)]
        error: io::Error,
    },
}

/// Replace the content of `file_path` with `content`.
///
/// The content is written to a sibling temporary file first, then renamed over `file_path`,
/// so readers observe either the old or the new content. Ancestor directories will be created
/// if they don't already exist.
pub fn write_atomic(file_path: &Path, content: &[u8]) -> Result<(), WriteAtomicError> {
    let parent_dir = file_path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent_dir).map_err(|error| WriteAtomicError::CreateDir {
        parent_dir: parent_dir.to_path_buf(),
        error,
    })?;

    let file_name = file_path.file_name().unwrap_or_default().to_string_lossy();
    let temp_path = parent_dir.join(format!(".{file_name}.{}.tmp", std::process::id()));

    let write_temp = || -> io::Result<()> {
        let mut file =
            OpenOptions::new().write(true).create(true).truncate(true).open(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()
    };
    if let Err(error) = write_temp() {
        let _ = fs::remove_file(&temp_path);
        return Err(WriteAtomicError::WriteTemp { temp_path, error });
    }

    fs::rename(&temp_path, file_path).map_err(|error| {
        let _ = fs::remove_file(&temp_path);
        WriteAtomicError::Rename {
            temp_path: temp_path.clone(),
            file_path: file_path.to_path_buf(),
            error,
        }
    })
}
