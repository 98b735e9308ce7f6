use derive_more::{Display, Error};
use miette::Diagnostic;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Error type for [`copy_dir_all`].
#[derive(Debug, Display, Error, Diagnostic)]
pub enum CopyDirError {
    #[display("Failed to walk {source_dir:?}: {error}")]
    Walk {
        source_dir: PathBuf,
        #[error(source)]
        error: walkdir::Error,
    },
    #[display("Cannot create directory at {dirname:?}: {error}")]
    CreateDir {
        dirname: PathBuf,
        #[error(source)]
        error: io::Error,
    },
    #[display("Failed to copy {from:?} to {to:?}: {error}")]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        #[error(source)]
        error: io::Error,
    },
}

/// Reflink or copy every file under `source_dir` into `target_dir`.
///
/// * Directories are recreated, including empty ones.
/// * Symbolic links are followed.
/// * Entries whose file name starts with `.git` are skipped.
pub fn copy_dir_all(source_dir: &Path, target_dir: &Path) -> Result<(), CopyDirError> {
    fs::create_dir_all(target_dir).map_err(|error| CopyDirError::CreateDir {
        dirname: target_dir.to_path_buf(),
        error,
    })?;

    let entries = WalkDir::new(source_dir)
        .follow_links(true)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| !entry.file_name().to_string_lossy().starts_with(".git"));

    for entry in entries {
        let entry = entry.map_err(|error| CopyDirError::Walk {
            source_dir: source_dir.to_path_buf(),
            error,
        })?;
        let Ok(suffix) = entry.path().strip_prefix(source_dir) else {
            continue;
        };
        let target = target_dir.join(suffix);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map_err(|error| CopyDirError::CreateDir { dirname: target.clone(), error })?;
            continue;
        }

        if let Some(parent_dir) = target.parent() {
            fs::create_dir_all(parent_dir).map_err(|error| CopyDirError::CreateDir {
                dirname: parent_dir.to_path_buf(),
                error,
            })?;
        }

        reflink_copy::reflink_or_copy(entry.path(), &target).map_err(|error| {
            CopyDirError::CopyFile { from: entry.path().to_path_buf(), to: target.clone(), error }
        })?;
    }

    Ok(())
}
