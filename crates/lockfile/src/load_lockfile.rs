use crate::Lockfile;
use derive_more::{Display, Error};
use miette::Diagnostic;
use pipe_trait::Pipe;
use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

/// Error when decoding lockfile text.
#[derive(Debug, Display, Error, Diagnostic)]
#[display("Failed to parse lockfile content as YAML: {_0}")]
#[diagnostic(code(podvend_lockfile::parse_yaml))]
pub struct ParseLockfileError(#[error(source)] serde_yaml::Error);

/// Error when reading lockfile from the filesystem.
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum LoadLockfileError {
    #[display("Failed to read lockfile at {path:?}: {error}")]
    #[diagnostic(code(podvend_lockfile::read_file))]
    ReadFile {
        path: PathBuf,
        #[error(source)]
        error: io::Error,
    },

    #[display("Lockfile at {path:?} is corrupt: {error}")]
    #[diagnostic(
        code(podvend_lockfile::corrupt),
        help("Fix or delete the lockfile, then run the installation again")
    )]
    Corrupt {
        path: PathBuf,
        #[error(source)]
        error: ParseLockfileError,
    },
}

impl Lockfile {
    /// Decode the text of a lockfile.
    pub fn decode(text: &str) -> Result<Self, ParseLockfileError> {
        serde_yaml::from_str(text).map_err(ParseLockfileError)
    }

    /// Load the lockfile at `path`, or `None` if there is no file.
    pub fn load(path: &Path) -> Result<Option<Self>, LoadLockfileError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return LoadLockfileError::ReadFile { path: path.to_path_buf(), error }.pipe(Err)
            }
        };
        content
            .pipe_as_ref(Lockfile::decode)
            .map(Some)
            .map_err(|error| LoadLockfileError::Corrupt { path: path.to_path_buf(), error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use text_block_macros::text_block_fnl;

    const AF_LOCKFILE: &str = text_block_fnl! {
        "PODS:"
        "  - AFIncrementalStore (0.5.1):"
        "    - AFNetworking (~> 1.3.2)"
        "    - InflectorKit"
        "    - TransformerKit"
        "  - AFNetworking (1.3.2)"
        "  - InflectorKit (0.0.1)"
        "  - TransformerKit (0.2.2)"
        ""
        "DEPENDENCIES:"
        "  - AFNetworking (= 1.3.2)"
        "  - AFIncrementalStore"
        ""
        "SPEC CHECKSUMS:"
        "  AFIncrementalStore: 9f1a"
        "  AFNetworking: 3c2b"
        "  InflectorKit: 0d44"
        "  TransformerKit: 77e0"
        ""
        "LOCKFILE VERSION: 1.0"
    };

    #[test]
    fn decode() {
        let lockfile = Lockfile::decode(AF_LOCKFILE).unwrap();
        assert_eq!(lockfile.pods.len(), 4);
        assert_eq!(lockfile.get("AFIncrementalStore").unwrap().dependencies.len(), 3);
        assert_eq!(lockfile.get("AFNetworking").unwrap().version.to_string(), "1.3.2");
        assert_eq!(lockfile.dependencies[0].to_string(), "AFNetworking (= 1.3.2)");
        assert_eq!(lockfile.spec_checksums["TransformerKit"], "77e0");
    }

    #[test]
    fn decode_rejects_incompatible_version() {
        let text = AF_LOCKFILE.replace("LOCKFILE VERSION: 1.0", "LOCKFILE VERSION: 2.0");
        let error = Lockfile::decode(&text).unwrap_err();
        assert!(error.to_string().contains("incompatible with 1.x"), "{error}");
    }

    #[test]
    fn load_missing_file() {
        let dir = tempdir().unwrap();
        let received = Lockfile::load(&dir.path().join("Podfile.lock")).unwrap();
        assert_eq!(received, None);
    }

    #[test]
    fn load_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Podfile.lock");
        fs::write(&path, AF_LOCKFILE).unwrap();
        let received = Lockfile::load(&path).unwrap().unwrap();
        assert_eq!(received, Lockfile::decode(AF_LOCKFILE).unwrap());
    }

    #[test]
    fn load_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Podfile.lock");
        fs::write(&path, "PODS: [[[").unwrap();
        let error = Lockfile::load(&path).unwrap_err();
        assert!(matches!(error, LoadLockfileError::Corrupt { .. }));
    }
}
