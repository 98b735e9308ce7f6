use crate::Lockfile;
use derive_more::{Display, Error};
use miette::Diagnostic;
use podvend_fs::{write_atomic, WriteAtomicError};
use std::path::Path;

/// Error when writing a lockfile to the filesystem.
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum SaveLockfileError {
    #[display("Failed to serialize lockfile as YAML: {_0}")]
    #[diagnostic(code(podvend_lockfile::serialize_yaml))]
    Serialize(serde_yaml::Error),

    #[display("Failed to write lockfile: {_0}")]
    #[diagnostic(code(podvend_lockfile::write_file))]
    WriteFile(WriteAtomicError),
}

impl Lockfile {
    /// Encode the lockfile as YAML text.
    ///
    /// Encoding is deterministic: the same lockfile always produces the same bytes.
    pub fn encode(&self) -> Result<String, SaveLockfileError> {
        serde_yaml::to_string(self).map_err(SaveLockfileError::Serialize)
    }

    /// Write the lockfile to `path` atomically.
    pub fn save(&self, path: &Path) -> Result<(), SaveLockfileError> {
        let text = self.encode()?;
        write_atomic(path, text.as_bytes()).map_err(SaveLockfileError::WriteFile)?;
        tracing::info!(target: "podvend::install", ?path, pods = self.pods.len(), "Lockfile written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{af_graph, af_requirements};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn encode_is_stable() {
        let lockfile = Lockfile::from_graph(&af_graph("1.3.2"), &af_requirements());
        let text = lockfile.encode().unwrap();
        eprintln!("ENCODED:\n{text}");

        let decoded = Lockfile::decode(&text).unwrap();
        assert_eq!(decoded, lockfile);
        assert_eq!(decoded.encode().unwrap(), text);

        let sections: Vec<_> = text.lines().filter(|line| !line.starts_with([' ', '-'])).collect();
        assert_eq!(sections.len(), 4);
        assert!(sections[0].starts_with("PODS:"));
        assert!(sections[1].starts_with("DEPENDENCIES:"));
        assert!(sections[2].starts_with("SPEC CHECKSUMS:"));
        assert!(sections[3].starts_with("LOCKFILE VERSION:"));
        assert!(text.contains("AFNetworking (~> 1.3.2)"));
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vendor").join("Podfile.lock");
        let lockfile = Lockfile::from_graph(&af_graph("1.3.2"), &af_requirements());
        lockfile.save(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), lockfile.encode().unwrap());
        assert_eq!(Lockfile::load(&path).unwrap(), Some(lockfile));
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(leftovers, ["Podfile.lock"]);
    }
}
