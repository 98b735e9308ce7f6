use crate::{CatalogError, PackageSource, PackageSpec};
use dashmap::DashMap;
use pipe_trait::Pipe;
use podvend_version::PodVersion;
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Extension of podspec files inside a spec repository.
pub const PODSPEC_EXTENSION: &str = "podspec.json";

/// A spec repository on disk.
///
/// Layout: `<root>/<Name>/<version>/<Name>.podspec.json`
#[derive(Debug)]
pub struct SpecRepo {
    root: PathBuf,
    specs: DashMap<(String, String), Arc<PackageSpec>>,
}

impl SpecRepo {
    pub fn new(root: PathBuf) -> Self {
        SpecRepo { root, specs: DashMap::new() }
    }

    pub fn root(&self) -> &'_ Path {
        &self.root
    }

    /// Path of the podspec of `name` at `version`.
    pub fn spec_path(&self, name: &str, version: &str) -> PathBuf {
        self.root.join(name).join(version).join(format!("{name}.{PODSPEC_EXTENSION}"))
    }

    fn load(&self, name: &str, version: &PodVersion) -> Result<PackageSpec, CatalogError> {
        let version_text = version.to_string();
        let path = self.spec_path(name, &version_text);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(CatalogError::VersionNotFound {
                    name: name.to_string(),
                    version: version.clone(),
                });
            }
            Err(error) => return Err(CatalogError::ReadSpec { path, error }),
        };

        let spec: PackageSpec = serde_json::from_str(&text)
            .map_err(|error| CatalogError::ParseSpec { path: path.clone(), error })?;

        if spec.name != name || &spec.version != version {
            return Err(CatalogError::SpecMismatch {
                path,
                expected: format!("{name} ({version})"),
                found: spec.to_pin_string(),
            });
        }

        let spec_dir = path.parent().unwrap_or(&self.root).to_path_buf();
        Ok(spec.with_spec_dir(&spec_dir))
    }
}

impl PackageSource for SpecRepo {
    fn versions(&self, name: &str) -> Result<Vec<PodVersion>, CatalogError> {
        let dir = self.root.join(name);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(CatalogError::PodNotFound { name: name.to_string() });
            }
            Err(error) => return Err(CatalogError::ReadDir { dir, error }),
        };

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|error| CatalogError::ReadDir { dir: dir.clone(), error })?;
            let file_name = entry.file_name();
            let Some(version_text) = file_name.to_str() else {
                continue;
            };
            if !self.spec_path(name, version_text).is_file() {
                continue;
            }
            match version_text.parse::<PodVersion>() {
                Ok(version) => versions.push(version),
                Err(error) => {
                    tracing::warn!(target: "podvend::catalog", pod = name, version_text, %error, "Skipping unparsable version");
                }
            }
        }

        if versions.is_empty() {
            return Err(CatalogError::PodNotFound { name: name.to_string() });
        }

        Ok(versions)
    }

    fn spec(&self, name: &str, version: &PodVersion) -> Result<Arc<PackageSpec>, CatalogError> {
        let key = (name.to_string(), version.to_string());
        if let Some(spec) = self.specs.get(&key) {
            return spec.value().pipe(Arc::clone).pipe(Ok);
        }
        let spec = self.load(name, version)?.pipe(Arc::new);
        self.specs.insert(key, Arc::clone(&spec));
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::tempdir;

    fn write_spec(root: &Path, name: &str, version: &str, content: serde_json::Value) {
        let dir = root.join(name).join(version);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{name}.{PODSPEC_EXTENSION}")), content.to_string()).unwrap();
    }

    fn af_networking(version: &str) -> serde_json::Value {
        json!({
            "name": "AFNetworking",
            "version": version,
            "source": { "path": "../../../../sources/AFNetworking" },
            "frameworks": ["Security"]
        })
    }

    #[test]
    fn list_versions() {
        let root = tempdir().unwrap();
        write_spec(root.path(), "AFNetworking", "1.3.2", af_networking("1.3.2"));
        write_spec(root.path(), "AFNetworking", "1.3.3", af_networking("1.3.3"));
        fs::create_dir_all(root.path().join("AFNetworking/not-a-version")).unwrap();
        fs::create_dir_all(root.path().join("AFNetworking/2.0.0")).unwrap();

        let repo = SpecRepo::new(root.path().to_path_buf());
        let mut versions = repo.versions("AFNetworking").unwrap();
        versions.sort();
        let versions: Vec<_> = versions.iter().map(ToString::to_string).collect();
        assert_eq!(versions, ["1.3.2", "1.3.3"]);

        assert!(matches!(
            repo.versions("Missing"),
            Err(CatalogError::PodNotFound { name }) if name == "Missing",
        ));
    }

    #[test]
    fn load_and_cache_spec() {
        let root = tempdir().unwrap();
        write_spec(root.path(), "AFNetworking", "1.3.2", af_networking("1.3.2"));
        let repo = SpecRepo::new(root.path().to_path_buf());
        let version = "1.3.2".parse().unwrap();

        let spec = repo.spec("AFNetworking", &version).unwrap();
        assert_eq!(spec.to_pin_string(), "AFNetworking (1.3.2)");
        assert_eq!(spec.spec_dir.as_deref(), Some(root.path().join("AFNetworking/1.3.2").as_path()));

        fs::remove_dir_all(root.path().join("AFNetworking")).unwrap();
        let cached = repo.spec("AFNetworking", &version).unwrap();
        assert!(Arc::ptr_eq(&spec, &cached));
    }

    #[test]
    fn reject_broken_specs() {
        let root = tempdir().unwrap();
        write_spec(root.path(), "AFNetworking", "1.3.2", af_networking("1.3.3"));
        write_spec(root.path(), "KissXML", "5.0", json!({ "name": "KissXML" }));
        let repo = SpecRepo::new(root.path().to_path_buf());

        let mismatch = repo.spec("AFNetworking", &"1.3.2".parse().unwrap());
        assert!(matches!(mismatch, Err(CatalogError::SpecMismatch { .. })));

        let invalid = repo.spec("KissXML", &"5.0".parse().unwrap());
        assert!(matches!(invalid, Err(CatalogError::ParseSpec { .. })));

        let missing = repo.spec("KissXML", &"6.0".parse().unwrap());
        assert!(matches!(missing, Err(CatalogError::VersionNotFound { .. })));
    }
}
