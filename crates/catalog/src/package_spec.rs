use podvend_manifest::{Platform, PlatformName};
use podvend_version::{Dependency, PodVersion};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

/// Where the sources of a pod come from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PodSource {
    /// A local directory. Relative paths are relative to the podspec.
    Path { path: PathBuf },
    /// A gzipped tarball, optionally verified against an SSRI `integrity`.
    Http {
        http: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        integrity: Option<String>,
    },
}

/// Link-time requirements a pod contributes to the host project.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct BuildSettings {
    #[serde(default)]
    pub frameworks: BTreeSet<String>,
    #[serde(default)]
    pub libraries: BTreeSet<String>,
    #[serde(default)]
    pub header_search_paths: BTreeSet<String>,
    #[serde(default)]
    pub product_artifacts: BTreeSet<String>,
}

/// Metadata of one version of a pod, as found in `<Name>.podspec.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PackageSpec {
    pub name: String,
    pub version: PodVersion,
    pub source: PodSource,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    /// Supported platforms and their minimum deployment targets. Empty means every platform.
    #[serde(default)]
    pub platforms: BTreeMap<PlatformName, Option<PodVersion>>,
    #[serde(flatten)]
    pub build_settings: BuildSettings,
    /// Directory of the podspec file, if it was read from disk.
    #[serde(skip)]
    pub spec_dir: Option<PathBuf>,
}

impl PackageSpec {
    pub fn new(name: impl Into<String>, version: PodVersion, source: PodSource) -> Self {
        PackageSpec {
            name: name.into(),
            version,
            source,
            dependencies: Vec::new(),
            platforms: BTreeMap::new(),
            build_settings: BuildSettings::default(),
            spec_dir: None,
        }
    }

    /// `{name} ({version})`, the way a pinned pod is written in a lockfile.
    pub fn to_pin_string(&self) -> String {
        format!("{} ({})", self.name, self.version)
    }

    /// Hex encoded SHA-256 of the canonical JSON form.
    pub fn checksum(&self) -> String {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        format!("{:x}", Sha256::digest(canonical))
    }

    /// Whether the pod can be used by a target built for `platform`.
    pub fn supports(&self, platform: &Platform) -> bool {
        if self.platforms.is_empty() {
            return true;
        }
        match self.platforms.get(&platform.name) {
            Some(minimum) => platform.accepts_minimum(minimum.as_ref()),
            None => false,
        }
    }

    /// Source directory of a [`PodSource::Path`] pod, resolved against the podspec directory.
    pub fn local_source_dir(&self) -> Option<PathBuf> {
        let PodSource::Path { path } = &self.source else {
            return None;
        };
        match &self.spec_dir {
            Some(spec_dir) if path.is_relative() => Some(spec_dir.join(path)),
            _ => Some(path.clone()),
        }
    }

    /// Record where the podspec was read from.
    #[must_use]
    pub fn with_spec_dir(mut self, spec_dir: &Path) -> Self {
        self.spec_dir = Some(spec_dir.to_path_buf());
        self
    }
}
