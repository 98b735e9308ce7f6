use crate::{ManifestError, Platform, PlatformName, Requirement};
use pipe_trait::Pipe;
use podvend_version::{PodVersion, VersionConstraint};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

/// Name of the target when the manifest does not name one.
pub const DEFAULT_TARGET_NAME: &str = "Pods";

/// A dependency line of a target as written: a pod name followed by its constraint clauses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "RawPodEntry", into = "RawPodEntry")]
pub struct PodEntry {
    pub name: String,
    pub clauses: Vec<String>,
}

/// `"Name"` or `["Name", "clause", ...]`.
#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum RawPodEntry {
    Name(String),
    WithClauses(Vec<String>),
}

impl From<RawPodEntry> for PodEntry {
    fn from(value: RawPodEntry) -> Self {
        match value {
            RawPodEntry::Name(name) => PodEntry { name, clauses: Vec::new() },
            RawPodEntry::WithClauses(mut list) => {
                if list.is_empty() {
                    return PodEntry { name: String::new(), clauses: Vec::new() };
                }
                let name = list.remove(0);
                PodEntry { name, clauses: list }
            }
        }
    }
}

impl From<PodEntry> for RawPodEntry {
    fn from(PodEntry { name, clauses }: PodEntry) -> Self {
        if clauses.is_empty() {
            RawPodEntry::Name(name)
        } else {
            [name].into_iter().chain(clauses).collect::<Vec<_>>().pipe(RawPodEntry::WithClauses)
        }
    }
}

/// A build target of the host project and the pods it depends on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TargetDefinition {
    #[serde(default = "default_target_name")]
    pub name: String,
    #[serde(default)]
    pub platform: PlatformName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_target: Option<PodVersion>,
    #[serde(default)]
    pub dependencies: Vec<PodEntry>,
}

fn default_target_name() -> String {
    DEFAULT_TARGET_NAME.to_string()
}

impl TargetDefinition {
    pub fn new(name: impl Into<String>, platform: Platform) -> Self {
        let Platform { name: platform, deployment_target } = platform;
        TargetDefinition {
            name: name.into(),
            platform,
            deployment_target,
            dependencies: Vec::new(),
        }
    }

    /// Add a pod to this target. An empty `constraint` accepts any version.
    #[must_use]
    pub fn pod(mut self, name: impl Into<String>, constraint: &str) -> Self {
        let clauses =
            if constraint.trim().is_empty() { Vec::new() } else { vec![constraint.to_string()] };
        self.dependencies.push(PodEntry { name: name.into(), clauses });
        self
    }

    pub fn platform(&self) -> Platform {
        Platform::new(self.platform, self.deployment_target.clone())
    }

    /// Project-wide name of the pods group this target links against.
    pub fn pods_group(&self) -> String {
        if self.name == DEFAULT_TARGET_NAME {
            DEFAULT_TARGET_NAME.to_string()
        } else {
            format!("{DEFAULT_TARGET_NAME}-{}", self.name)
        }
    }
}

/// Content of the `Podfile.json` manifest and its path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Podfile {
    #[serde(skip)]
    path: PathBuf,
    pub targets: Vec<TargetDefinition>,
}

impl Podfile {
    /// Build a manifest in memory.
    pub fn new(path: PathBuf, targets: Vec<TargetDefinition>) -> Self {
        Podfile { path, targets }
    }

    pub fn from_path(path: PathBuf) -> Result<Podfile, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::NotFound(path));
        }
        let text = fs::read_to_string(&path)
            .map_err(|error| ManifestError::ReadFile { path: path.clone(), error })?;
        let mut podfile: Podfile = serde_json::from_str(&text)
            .map_err(|error| ManifestError::ParseJson { path: path.clone(), error })?;
        podfile.path = path;
        Ok(podfile)
    }

    pub fn path(&self) -> &'_ Path {
        &self.path
    }

    /// Directory that relative manifest paths are resolved against.
    pub fn project_dir(&self) -> &'_ Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Inherit `deployment_target` into every target that did not pin one.
    #[must_use]
    pub fn with_default_deployment_target(mut self, deployment_target: Option<PodVersion>) -> Self {
        let Some(deployment_target) = deployment_target else {
            return self;
        };
        for target in &mut self.targets {
            if target.deployment_target.is_none() {
                target.deployment_target = Some(deployment_target.clone());
            }
        }
        self
    }

    /// Distinct platforms of all targets, in declaration order.
    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms = Vec::<Platform>::new();
        for platform in self.targets.iter().map(TargetDefinition::platform) {
            if !platforms.contains(&platform) {
                platforms.push(platform);
            }
        }
        platforms
    }

    /// Flatten every target into requirements, in declaration order.
    pub fn requirements(&self) -> Result<Vec<Requirement>, ManifestError> {
        let mut seen = HashSet::<(&str, &str)>::new();
        let mut requirements = Vec::new();
        for target in &self.targets {
            for PodEntry { name, clauses } in &target.dependencies {
                let name = name.trim();
                if name.is_empty() {
                    return Err(ManifestError::EmptyName { target: target.name.clone() });
                }
                if !seen.insert((name, target.name.as_str())) {
                    return Err(ManifestError::DuplicateRequirement {
                        name: name.to_string(),
                        target: target.name.clone(),
                    });
                }
                let clauses = clauses.iter().map(String::as_str);
                let constraint = VersionConstraint::parse_clauses(clauses).map_err(|error| {
                    ManifestError::InvalidConstraint {
                        name: name.to_string(),
                        target: target.name.clone(),
                        error,
                    }
                })?;
                requirements.push(Requirement::new(name, constraint, target.name.clone()));
            }
        }
        Ok(requirements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use text_block_macros::text_block;

    fn podfile_from_text(text: &str) -> Podfile {
        let file = NamedTempFile::new().unwrap();
        write!(file.as_file(), "{text}").unwrap();
        Podfile::from_path(file.path().to_path_buf()).unwrap()
    }

    #[test]
    fn parse_json_manifest() {
        let podfile = podfile_from_text(text_block! {
            "{"
            "  \"targets\": ["
            "    {"
            "      \"platform\": \"ios\","
            "      \"dependencies\": ["
            "        [\"AFNetworking\", \"1.3.2\"],"
            "        \"AFKissXMLRequestOperation\","
            "        [\"Foo\", \"> 1.0\", \"< 2.0\"]"
            "      ]"
            "    }"
            "  ]"
            "}"
        });
        let received: Vec<_> =
            podfile.requirements().unwrap().iter().map(ToString::to_string).collect();
        assert_eq!(
            received,
            [
                "AFNetworking (= 1.3.2) [Pods]",
                "AFKissXMLRequestOperation [Pods]",
                "Foo (> 1.0, < 2.0) [Pods]",
            ],
        );
        assert_eq!(podfile.platforms(), [Platform::new(PlatformName::Ios, None)]);
    }

    #[test]
    fn builder_matches_json() {
        let built = Podfile::new(
            PathBuf::new(),
            vec![TargetDefinition::new("App", Platform::new(PlatformName::Osx, None))
                .pod("KissXML", "")
                .pod("AFNetworking", "~> 1.3")],
        );
        let requirements = built.requirements().unwrap();
        assert_eq!(requirements[0], Requirement::new("KissXML", VersionConstraint::any(), "App"));
        assert_eq!(requirements[1].constraint.to_string(), "~> 1.3");
        assert_eq!(built.targets[0].pods_group(), "Pods-App");

        let json = serde_json::to_string(&built).unwrap();
        let reparsed: Podfile = serde_json::from_str(&json).unwrap();
        assert_eq!(reparsed.targets, built.targets);
    }

    #[test]
    fn deployment_target_is_inherited() {
        let podfile = Podfile::new(
            PathBuf::new(),
            vec![
                TargetDefinition::new("Pods", Platform::default()),
                TargetDefinition::new(
                    "Legacy",
                    Platform::new(PlatformName::Ios, Some("4.3".parse().unwrap())),
                ),
            ],
        )
        .with_default_deployment_target(Some("5.0".parse().unwrap()));
        let received: Vec<_> = podfile.platforms().iter().map(ToString::to_string).collect();
        assert_eq!(received, ["iOS 5.0", "iOS 4.3"]);
    }

    #[test]
    fn same_pod_in_two_targets_is_allowed() {
        let podfile = Podfile::new(
            PathBuf::new(),
            vec![
                TargetDefinition::new("App", Platform::default()).pod("KissXML", ""),
                TargetDefinition::new("Tests", Platform::default()).pod("KissXML", ""),
            ],
        );
        assert_eq!(podfile.requirements().unwrap().len(), 2);
    }

    #[test]
    fn reject_invalid_manifests() {
        let podfile = |target: TargetDefinition| Podfile::new(PathBuf::new(), vec![target]);

        let target = TargetDefinition::new("Pods", Platform::default());
        let duplicate = podfile(target.pod("A", "").pod("A", "1.0"));
        assert!(matches!(
            duplicate.requirements(),
            Err(ManifestError::DuplicateRequirement { name, target })
                if name == "A" && target == "Pods",
        ));

        let blank = podfile(TargetDefinition::new("Pods", Platform::default()).pod("  ", ""));
        assert!(matches!(blank.requirements(), Err(ManifestError::EmptyName { .. })));

        let invalid = podfile(TargetDefinition::new("Pods", Platform::default()).pod("A", "~ 1"));
        assert!(matches!(invalid.requirements(), Err(ManifestError::InvalidConstraint { .. })));
    }

    #[test]
    fn missing_or_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Podfile::from_path(dir.path().join("Podfile.json"));
        assert!(matches!(missing, Err(ManifestError::NotFound(_))));

        let file = NamedTempFile::new().unwrap();
        write!(file.as_file(), "{{ \"targets\": 42 }}").unwrap();
        let malformed = Podfile::from_path(file.path().to_path_buf());
        assert!(matches!(malformed, Err(ManifestError::ParseJson { .. })));
    }
}
