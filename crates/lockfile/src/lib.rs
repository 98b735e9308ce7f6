mod comver;
mod diff;
mod load_lockfile;
mod locked_pod;
mod lockfile_version;
mod save_lockfile;

pub use comver::{ComVer, ParseComVerError};
pub use diff::{LockfileDiff, UpdatedPod};
pub use load_lockfile::{LoadLockfileError, ParseLockfileError};
pub use locked_pod::{LockedPod, ParseLockedPodError};
pub use lockfile_version::{LockfileVersion, LockfileVersionError};
pub use save_lockfile::SaveLockfileError;

use podvend_manifest::Requirement;
use podvend_resolver::ResolvedGraph;
use podvend_version::{Dependency, PodVersion};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Content of a `Podfile.lock` file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Lockfile {
    /// Pinned pods sorted by name.
    #[serde(rename = "PODS", default)]
    pub pods: Vec<LockedPod>,
    /// Requirements of the manifest, in manifest order, without duplicates.
    #[serde(rename = "DEPENDENCIES", default)]
    pub dependencies: Vec<Dependency>,
    #[serde(rename = "SPEC CHECKSUMS", default)]
    pub spec_checksums: BTreeMap<String, String>,
    #[serde(rename = "LOCKFILE VERSION")]
    pub lockfile_version: LockfileVersion<1>,
}

impl Lockfile {
    /// Snapshot a resolved graph together with the requirements it was resolved from.
    pub fn from_graph(graph: &ResolvedGraph, requirements: &[Requirement]) -> Self {
        let pods = graph
            .iter()
            .map(|spec| LockedPod::new(&spec.name, spec.version.clone(), spec.dependencies.clone()))
            .collect();
        let spec_checksums =
            graph.iter().map(|spec| (spec.name.clone(), spec.checksum())).collect();
        Lockfile {
            pods,
            dependencies: dependencies_of(requirements),
            spec_checksums,
            lockfile_version: LockfileVersion::CURRENT,
        }
    }

    /// Name and version of every pinned pod.
    pub fn pins(&self) -> impl Iterator<Item = (&str, &PodVersion)> + '_ {
        self.pods.iter().map(|pod| (pod.name.as_str(), &pod.version))
    }

    pub fn get(&self, name: &str) -> Option<&LockedPod> {
        self.pods.iter().find(|pod| pod.name == name)
    }

    /// Whether the pins can be reused for `requirements` without resolving again.
    ///
    /// The recorded `DEPENDENCIES` must equal the requirements, and the pins must satisfy both
    /// the requirements and every recorded edge.
    pub fn satisfies(&self, requirements: &[Requirement]) -> bool {
        if self.dependencies != dependencies_of(requirements) {
            return false;
        }

        let pins: HashMap<&str, &PodVersion> = self.pins().collect();
        let edges = self.pods.iter().flat_map(|pod| pod.dependencies.iter());
        self.dependencies.iter().chain(edges).all(|dependency| {
            pins.get(dependency.name.as_str())
                .is_some_and(|version| dependency.constraint.matches(version))
        })
    }
}

/// The `DEPENDENCIES` section of `requirements`.
fn dependencies_of(requirements: &[Requirement]) -> Vec<Dependency> {
    let mut dependencies = Vec::<Dependency>::with_capacity(requirements.len());
    for dependency in requirements.iter().map(Requirement::dependency) {
        if !dependencies.contains(&dependency) {
            dependencies.push(dependency);
        }
    }
    dependencies
}

#[cfg(test)]
mod tests {
    use super::*;
    use podvend_catalog::{PackageSpec, PodSource};
    use pretty_assertions::assert_eq;
    use std::{path::PathBuf, sync::Arc};

    pub(crate) fn requirement(name: &str, constraint: &str, target: &str) -> Requirement {
        Requirement::new(name, constraint.parse().unwrap(), target)
    }

    pub(crate) fn af_graph(af_networking: &str) -> ResolvedGraph {
        let spec = |name: &str, version: &str, dependencies: &[&str]| {
            let mut spec = PackageSpec::new(
                name,
                version.parse().unwrap(),
                PodSource::Path { path: PathBuf::from(name) },
            );
            spec.dependencies = dependencies.iter().map(|text| text.parse().unwrap()).collect();
            Arc::new(spec)
        };
        ResolvedGraph::new([
            spec("AFNetworking", af_networking, &[]),
            spec(
                "AFIncrementalStore",
                "0.5.1",
                &["AFNetworking (~> 1.3.2)", "InflectorKit", "TransformerKit"],
            ),
            spec("InflectorKit", "0.0.1", &[]),
            spec("TransformerKit", "0.2.2", &[]),
        ])
    }

    pub(crate) fn af_requirements() -> Vec<Requirement> {
        vec![
            requirement("AFNetworking", "1.3.2", "Pods"),
            requirement("AFIncrementalStore", "", "Pods"),
        ]
    }

    #[test]
    fn from_graph() {
        let lockfile = Lockfile::from_graph(&af_graph("1.3.2"), &af_requirements());
        let pins: Vec<_> = lockfile.pods.iter().map(LockedPod::pin).collect();
        assert_eq!(
            pins,
            [
                "AFIncrementalStore (0.5.1)",
                "AFNetworking (1.3.2)",
                "InflectorKit (0.0.1)",
                "TransformerKit (0.2.2)",
            ],
        );
        let dependencies: Vec<_> = lockfile.dependencies.iter().map(ToString::to_string).collect();
        assert_eq!(dependencies, ["AFNetworking (= 1.3.2)", "AFIncrementalStore"]);
        assert_eq!(lockfile.spec_checksums.len(), 4);
        assert_eq!(lockfile.lockfile_version.to_string(), "1.0");
    }

    #[test]
    fn dependencies_are_deduplicated_across_targets() {
        let requirements = [
            requirement("KissXML", "", "App"),
            requirement("AFNetworking", "~> 1.3", "App"),
            requirement("KissXML", "", "Tests"),
            requirement("AFNetworking", "1.3.2", "Tests"),
        ];
        let dependencies: Vec<_> =
            dependencies_of(&requirements).iter().map(ToString::to_string).collect();
        assert_eq!(dependencies, ["KissXML", "AFNetworking (~> 1.3)", "AFNetworking (= 1.3.2)"]);
    }

    #[test]
    fn satisfies() {
        let requirements = af_requirements();
        let lockfile = Lockfile::from_graph(&af_graph("1.3.2"), &requirements);
        assert!(lockfile.satisfies(&requirements));

        eprintln!("CASE: requirements in another order");
        let reordered = [requirements[1].clone(), requirements[0].clone()];
        assert!(!lockfile.satisfies(&reordered));

        eprintln!("CASE: extra requirement");
        let extended = [requirements.clone(), vec![requirement("KissXML", "", "Pods")]].concat();
        assert!(!lockfile.satisfies(&extended));

        eprintln!("CASE: pin violates a recorded edge");
        let mut tampered = lockfile.clone();
        tampered.pods.retain(|pod| pod.name != "InflectorKit");
        assert!(!tampered.satisfies(&requirements));

        eprintln!("CASE: pin violates a requirement");
        let stale = Lockfile::from_graph(&af_graph("1.3.3"), &requirements);
        assert!(!stale.satisfies(&requirements));
    }
}
