use crate::{Origin, RequiredBy, VerifyGraphError};
use podvend_catalog::{CatalogError, PackageSource, PackageSpec};
use podvend_manifest::Requirement;
use podvend_version::{Dependency, PodVersion};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

/// Final version assignment of every pod.
///
/// Edges are the declared dependencies of each chosen spec.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolvedGraph {
    pods: BTreeMap<String, Arc<PackageSpec>>,
}

impl ResolvedGraph {
    pub fn new(specs: impl IntoIterator<Item = Arc<PackageSpec>>) -> Self {
        let pods = specs.into_iter().map(|spec| (spec.name.clone(), spec)).collect();
        ResolvedGraph { pods }
    }

    /// Rebuild a graph from pinned versions without resolving anything.
    pub fn from_pins<'a, Source>(
        source: &Source,
        pins: impl IntoIterator<Item = (&'a str, &'a PodVersion)>,
    ) -> Result<Self, CatalogError>
    where
        Source: PackageSource + ?Sized,
    {
        pins.into_iter()
            .map(|(name, version)| source.spec(name, version))
            .collect::<Result<Vec<_>, _>>()
            .map(ResolvedGraph::new)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<PackageSpec>> {
        self.pods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pods.contains_key(name)
    }

    /// Chosen specs sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<PackageSpec>> + '_ {
        self.pods.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.pods.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pods.is_empty()
    }

    /// Names of `roots` and every pod transitively reachable from them, sorted.
    pub fn reachable_from<'a>(&self, roots: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
        let mut visited = BTreeSet::new();
        let mut pending: Vec<&str> = roots.into_iter().collect();
        while let Some(name) = pending.pop() {
            let Some(spec) = self.pods.get(name) else {
                continue;
            };
            if !visited.insert(name.to_string()) {
                continue;
            }
            pending.extend(spec.dependencies.iter().map(|dependency| dependency.name.as_str()));
        }
        visited
    }

    /// Check that every requirement and every edge is satisfied by the graph.
    pub fn verify(&self, requirements: &[Requirement]) -> Result<(), VerifyGraphError> {
        let from_manifest = requirements.iter().map(|requirement| {
            let origin = Origin::Manifest { target: requirement.target.clone() };
            (requirement.dependency(), origin)
        });
        let from_pods = self.pods.values().flat_map(|spec| {
            spec.dependencies.iter().map(|dependency| {
                let origin = Origin::Pod { name: spec.name.clone(), version: spec.version.clone() };
                (dependency.clone(), origin)
            })
        });

        for (dependency, origin) in from_manifest.chain(from_pods) {
            let Dependency { name, constraint } = &dependency;
            let Some(spec) = self.pods.get(name) else {
                return Err(VerifyGraphError::Missing { dependency, origin });
            };
            if !constraint.matches(&spec.version) {
                return Err(VerifyGraphError::Unsatisfied {
                    name: name.clone(),
                    version: spec.version.clone(),
                    required: RequiredBy { constraint: constraint.clone(), origin },
                });
            }
        }

        Ok(())
    }
}
