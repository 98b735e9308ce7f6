use podvend_version::{Dependency, PodVersion, VersionConstraint};
use std::fmt;

/// A top-level pod requested by one target of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Requirement {
    pub name: String,
    pub constraint: VersionConstraint,
    pub target: String,
}

impl Requirement {
    pub fn new(
        name: impl Into<String>,
        constraint: VersionConstraint,
        target: impl Into<String>,
    ) -> Self {
        Requirement { name: name.into(), constraint, target: target.into() }
    }

    /// The requirement without its target, as it appears in a lockfile.
    pub fn dependency(&self) -> Dependency {
        Dependency::new(self.name.clone(), self.constraint.clone())
    }

    pub fn matches(&self, version: &PodVersion) -> bool {
        self.constraint.matches(version)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.dependency(), self.target)
    }
}
