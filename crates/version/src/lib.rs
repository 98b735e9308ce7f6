mod constraint;
mod dependency;
mod pod_version;

pub use constraint::{Clause, Operator, ParseConstraintError, VersionConstraint};
pub use dependency::{Dependency, ParseDependencyError};
pub use pod_version::{ParsePodVersionError, PodVersion};
