use derive_more::Display;
use podvend_version::{PodVersion, VersionConstraint};

/// What introduced a constraint.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash)]
pub enum Origin {
    #[display("target {target:?} of the Podfile")]
    Manifest { target: String },
    #[display("{name} ({version})")]
    Pod { name: String, version: PodVersion },
}

impl Origin {
    /// Name of the pod that declared the constraint, if any.
    pub fn pod_name(&self) -> Option<&str> {
        match self {
            Origin::Manifest { .. } => None,
            Origin::Pod { name, .. } => Some(name),
        }
    }
}

/// A constraint on some pod and where it came from.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash)]
#[display("{constraint} required by {origin}")]
pub struct RequiredBy {
    pub constraint: VersionConstraint,
    pub origin: Origin,
}

pub(crate) fn join_required_by(list: &[RequiredBy]) -> String {
    list.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display() {
        let from_manifest = RequiredBy {
            constraint: "= 1.3.2".parse().unwrap(),
            origin: Origin::Manifest { target: "Pods".to_string() },
        };
        let from_pod = RequiredBy {
            constraint: "~> 1.3.2".parse().unwrap(),
            origin: Origin::Pod {
                name: "AFIncrementalStore".to_string(),
                version: "0.5.1".parse().unwrap(),
            },
        };
        assert_eq!(
            join_required_by(&[from_manifest, from_pod]),
            r#"= 1.3.2 required by target "Pods" of the Podfile; ~> 1.3.2 required by AFIncrementalStore (0.5.1)"#,
        );
    }
}
