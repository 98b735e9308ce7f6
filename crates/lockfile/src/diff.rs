use crate::Lockfile;
use podvend_version::PodVersion;
use std::collections::{BTreeMap, BTreeSet};

/// A pod pinned to another version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatedPod {
    pub name: String,
    pub from: PodVersion,
    pub to: PodVersion,
}

/// Differences between two lockfiles.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LockfileDiff {
    /// The set of pinned names and versions differs.
    pub pods_changed: bool,
    /// `DEPENDENCIES` differs, order included.
    pub dependencies_changed: bool,
    pub checksums_changed: bool,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub updated: Vec<UpdatedPod>,
}

impl LockfileDiff {
    pub fn is_empty(&self) -> bool {
        !self.pods_changed && !self.dependencies_changed && !self.checksums_changed
    }
}

impl Lockfile {
    /// Compare `self`, the old lockfile, against `new`.
    pub fn diff(&self, new: &Lockfile) -> LockfileDiff {
        let old_pins: BTreeMap<&str, &PodVersion> = self.pins().collect();
        let new_pins: BTreeMap<&str, &PodVersion> = new.pins().collect();

        let added = new_pins
            .keys()
            .filter(|name| !old_pins.contains_key(*name))
            .map(|name| name.to_string())
            .collect::<Vec<_>>();
        let removed = old_pins
            .keys()
            .filter(|name| !new_pins.contains_key(*name))
            .map(|name| name.to_string())
            .collect::<Vec<_>>();
        let updated = new_pins
            .iter()
            .filter_map(|(name, to)| {
                let from = old_pins.get(name)?;
                (from.to_string() != to.to_string()).then(|| UpdatedPod {
                    name: name.to_string(),
                    from: (*from).clone(),
                    to: (*to).clone(),
                })
            })
            .collect::<Vec<_>>();

        let as_set = |pins: &BTreeMap<&str, &PodVersion>| -> BTreeSet<String> {
            pins.iter().map(|(name, version)| format!("{name} ({version})")).collect()
        };

        LockfileDiff {
            pods_changed: as_set(&old_pins) != as_set(&new_pins),
            dependencies_changed: self.dependencies != new.dependencies,
            checksums_changed: self.spec_checksums != new.spec_checksums,
            added,
            removed,
            updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        tests::{af_graph, af_requirements, requirement},
        LockedPod, Lockfile, UpdatedPod,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn identical() {
        let lockfile = Lockfile::from_graph(&af_graph("1.3.2"), &af_requirements());
        let diff = lockfile.diff(&lockfile.clone());
        assert!(diff.is_empty());
        assert!(diff.added.is_empty() && diff.removed.is_empty() && diff.updated.is_empty());
    }

    #[test]
    fn pods_order_is_irrelevant() {
        let lockfile = Lockfile::from_graph(&af_graph("1.3.2"), &af_requirements());
        let mut reversed = lockfile.clone();
        reversed.pods.reverse();
        assert!(!lockfile.diff(&reversed).pods_changed);
    }

    #[test]
    fn dependencies_only() {
        let old = Lockfile::from_graph(&af_graph("1.3.2"), &af_requirements());
        let mut requirements = af_requirements();
        requirements.reverse();
        let new = Lockfile::from_graph(&af_graph("1.3.2"), &requirements);
        let diff = old.diff(&new);
        assert!(!diff.pods_changed);
        assert!(diff.dependencies_changed);
        assert!(!diff.checksums_changed);
    }

    #[test]
    fn pods_added_removed_and_updated() {
        let old = Lockfile::from_graph(&af_graph("1.3.2"), &af_requirements());
        let mut new = Lockfile::from_graph(&af_graph("1.3.3"), &af_requirements());
        new.pods.retain(|pod| pod.name != "InflectorKit");
        new.pods.push(LockedPod::new("KissXML", "5.0".parse().unwrap(), vec![]));
        new.dependencies.push(requirement("KissXML", "", "Pods").dependency());

        let diff = old.diff(&new);
        assert!(diff.pods_changed);
        assert!(diff.dependencies_changed);
        assert_eq!(diff.added, ["KissXML"]);
        assert_eq!(diff.removed, ["InflectorKit"]);
        assert_eq!(
            diff.updated,
            [UpdatedPod {
                name: "AFNetworking".to_string(),
                from: "1.3.2".parse().unwrap(),
                to: "1.3.3".parse().unwrap(),
            }],
        );
    }

    #[test]
    fn against_empty() {
        let new = Lockfile::from_graph(&af_graph("1.3.2"), &af_requirements());
        let diff = Lockfile::default().diff(&new);
        assert!(diff.pods_changed);
        assert_eq!(diff.added.len(), 4);
    }
}
