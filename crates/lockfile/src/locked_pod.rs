use derive_more::{Display, Error};
use miette::Diagnostic;
use podvend_version::{Dependency, ParsePodVersionError, PodVersion};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, str::FromStr};

/// Entry of the `PODS` section: a pinned pod and the edges it declared when it was resolved.
///
/// Serialized as `Name (version)` when it has no dependencies, or as a single key map
/// `Name (version): [dependency, ...]` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "RawLockedPod", into = "RawLockedPod")]
pub struct LockedPod {
    pub name: String,
    pub version: PodVersion,
    pub dependencies: Vec<Dependency>,
}

#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum RawLockedPod {
    Pin(String),
    WithDependencies(BTreeMap<String, Vec<Dependency>>),
}

/// Error when parsing a `PODS` entry.
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum ParseLockedPodError {
    #[display("Pinned pod {_0:?} isn't of the form `Name (version)`")]
    #[diagnostic(code(podvend_lockfile::malformed_pin))]
    MalformedPin(#[error(not(source))] String),

    #[display("Pinned pod {input:?} has an invalid version: {error}")]
    #[diagnostic(code(podvend_lockfile::invalid_pinned_version))]
    InvalidVersion {
        input: String,
        #[error(source)]
        error: ParsePodVersionError,
    },

    #[display("A PODS entry must map exactly one pin to its dependencies, found {_0}")]
    #[diagnostic(code(podvend_lockfile::malformed_entry))]
    MalformedEntry(#[error(not(source))] usize),
}

impl LockedPod {
    pub fn new(
        name: impl Into<String>,
        version: PodVersion,
        dependencies: Vec<Dependency>,
    ) -> Self {
        LockedPod { name: name.into(), version, dependencies }
    }

    /// `Name (version)`.
    pub fn pin(&self) -> String {
        format!("{} ({})", self.name, self.version)
    }
}

/// Name and version of a `Name (version)` pin.
struct Pin {
    name: String,
    version: PodVersion,
}

impl FromStr for Pin {
    type Err = ParseLockedPodError;
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseLockedPodError::MalformedPin(value.to_string());
        let (name, rest) = value.trim().split_once(" (").ok_or_else(malformed)?;
        let version = rest.strip_suffix(')').ok_or_else(malformed)?;
        if name.is_empty() {
            return Err(malformed());
        }
        let version = version.parse::<PodVersion>().map_err(|error| {
            ParseLockedPodError::InvalidVersion { input: value.to_string(), error }
        })?;
        Ok(Pin { name: name.to_string(), version })
    }
}

impl TryFrom<RawLockedPod> for LockedPod {
    type Error = ParseLockedPodError;
    fn try_from(raw: RawLockedPod) -> Result<Self, Self::Error> {
        let (pin, dependencies) = match raw {
            RawLockedPod::Pin(pin) => (pin, Vec::new()),
            RawLockedPod::WithDependencies(map) => {
                let count = map.len();
                let mut entries = map.into_iter();
                match (entries.next(), entries.next()) {
                    (Some(entry), None) => entry,
                    _ => return Err(ParseLockedPodError::MalformedEntry(count)),
                }
            }
        };
        let Pin { name, version } = pin.parse()?;
        Ok(LockedPod { name, version, dependencies })
    }
}

impl From<LockedPod> for RawLockedPod {
    fn from(pod: LockedPod) -> Self {
        let pin = pod.pin();
        if pod.dependencies.is_empty() {
            RawLockedPod::Pin(pin)
        } else {
            RawLockedPod::WithDependencies(BTreeMap::from([(pin, pod.dependencies)]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use text_block_macros::text_block;

    #[test]
    fn deserialize_both_forms() {
        let yaml = text_block! {
            "- AFNetworking (1.3.2)"
            "- AFIncrementalStore (0.5.1):"
            "  - AFNetworking (~> 1.3.2)"
            "  - InflectorKit"
        };
        let received: Vec<LockedPod> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(received[0], LockedPod::new("AFNetworking", "1.3.2".parse().unwrap(), vec![]));
        assert_eq!(received[1].pin(), "AFIncrementalStore (0.5.1)");
        let dependencies: Vec<_> =
            received[1].dependencies.iter().map(ToString::to_string).collect();
        assert_eq!(dependencies, ["AFNetworking (~> 1.3.2)", "InflectorKit"]);
    }

    #[test]
    fn serialize_keeps_version_text() {
        let pod = LockedPod::new("KissXML", "5.0".parse().unwrap(), vec![]);
        assert_eq!(serde_yaml::to_string(&pod).unwrap().trim_end(), "KissXML (5.0)");
    }

    #[test]
    fn reject_malformed_entries() {
        macro_rules! case {
            ($input:expr) => {{
                let input = $input;
                eprintln!("CASE: {input:?}");
                assert!(serde_yaml::from_str::<LockedPod>(input).is_err());
            }};
        }

        case!("AFNetworking");
        case!("AFNetworking (1.3.2");
        case!(" (1.0)");
        case!("AFNetworking (one)");
        case!("{A (1.0): [B], C (1.0): [D]}");
    }
}
