use derive_more::{Display, Error};
use miette::Diagnostic;
use node_semver::{SemverError, Version};
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    hash::{Hash, Hasher},
    str::FromStr,
};

/// Version of a pod as it is written in a podspec, a manifest, or a lockfile.
///
/// Syntax: up to three dot-separated numbers with an optional pre-release suffix.
///
/// Examples: `1`, `2.0`, `1.3.2`, `2.0.0-beta.1`
///
/// Missing segments count as zero when comparing (`2.0 == 2.0.0`), but the
/// original text is kept so that a lockfile re-encodes to the exact same bytes.
#[derive(Debug, Display, Clone, Deserialize, Serialize)]
#[display("{text}")]
#[serde(try_from = "String", into = "String")]
pub struct PodVersion {
    text: String,
    segments: usize,
    semver: Version,
}

/// Error when parsing [`PodVersion`] from a string.
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum ParsePodVersionError {
    #[display("Version is empty")]
    #[diagnostic(code(podvend_version::empty_version))]
    Empty,

    #[display("Version {_0:?} has more than three numeric segments")]
    #[diagnostic(code(podvend_version::too_many_segments))]
    TooManySegments(#[error(not(source))] String),

    #[display("Failed to parse version {input:?}: {error}")]
    #[diagnostic(code(podvend_version::invalid_version))]
    Semver {
        input: String,
        #[error(source)]
        error: SemverError,
    },
}

impl PodVersion {
    /// Number of numeric segments that were written, between 1 and 3.
    pub fn segments(&self) -> usize {
        self.segments
    }

    /// The version padded to a full semver triple.
    pub fn as_semver(&self) -> &Version {
        &self.semver
    }

    /// Whether the version carries a pre-release suffix such as `-beta.1`.
    pub fn is_prerelease(&self) -> bool {
        !self.semver.pre_release.is_empty()
    }

    /// Exclusive upper bound of `~> self`.
    ///
    /// The last written segment is dropped and the one before it is bumped:
    /// `~> 1.3.2` stays below `1.4`, while `~> 1.3` and `~> 1` stay below `2`.
    pub fn compatible_upper_bound(&self) -> Version {
        let Version { major, minor, .. } = self.semver;
        let (major, minor) = match self.segments {
            3 => (major, minor + 1),
            _ => (major + 1, 0),
        };
        Version { major, minor, patch: 0, build: vec![], pre_release: vec![] }
    }
}

impl FromStr for PodVersion {
    type Err = ParsePodVersionError;
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let text = value.trim();
        if text.is_empty() {
            return Err(ParsePodVersionError::Empty);
        }

        let core_len = text.find(['-', '+']).unwrap_or(text.len());
        let (core, suffix) = text.split_at(core_len);
        let segments = core.split('.').count();
        let padded = match segments {
            1 => format!("{core}.0.0{suffix}"),
            2 => format!("{core}.0{suffix}"),
            3 => text.to_string(),
            _ => return Err(ParsePodVersionError::TooManySegments(text.to_string())),
        };

        let semver = padded
            .parse::<Version>()
            .map_err(|error| ParsePodVersionError::Semver { input: text.to_string(), error })?;

        Ok(PodVersion { text: text.to_string(), segments, semver })
    }
}

impl TryFrom<String> for PodVersion {
    type Error = ParsePodVersionError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PodVersion> for String {
    fn from(value: PodVersion) -> Self {
        value.text
    }
}

impl PartialEq for PodVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PodVersion {}

impl PartialOrd for PodVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PodVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.semver.cmp(&other.semver)
    }
}

impl Hash for PodVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let Version { major, minor, patch, .. } = self.semver;
        (major, minor, patch).hash(state);
    }
}
