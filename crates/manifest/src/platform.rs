use derive_more::Display;
use podvend_version::PodVersion;
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

/// Operating system family a target builds for.
#[derive(
    Debug,
    Display,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Deserialize,
    Serialize,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlatformName {
    #[default]
    #[display("iOS")]
    Ios,
    #[display("OS X")]
    Osx,
    #[display("tvOS")]
    Tvos,
    #[display("watchOS")]
    Watchos,
}

/// Platform of a build target with an optional minimum deployment target.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Platform {
    pub name: PlatformName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_target: Option<PodVersion>,
}

impl Platform {
    pub fn new(name: PlatformName, deployment_target: Option<PodVersion>) -> Self {
        Platform { name, deployment_target }
    }

    /// Whether a pod that needs at least `minimum` on this platform can be used.
    ///
    /// A target without a deployment target accepts every minimum.
    pub fn accepts_minimum(&self, minimum: Option<&PodVersion>) -> bool {
        match (&self.deployment_target, minimum) {
            (Some(deployment_target), Some(minimum)) => deployment_target >= minimum,
            _ => true,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.deployment_target {
            Some(deployment_target) => write!(f, "{} {deployment_target}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_and_display() {
        assert_eq!("ios".parse::<PlatformName>().unwrap(), PlatformName::Ios);
        assert_eq!("watchos".parse::<PlatformName>().unwrap(), PlatformName::Watchos);
        let platform = Platform::new(PlatformName::Ios, Some("5.0".parse().unwrap()));
        assert_eq!(platform.to_string(), "iOS 5.0");
        assert_eq!(Platform::new(PlatformName::Osx, None).to_string(), "OS X");
    }

    #[test]
    fn accepts_minimum() {
        let version = |text: &str| text.parse::<PodVersion>().unwrap();
        let platform = Platform::new(PlatformName::Ios, Some(version("5.0")));
        assert!(platform.accepts_minimum(Some(&version("4.3"))));
        assert!(platform.accepts_minimum(Some(&version("5"))));
        assert!(!platform.accepts_minimum(Some(&version("6.0"))));
        assert!(platform.accepts_minimum(None));
        assert!(Platform::new(PlatformName::Ios, None).accepts_minimum(Some(&version("9.0"))));
    }
}
