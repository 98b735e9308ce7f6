use crate::{ParseConstraintError, PodVersion, VersionConstraint};
use derive_more::{Display, Error};
use miette::Diagnostic;
use pipe_trait::Pipe;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Named edge to a pod with a version constraint.
///
/// Syntax: `{name}` or `{name} ({constraint})`
///
/// Examples: `KissXML`, `AFNetworking (~> 1.3.2)`, `Foo (> 1.0, < 2.0)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dependency {
    pub name: String,
    pub constraint: VersionConstraint,
}

/// Error when parsing [`Dependency`] from a string.
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum ParseDependencyError {
    #[display("Dependency {_0:?} has no name")]
    #[diagnostic(code(podvend_version::empty_dependency_name))]
    EmptyName(#[error(not(source))] String),

    #[display("Dependency {_0:?} is missing a closing parenthesis")]
    #[diagnostic(code(podvend_version::missing_closing_paren))]
    MissingClosingParen(#[error(not(source))] String),

    #[display("Dependency {input:?} has an invalid constraint: {error}")]
    #[diagnostic(code(podvend_version::invalid_dependency_constraint))]
    InvalidConstraint {
        input: String,
        #[error(source)]
        error: ParseConstraintError,
    },
}

impl Dependency {
    pub fn new(name: impl Into<String>, constraint: VersionConstraint) -> Self {
        Dependency { name: name.into(), constraint }
    }

    /// Dependency without a version constraint.
    pub fn any(name: impl Into<String>) -> Self {
        Dependency::new(name, VersionConstraint::any())
    }

    /// Whether `name@version` satisfies this dependency.
    pub fn matches(&self, name: &str, version: &PodVersion) -> bool {
        self.name == name && self.constraint.matches(version)
    }
}

impl FromStr for Dependency {
    type Err = ParseDependencyError;
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        let (name, constraint) = match value.split_once('(') {
            None => (value, VersionConstraint::any()),
            Some((name, rest)) => {
                let constraint = rest
                    .strip_suffix(')')
                    .ok_or_else(|| ParseDependencyError::MissingClosingParen(value.to_string()))?
                    .parse::<VersionConstraint>()
                    .map_err(|error| ParseDependencyError::InvalidConstraint {
                        input: value.to_string(),
                        error,
                    })?;
                (name.trim_end(), constraint)
            }
        };
        if name.is_empty() {
            return value.to_string().pipe(ParseDependencyError::EmptyName).pipe(Err);
        }
        Ok(Dependency::new(name, constraint))
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Dependency { name, constraint } = self;
        if constraint.is_any() {
            write!(f, "{name}")
        } else {
            write!(f, "{name} ({constraint})")
        }
    }
}

impl TryFrom<String> for Dependency {
    type Error = ParseDependencyError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dependency> for String {
    fn from(value: Dependency) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_and_display() {
        macro_rules! case {
            ($input:expr => $name:expr, $constraint:expr, $display:expr) => {{
                let input = $input;
                eprintln!("CASE: {input:?}");
                let received: Dependency = input.parse().unwrap();
                assert_eq!(received.name, $name);
                assert_eq!(received.constraint.to_string(), $constraint);
                assert_eq!(received.to_string(), $display);
            }};
        }

        case!("KissXML" => "KissXML", ">= 0", "KissXML");
        case!("AFNetworking (~> 1.3.2)" => "AFNetworking", "~> 1.3.2", "AFNetworking (~> 1.3.2)");
        case!("AFNetworking (1.3.2)" => "AFNetworking", "= 1.3.2", "AFNetworking (= 1.3.2)");
        case!("Foo (> 1.0, < 2.0)" => "Foo", "> 1.0, < 2.0", "Foo (> 1.0, < 2.0)");
    }

    #[test]
    fn matches_name_and_version() {
        let dependency: Dependency = "AFNetworking (>= 0.9)".parse().unwrap();
        assert!(dependency.matches("AFNetworking", &"1.3.2".parse().unwrap()));
        assert!(!dependency.matches("KissXML", &"1.3.2".parse().unwrap()));
        assert!(!dependency.matches("AFNetworking", &"0.8".parse().unwrap()));
    }

    #[test]
    fn reject_invalid_input() {
        assert!(matches!("".parse::<Dependency>(), Err(ParseDependencyError::EmptyName(_))));
        assert!(matches!(
            " (1.0)".parse::<Dependency>(),
            Err(ParseDependencyError::EmptyName(_)),
        ));
        assert!(matches!(
            "Foo (1.0".parse::<Dependency>(),
            Err(ParseDependencyError::MissingClosingParen(_)),
        ));
        assert!(matches!(
            "Foo (~ 1.0)".parse::<Dependency>(),
            Err(ParseDependencyError::InvalidConstraint { .. }),
        ));
    }

    #[test]
    fn serde_uses_plain_strings() {
        let received: Vec<Dependency> =
            serde_json::from_str(r#"["InflectorKit", "AFNetworking (~> 1.3.2)"]"#).unwrap();
        assert_eq!(received[1].name, "AFNetworking");
        assert_eq!(
            serde_json::to_string(&received).unwrap(),
            r#"["InflectorKit","AFNetworking (~> 1.3.2)"]"#,
        );
    }
}
