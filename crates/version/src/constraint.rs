use crate::{ParsePodVersionError, PodVersion};
use derive_more::{Display, Error};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use split_first_char::SplitFirstChar;
use std::{fmt, str::FromStr};

/// Comparison operator of a [`Clause`].
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    #[display("=")]
    Equal,
    #[display("!=")]
    NotEqual,
    #[display(">")]
    Greater,
    #[display(">=")]
    GreaterOrEqual,
    #[display("<")]
    Less,
    #[display("<=")]
    LessOrEqual,
    /// `~>`, "compatible with".
    #[display("~>")]
    Compatible,
}

/// A single `{operator} {version}` predicate.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash)]
#[display("{operator} {version}")]
pub struct Clause {
    pub operator: Operator,
    pub version: PodVersion,
}

impl Clause {
    /// Check whether `version` satisfies this clause alone.
    pub fn matches(&self, version: &PodVersion) -> bool {
        let Clause { operator, version: bound } = self;
        match operator {
            Operator::Equal => version == bound,
            Operator::NotEqual => version != bound,
            Operator::Greater => version > bound,
            Operator::GreaterOrEqual => version >= bound,
            Operator::Less => version < bound,
            Operator::LessOrEqual => version <= bound,
            Operator::Compatible => {
                version >= bound && *version.as_semver() < bound.compatible_upper_bound()
            }
        }
    }
}

/// Predicate over [`PodVersion`]s: a conjunction of [`Clause`]s.
///
/// Syntax: comma separated clauses, a bare version means `=`.
///
/// Examples: `1.3.2`, `= 1.3.2`, `~> 1.3.2`, `>= 0.9`, `> 1.0, < 2.0`
///
/// An empty constraint accepts every release. Pre-release versions are only accepted when one of
/// the clauses mentions a pre-release itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionConstraint {
    clauses: Vec<Clause>,
}

/// Error when parsing [`VersionConstraint`] from a string.
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum ParseConstraintError {
    #[display("Constraint {_0:?} contains an empty clause")]
    #[diagnostic(code(podvend_version::empty_clause))]
    EmptyClause(#[error(not(source))] String),

    #[display("Unknown operator in {_0:?}")]
    #[diagnostic(code(podvend_version::unknown_operator))]
    UnknownOperator(#[error(not(source))] String),

    #[display("Invalid version in clause {clause:?}: {error}")]
    #[diagnostic(code(podvend_version::invalid_clause_version))]
    InvalidVersion {
        clause: String,
        #[error(source)]
        error: ParsePodVersionError,
    },
}

impl VersionConstraint {
    /// Constraint that accepts every release.
    pub fn any() -> Self {
        VersionConstraint::default()
    }

    /// Constraint that only accepts `version`.
    pub fn exact(version: PodVersion) -> Self {
        VersionConstraint { clauses: vec![Clause { operator: Operator::Equal, version }] }
    }

    /// Build a constraint from its clauses.
    pub fn from_clauses(clauses: impl IntoIterator<Item = Clause>) -> Self {
        VersionConstraint { clauses: clauses.into_iter().collect() }
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_any(&self) -> bool {
        self.clauses.is_empty()
    }

    /// The pinned version if this constraint is a single `=` clause.
    pub fn exact_version(&self) -> Option<&PodVersion> {
        match self.clauses.as_slice() {
            [Clause { operator: Operator::Equal, version }] => Some(version),
            _ => None,
        }
    }

    /// Check whether `version` satisfies every clause.
    pub fn matches(&self, version: &PodVersion) -> bool {
        let allows_prerelease = self.clauses.iter().any(|clause| clause.version.is_prerelease());
        if version.is_prerelease() && !allows_prerelease {
            return false;
        }
        self.clauses.iter().all(|clause| clause.matches(version))
    }

    /// Parse several clause strings, e.g. the tail of `["Foo", "> 1.0", "< 2.0"]`.
    pub fn parse_clauses<'a>(
        clauses: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ParseConstraintError> {
        let mut constraint = VersionConstraint::any();
        for text in clauses {
            constraint.clauses.extend(text.parse::<VersionConstraint>()?.clauses);
        }
        Ok(constraint)
    }
}

fn parse_clause(text: &str) -> Result<Clause, ParseConstraintError> {
    let unknown_operator = || ParseConstraintError::UnknownOperator(text.to_string());
    let (operator, version) = match text.split_first_char() {
        None => return Err(ParseConstraintError::EmptyClause(text.to_string())),
        Some(('~', rest)) => {
            (Operator::Compatible, rest.strip_prefix('>').ok_or_else(unknown_operator)?)
        }
        Some(('!', rest)) => {
            (Operator::NotEqual, rest.strip_prefix('=').ok_or_else(unknown_operator)?)
        }
        Some(('>', rest)) => match rest.strip_prefix('=') {
            Some(rest) => (Operator::GreaterOrEqual, rest),
            None => (Operator::Greater, rest),
        },
        Some(('<', rest)) => match rest.strip_prefix('=') {
            Some(rest) => (Operator::LessOrEqual, rest),
            None => (Operator::Less, rest),
        },
        Some(('=', rest)) => (Operator::Equal, rest),
        Some(_) => (Operator::Equal, text),
    };
    let version = version
        .parse::<PodVersion>()
        .map_err(|error| ParseConstraintError::InvalidVersion { clause: text.to_string(), error })?;
    Ok(Clause { operator, version })
}

impl FromStr for VersionConstraint {
    type Err = ParseConstraintError;
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() || value == "*" {
            return Ok(VersionConstraint::any());
        }
        value
            .split(',')
            .map(str::trim)
            .map(|clause| {
                if clause.is_empty() {
                    return Err(ParseConstraintError::EmptyClause(value.to_string()));
                }
                parse_clause(clause)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|clauses| VersionConstraint { clauses })
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some((first, rest)) = self.clauses.split_first() else {
            return write!(f, ">= 0");
        };
        write!(f, "{first}")?;
        for clause in rest {
            write!(f, ", {clause}")?;
        }
        Ok(())
    }
}

impl TryFrom<String> for VersionConstraint {
    type Error = ParseConstraintError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionConstraint> for String {
    fn from(value: VersionConstraint) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn constraint(text: &str) -> VersionConstraint {
        text.parse().unwrap()
    }

    fn version(text: &str) -> PodVersion {
        text.parse().unwrap()
    }

    #[test]
    fn parse_and_display() {
        macro_rules! case {
            ($input:expr => $output:expr) => {{
                let input = $input;
                eprintln!("CASE: {input:?}");
                assert_eq!(constraint(input).to_string(), $output);
            }};
        }

        case!("1.3.2" => "= 1.3.2");
        case!("= 1.3.2" => "= 1.3.2");
        case!("~>1.3.2" => "~> 1.3.2");
        case!(">= 0.9" => ">= 0.9");
        case!("> 1.0, < 2.0" => "> 1.0, < 2.0");
        case!("!= 1.1" => "!= 1.1");
        case!("" => ">= 0");
        case!("*" => ">= 0");
    }

    #[test]
    fn compatible_with_three_segments_keeps_minor() {
        let compatible = constraint("~> 1.3.2");
        assert!(compatible.matches(&version("1.3.2")));
        assert!(compatible.matches(&version("1.3.3")));
        assert!(!compatible.matches(&version("1.4.0")));
        assert!(!compatible.matches(&version("1.3.1")));
    }

    #[test]
    fn compatible_with_two_segments_keeps_major() {
        let compatible = constraint("~> 1.3");
        assert!(compatible.matches(&version("1.9")));
        assert!(!compatible.matches(&version("2.0")));
    }

    #[test]
    fn range_is_a_conjunction() {
        let range = constraint("> 1.0, < 2.0");
        assert!(range.matches(&version("1.5")));
        assert!(!range.matches(&version("1.0")));
        assert!(!range.matches(&version("2.0")));
    }

    #[test]
    fn exact_ignores_missing_segments() {
        assert!(constraint("2.0").matches(&version("2.0.0")));
        assert_eq!(constraint("= 1.3.2").exact_version(), Some(&version("1.3.2")));
        assert_eq!(constraint(">= 1.3.2").exact_version(), None);
    }

    #[test]
    fn prerelease_requires_opt_in() {
        assert!(!constraint(">= 1.0").matches(&version("2.0.0-beta.1")));
        assert!(constraint(">= 2.0.0-beta").matches(&version("2.0.0-beta.1")));
        assert!(!VersionConstraint::any().matches(&version("1.0-rc1")));
    }

    #[test]
    fn parse_clauses_concatenates() {
        let received = VersionConstraint::parse_clauses(["> 1.0", "< 2.0"]).unwrap();
        assert_eq!(received, constraint("> 1.0, < 2.0"));
    }

    #[test]
    fn reject_invalid_input() {
        assert!(matches!(
            "~ 1.0".parse::<VersionConstraint>(),
            Err(ParseConstraintError::UnknownOperator(_)),
        ));
        assert!(matches!(
            "1.0,,2.0".parse::<VersionConstraint>(),
            Err(ParseConstraintError::EmptyClause(_)),
        ));
        assert!(matches!(
            ">= banana".parse::<VersionConstraint>(),
            Err(ParseConstraintError::InvalidVersion { .. }),
        ));
    }
}
