mod platform;
mod podfile;
mod requirement;

pub use platform::{Platform, PlatformName};
pub use podfile::{PodEntry, Podfile, TargetDefinition, DEFAULT_TARGET_NAME};
pub use requirement::Requirement;

use derive_more::{Display, Error};
use miette::Diagnostic;
use podvend_version::ParseConstraintError;
use std::path::PathBuf;

/// Error when reading a manifest or turning it into requirements.
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum ManifestError {
    #[display("No Podfile.json was found at {}", _0.display())]
    #[diagnostic(
        code(podvend_manifest::not_found),
        help("Run the command from the directory that holds Podfile.json, or pass --podfile")
    )]
    NotFound(#[error(not(source))] PathBuf),

    #[display("Failed to read {}: {error}", path.display())]
    #[diagnostic(code(podvend_manifest::read_file))]
    ReadFile {
        path: PathBuf,
        #[error(source)]
        error: std::io::Error,
    },

    #[display("Failed to parse {}: {error}", path.display())]
    #[diagnostic(code(podvend_manifest::parse_json))]
    ParseJson {
        path: PathBuf,
        #[error(source)]
        error: serde_json::Error,
    },

    #[display("Target {target:?} declares a pod without a name")]
    #[diagnostic(code(podvend_manifest::empty_name))]
    EmptyName { target: String },

    #[display("Pod {name:?} is declared more than once in target {target:?}")]
    #[diagnostic(code(podvend_manifest::duplicate_requirement))]
    DuplicateRequirement { name: String, target: String },

    #[display("Pod {name:?} in target {target:?} has an invalid constraint: {error}")]
    #[diagnostic(code(podvend_manifest::invalid_constraint))]
    InvalidConstraint {
        name: String,
        target: String,
        #[error(source)]
        error: ParseConstraintError,
    },
}
