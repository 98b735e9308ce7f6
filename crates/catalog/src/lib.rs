mod memory_source;
mod package_spec;
mod spec_repo;

pub use memory_source::MemorySource;
pub use package_spec::{BuildSettings, PackageSpec, PodSource};
pub use spec_repo::{SpecRepo, PODSPEC_EXTENSION};

use derive_more::{Display, Error};
use miette::Diagnostic;
use podvend_version::PodVersion;
use std::{io, path::PathBuf, sync::Arc};

/// Error type of [`PackageSource`].
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum CatalogError {
    #[display("Pod {name:?} isn't known to the spec repository")]
    #[diagnostic(code(podvend_catalog::pod_not_found))]
    PodNotFound { name: String },

    #[display("Pod {name:?} has no version {version}")]
    #[diagnostic(code(podvend_catalog::version_not_found))]
    VersionNotFound { name: String, version: PodVersion },

    #[display("Failed to list versions in {dir:?}: {error}")]
    #[diagnostic(code(podvend_catalog::read_dir))]
    ReadDir {
        dir: PathBuf,
        #[error(source)]
        error: io::Error,
    },

    #[display("Failed to read podspec at {path:?}: {error}")]
    #[diagnostic(code(podvend_catalog::read_spec))]
    ReadSpec {
        path: PathBuf,
        #[error(source)]
        error: io::Error,
    },

    #[display("Failed to parse podspec at {path:?}: {error}")]
    #[diagnostic(code(podvend_catalog::parse_spec))]
    ParseSpec {
        path: PathBuf,
        #[error(source)]
        error: serde_json::Error,
    },

    #[display("Podspec at {path:?} describes {found}, expected {expected}")]
    #[diagnostic(code(podvend_catalog::spec_mismatch))]
    SpecMismatch { path: PathBuf, expected: String, found: String },
}

/// Provider of pod metadata.
pub trait PackageSource {
    /// Every published version of `name`, in no particular order.
    ///
    /// Fails with [`CatalogError::PodNotFound`] when the pod doesn't exist at all.
    fn versions(&self, name: &str) -> Result<Vec<PodVersion>, CatalogError>;

    /// The podspec of `name` at `version`.
    fn spec(&self, name: &str, version: &PodVersion) -> Result<Arc<PackageSpec>, CatalogError>;
}

impl<Source: PackageSource + ?Sized> PackageSource for &Source {
    fn versions(&self, name: &str) -> Result<Vec<PodVersion>, CatalogError> {
        (**self).versions(name)
    }

    fn spec(&self, name: &str, version: &PodVersion) -> Result<Arc<PackageSpec>, CatalogError> {
        (**self).spec(name, version)
    }
}
