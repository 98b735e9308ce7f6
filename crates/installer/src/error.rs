use crate::VendorLockError;
use derive_more::{Display, Error};
use miette::Diagnostic;
use podvend_fetcher::FetchError;
use podvend_lockfile::{LoadLockfileError, SaveLockfileError};
use podvend_manifest::ManifestError;
use podvend_resolver::ResolutionError;
use podvend_vendor::MaterializeError;
use std::{io, path::PathBuf};

/// Error type of [`Install`](crate::Install).
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum InstallError {
    #[display("Another installation is running in {path:?}")]
    #[diagnostic(
        code(podvend_installer::vendor_locked),
        help("Wait for the other installation to finish, then try again")
    )]
    VendorLocked { path: PathBuf },

    #[diagnostic(transparent)]
    Guard(#[error(source)] VendorLockError),

    #[diagnostic(transparent)]
    Manifest(#[error(source)] ManifestError),

    #[diagnostic(transparent)]
    LoadLockfile(#[error(source)] LoadLockfileError),

    #[diagnostic(transparent)]
    Resolution(#[error(source)] ResolutionError),

    #[diagnostic(transparent)]
    Fetch(#[error(source)] FetchError),

    #[diagnostic(transparent)]
    Materialize(#[error(source)] MaterializeError),

    #[display("Failed to delete {path:?}: {error}")]
    #[diagnostic(code(podvend_installer::invalidate_artifact))]
    InvalidateArtifact {
        path: PathBuf,
        #[error(source)]
        error: io::Error,
    },

    #[diagnostic(transparent)]
    SaveLockfile(#[error(source)] SaveLockfileError),
}

impl From<VendorLockError> for InstallError {
    fn from(error: VendorLockError) -> Self {
        match error {
            VendorLockError::Locked { path } => InstallError::VendorLocked { path },
            error => InstallError::Guard(error),
        }
    }
}
