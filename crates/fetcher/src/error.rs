use derive_more::{Display, Error, From};
use miette::Diagnostic;
use podvend_fs::CopyDirError;
use std::{io, path::PathBuf};
use zune_inflate::errors::InflateDecodeErrors;

#[derive(Debug, Display, Error, Diagnostic)]
#[display("Failed to download {url}: {error}")]
pub struct NetworkError {
    pub url: String,
    #[error(source)]
    pub error: reqwest::Error,
}

#[derive(Debug, Display, Error, Diagnostic)]
#[display("Cannot parse {integrity:?} from {url} as an integrity: {error}")]
pub struct ParseIntegrityError {
    pub url: String,
    pub integrity: String,
    #[error(source)]
    pub error: ssri::Error,
}

#[derive(Debug, Display, Error, Diagnostic)]
#[display("Failed to verify the integrity of {url}: {error}")]
pub struct VerifyChecksumError {
    pub url: String,
    #[error(source)]
    pub error: ssri::Error,
}

/// Reason a pod couldn't be fetched.
#[derive(Debug, Display, Error, From, Diagnostic)]
#[non_exhaustive]
pub enum FetchCause {
    #[diagnostic(code(podvend_fetcher::network))]
    Network(NetworkError),

    #[diagnostic(code(podvend_fetcher::parse_integrity))]
    ParseIntegrity(ParseIntegrityError),

    #[diagnostic(code(podvend_fetcher::verify_checksum))]
    Checksum(VerifyChecksumError),

    #[from(ignore)]
    #[display("Failed to decode gzip: {_0}")]
    #[diagnostic(code(podvend_fetcher::decode_gzip))]
    DecodeGzip(InflateDecodeErrors),

    #[from(ignore)]
    #[display("Failed to unpack tarball into {dir:?}: {error}")]
    #[diagnostic(code(podvend_fetcher::unpack))]
    Unpack {
        dir: PathBuf,
        #[error(source)]
        error: io::Error,
    },

    #[from(ignore)]
    #[display("Source directory {_0:?} doesn't exist")]
    #[diagnostic(code(podvend_fetcher::missing_source_dir))]
    MissingSourceDir(#[error(not(source))] PathBuf),

    #[display("Failed to copy the sources: {_0}")]
    #[diagnostic(code(podvend_fetcher::copy_dir))]
    CopyDir(CopyDirError),

    #[from(ignore)]
    #[display("Failed to update the pod store at {path:?}: {error}")]
    #[diagnostic(code(podvend_fetcher::store))]
    Store {
        path: PathBuf,
        #[error(source)]
        error: io::Error,
    },

    #[from(ignore)]
    #[display("Background task failed: {_0}")]
    #[diagnostic(code(podvend_fetcher::task_join))]
    TaskJoin(tokio::task::JoinError),
}

/// Error type of [`Fetcher::fetch`](crate::Fetcher::fetch).
#[derive(Debug, Display, Error, Diagnostic)]
#[display("Failed to fetch {name}: {cause}")]
#[diagnostic(code(podvend_fetcher::fetch))]
pub struct FetchError {
    pub name: String,
    #[error(source)]
    pub cause: FetchCause,
}

impl FetchError {
    pub fn new(name: impl Into<String>, cause: impl Into<FetchCause>) -> Self {
        FetchError { name: name.into(), cause: cause.into() }
    }
}
