mod error;
mod store;
mod tarball;

pub use error::{FetchCause, FetchError, NetworkError, ParseIntegrityError, VerifyChecksumError};
pub use store::PodStore;

use async_trait::async_trait;
use podvend_catalog::{PackageSpec, PodSource};
use podvend_fs::copy_dir_all;
use podvend_network::ThrottledClient;
use std::path::Path;

/// Retrieves the sources of a pod.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Place the sources of `spec` into `destination`, which doesn't exist yet.
    async fn fetch(&self, spec: &PackageSpec, destination: &Path) -> Result<(), FetchError>;
}

#[async_trait]
impl<Inner: Fetcher + ?Sized> Fetcher for &Inner {
    async fn fetch(&self, spec: &PackageSpec, destination: &Path) -> Result<(), FetchError> {
        (**self).fetch(spec, destination).await
    }
}

/// [`Fetcher`] that understands every [`PodSource`].
#[derive(Debug, Default)]
pub struct SourceFetcher {
    http_client: ThrottledClient,
}

impl SourceFetcher {
    pub fn new(http_client: ThrottledClient) -> Self {
        SourceFetcher { http_client }
    }
}

#[async_trait]
impl Fetcher for SourceFetcher {
    async fn fetch(&self, spec: &PackageSpec, destination: &Path) -> Result<(), FetchError> {
        let fetch_error = |cause: FetchCause| FetchError::new(&spec.name, cause);
        match &spec.source {
            PodSource::Path { .. } => {
                let source_dir = spec.local_source_dir().unwrap_or_default();
                if !source_dir.is_dir() {
                    return Err(fetch_error(FetchCause::MissingSourceDir(source_dir)));
                }
                tracing::debug!(target: "podvend::fetch", pod = %spec.to_pin_string(), ?source_dir, "Copy local sources");
                let destination = destination.to_path_buf();
                tokio::task::spawn_blocking(move || copy_dir_all(&source_dir, &destination))
                    .await
                    .map_err(|error| fetch_error(FetchCause::TaskJoin(error)))?
                    .map_err(|error| fetch_error(FetchCause::CopyDir(error)))
            }
            PodSource::Http { http, integrity } => {
                tracing::debug!(target: "podvend::fetch", pod = %spec.to_pin_string(), url = ?http, "Download tarball");
                let integrity = integrity.as_deref();
                tarball::download_tarball(&self.http_client, http, integrity, destination)
                    .await
                    .map_err(fetch_error)
            }
        }
    }
}
