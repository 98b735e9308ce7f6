use crate::{FetchCause, FetchError, Fetcher};
use podvend_catalog::{PackageSpec, PodSource};
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use tokio::fs;

/// Per-user cache of fetched pod sources, shared across projects.
///
/// Layout: `<root>/<name>/<version>/` holds the sources and `<root>/<name>/<version>.checksum`
/// the checksum of the podspec they were fetched for.
#[derive(Debug, Clone)]
pub struct PodStore {
    root: PathBuf,
}

impl PodStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        PodStore { root: root.into() }
    }

    pub fn root(&self) -> &'_ Path {
        &self.root
    }

    /// Directory of the cached sources of `spec`.
    pub fn pod_dir(&self, spec: &PackageSpec) -> PathBuf {
        self.root.join(&spec.name).join(spec.version.to_string())
    }

    fn checksum_path(&self, spec: &PackageSpec) -> PathBuf {
        self.root.join(&spec.name).join(format!("{}.checksum", spec.version))
    }

    /// Whether up-to-date sources of `spec` are cached.
    ///
    /// Local path sources are never considered cached since they may change at any time.
    pub async fn contains(&self, spec: &PackageSpec) -> bool {
        if matches!(spec.source, PodSource::Path { .. }) {
            return false;
        }
        match fs::read_to_string(self.checksum_path(spec)).await {
            Ok(checksum) => checksum.trim() == spec.checksum() && self.pod_dir(spec).is_dir(),
            Err(_) => false,
        }
    }

    /// Make sure the sources of `spec` are in the store, fetching them if needed, and return
    /// their directory.
    pub async fn ensure<Fetch>(
        &self,
        fetcher: &Fetch,
        spec: &PackageSpec,
    ) -> Result<PathBuf, FetchError>
    where
        Fetch: Fetcher + ?Sized,
    {
        if self.contains(spec).await {
            tracing::debug!(target: "podvend::fetch", pod = %spec.to_pin_string(), "Store hit");
            return Ok(self.pod_dir(spec));
        }
        self.fetch(fetcher, spec).await
    }

    /// Fetch the sources of `spec` into the store, replacing any cached copy.
    ///
    /// Sources are fetched into a partial directory which is renamed into place once complete.
    pub async fn fetch<Fetch>(
        &self,
        fetcher: &Fetch,
        spec: &PackageSpec,
    ) -> Result<PathBuf, FetchError>
    where
        Fetch: Fetcher + ?Sized,
    {
        let pod_dir = self.pod_dir(spec);
        let store_error = |path: &Path, error: io::Error| {
            FetchError::new(&spec.name, FetchCause::Store { path: path.to_path_buf(), error })
        };
        let parent = self.root.join(&spec.name);
        fs::create_dir_all(&parent).await.map_err(|error| store_error(&parent, error))?;

        let partial_dir = parent.join(format!(".{}.partial-{}", spec.version, std::process::id()));
        remove_dir_if_exists(&partial_dir)
            .await
            .map_err(|error| store_error(&partial_dir, error))?;
        if let Err(error) = fetcher.fetch(spec, &partial_dir).await {
            remove_dir_if_exists(&partial_dir).await.ok();
            return Err(error);
        }

        let checksum_path = self.checksum_path(spec);
        remove_file_if_exists(&checksum_path)
            .await
            .map_err(|error| store_error(&checksum_path, error))?;
        remove_dir_if_exists(&pod_dir).await.map_err(|error| store_error(&pod_dir, error))?;
        fs::rename(&partial_dir, &pod_dir).await.map_err(|error| store_error(&pod_dir, error))?;
        fs::write(&checksum_path, spec.checksum())
            .await
            .map_err(|error| store_error(&checksum_path, error))?;

        tracing::info!(target: "podvend::fetch", pod = %spec.to_pin_string(), ?pod_dir, "Fetched");
        Ok(pod_dir)
    }
}

async fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path).await {
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
        result => result,
    }
}

async fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path).await {
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
        result => result,
    }
}
