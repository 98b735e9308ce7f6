use crate::{InstallError, InstallerRepresentation, PostInstallHook, VendorLock};
use derive_more::Display;
use futures_util::future::join_all;
use pipe_trait::Pipe;
use podvend_catalog::{PackageSource, PackageSpec};
use podvend_config::Config;
use podvend_fetcher::{FetchError, Fetcher, PodStore};
use podvend_lockfile::{Lockfile, LockfileDiff};
use podvend_manifest::{Platform, Podfile, Requirement};
use podvend_resolver::{ResolvedGraph, Resolver};
use podvend_vendor::{aggregate_build_settings, BuildSettingsExport, InstallOutcome, VendorDir};
use std::{fs, io::ErrorKind, path::Path, sync::Arc};
use tokio::sync::Semaphore;

/// Stage of an install run.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    Idle,
    Resolving,
    Materializing,
    HookInvocation,
    Persisting,
    Done,
    Failed,
}

impl InstallState {
    fn transition(&mut self, next: InstallState) {
        tracing::info!(target: "podvend::install", from = %self, to = %next, "Transition");
        *self = next;
    }
}

/// Summary of a successful install run.
#[derive(Debug)]
pub struct InstallReport {
    pub graph: ResolvedGraph,
    pub build_settings: BuildSettingsExport,
    /// Difference between the previous lockfile (or an empty one) and the written one.
    pub diff: LockfileDiff,
    /// Whether the graph was resolved rather than read from the lockfile.
    pub resolved: bool,
    /// Names of the pods whose sources were fetched.
    pub fetched: Vec<String>,
    /// Names of the pods materialized into the vendor directory.
    pub installed: Vec<String>,
    /// Names of the stale pods removed from the vendor directory.
    pub removed: Vec<String>,
    pub lockfile_written: bool,
    /// Whether the derived bridgesupport file was deleted.
    pub artifact_invalidated: bool,
}

/// This subroutine does everything `podvend install` is supposed to do.
#[must_use]
pub struct Install<'a, Source: ?Sized, Fetch: ?Sized> {
    pub config: &'a Config,
    pub podfile: &'a Podfile,
    pub source: &'a Source,
    pub fetcher: &'a Fetch,
    /// Refetch and reinstall every pod.
    pub force: bool,
    /// Ignore the pins of the lockfile.
    pub update: bool,
    pub post_install: Option<PostInstallHook<'a>>,
}

impl<'a, Source, Fetch> Install<'a, Source, Fetch>
where
    Source: PackageSource + ?Sized,
    Fetch: Fetcher + ?Sized,
{
    /// Execute the subroutine.
    pub async fn run(self) -> Result<InstallReport, InstallError> {
        let mut state = InstallState::Idle;
        tracing::info!(target: "podvend::install", "Start all");
        let result = self.run_stages(&mut state).await;
        match &result {
            Ok(_) => {
                state.transition(InstallState::Done);
                tracing::info!(target: "podvend::install", "Complete all");
            }
            Err(error) => {
                tracing::error!(target: "podvend::install", stage = %state, %error, "Install failed");
                state.transition(InstallState::Failed);
            }
        }
        result
    }

    async fn run_stages(self, state: &mut InstallState) -> Result<InstallReport, InstallError> {
        let Install { config, podfile, source, fetcher, force, update, post_install } = self;
        let _guard = VendorLock::acquire(&config.guard_path())?;

        state.transition(InstallState::Resolving);
        let requirements = podfile.requirements().map_err(InstallError::Manifest)?;
        let platforms = podfile.platforms();
        let lockfile_path = config.lockfile_path();
        let previous = Lockfile::load(&lockfile_path).map_err(InstallError::LoadLockfile)?;
        let pinned = match (&previous, update) {
            (Some(previous), false) => reuse_pins(source, previous, &requirements, &platforms),
            _ => None,
        };
        let resolved = pinned.is_none();
        let graph = match pinned {
            Some(graph) => graph,
            None => Resolver::new(source, &platforms)
                .resolve(&requirements)
                .map_err(InstallError::Resolution)?,
        };
        let lockfile = Lockfile::from_graph(&graph, &requirements);

        state.transition(InstallState::Materializing);
        let vendor = VendorDir::from_config(config);
        let Materialized { fetched, installed, removed } = Materialize {
            vendor: &vendor,
            store: &PodStore::new(&config.store_dir),
            fetcher,
            graph: &graph,
            fetch_concurrency: config.fetch_concurrency,
            force,
        }
        .run()
        .await?;
        let build_settings = aggregate_build_settings(podfile, &graph, config);

        state.transition(InstallState::HookInvocation);
        if let Some(post_install) = post_install {
            let representation =
                InstallerRepresentation::new(podfile, &graph, &build_settings, vendor.pods_dir());
            post_install(&representation);
        }

        state.transition(InstallState::Persisting);
        let empty = Lockfile::default();
        let diff = previous.as_ref().unwrap_or(&empty).diff(&lockfile);
        let artifact_invalidated = force || previous.is_none() || diff.pods_changed;
        if artifact_invalidated {
            invalidate_artifact(&config.bridgesupport_path())?;
        }
        let lockfile_written = write_lockfile_if_changed(&lockfile, &lockfile_path)?;

        Ok(InstallReport {
            graph,
            build_settings,
            diff,
            resolved,
            fetched,
            installed,
            removed,
            lockfile_written,
            artifact_invalidated,
        })
    }
}

/// Rebuild the graph from the pins of `lockfile` if they still hold.
fn reuse_pins<Source>(
    source: &Source,
    lockfile: &Lockfile,
    requirements: &[Requirement],
    platforms: &[Platform],
) -> Option<ResolvedGraph>
where
    Source: PackageSource + ?Sized,
{
    if !lockfile.satisfies(requirements) {
        tracing::info!(target: "podvend::install", "Lockfile is outdated");
        return None;
    }
    let graph = match ResolvedGraph::from_pins(source, lockfile.pins()) {
        Ok(graph) => graph,
        Err(error) => {
            tracing::warn!(target: "podvend::install", %error, "Pinned podspec is unavailable");
            return None;
        }
    };
    if let Err(error) = graph.verify(requirements) {
        tracing::warn!(target: "podvend::install", %error, "Pinned podspecs are inconsistent");
        return None;
    }
    let unsupported = graph
        .iter()
        .find(|spec| !platforms.iter().all(|platform| spec.supports(platform)));
    if let Some(spec) = unsupported {
        tracing::info!(target: "podvend::install", pod = %spec.to_pin_string(), "Pin no longer supports the platforms");
        return None;
    }
    tracing::info!(target: "podvend::install", pods = graph.len(), "Reuse lockfile");
    Some(graph)
}

struct Materialized {
    fetched: Vec<String>,
    installed: Vec<String>,
    removed: Vec<String>,
}

/// Bring the vendor directory in line with the graph.
///
/// Every fetch completes before the vendor directory is touched.
#[must_use]
struct Materialize<'a, Fetch: ?Sized> {
    vendor: &'a VendorDir,
    store: &'a PodStore,
    fetcher: &'a Fetch,
    graph: &'a ResolvedGraph,
    fetch_concurrency: usize,
    force: bool,
}

impl<'a, Fetch> Materialize<'a, Fetch>
where
    Fetch: Fetcher + ?Sized,
{
    async fn run(self) -> Result<Materialized, InstallError> {
        let Materialize { vendor, store, fetcher, graph, fetch_concurrency, force } = self;

        let stale: Vec<String> = vendor
            .installed_pods()
            .map_err(InstallError::Materialize)?
            .into_keys()
            .filter(|name| !graph.contains(name))
            .collect();
        let pending: Vec<&Arc<PackageSpec>> =
            graph.iter().filter(|spec| force || !vendor.is_installed(spec)).collect();
        tracing::info!(target: "podvend::install", pending = pending.len(), stale = stale.len(), "Compare vendor directory");

        let semaphore = &Semaphore::new(fetch_concurrency.max(1));
        let fetched = pending
            .iter()
            .map(|&spec| async move {
                let _permit = semaphore.acquire().await.ok();
                let fetched_dir = if force {
                    store.fetch(fetcher, spec).await?
                } else {
                    store.ensure(fetcher, spec).await?
                };
                Ok::<_, FetchError>((spec, fetched_dir))
            })
            .pipe(join_all)
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(InstallError::Fetch)?;

        for name in &stale {
            vendor.remove(name).map_err(InstallError::Materialize)?;
        }

        let mut installed = Vec::new();
        for (spec, fetched_dir) in &fetched {
            if force {
                vendor.remove(&spec.name).map_err(InstallError::Materialize)?;
            }
            let outcome = vendor.install(spec, fetched_dir).map_err(InstallError::Materialize)?;
            if outcome == InstallOutcome::Installed {
                installed.push(spec.name.clone());
            }
        }

        let fetched = fetched.into_iter().map(|(spec, _)| spec.name.clone()).collect();
        Ok(Materialized { fetched, installed, removed: stale })
    }
}

fn invalidate_artifact(path: &Path) -> Result<(), InstallError> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::info!(target: "podvend::install", ?path, "Derived artifact deleted");
            Ok(())
        }
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
        Err(error) => Err(InstallError::InvalidateArtifact { path: path.to_path_buf(), error }),
    }
}

/// Write `lockfile` unless the file already holds the same bytes.
fn write_lockfile_if_changed(lockfile: &Lockfile, path: &Path) -> Result<bool, InstallError> {
    let text = lockfile.encode().map_err(InstallError::SaveLockfile)?;
    if fs::read(path).is_ok_and(|existing| existing == text.as_bytes()) {
        tracing::debug!(target: "podvend::install", ?path, "Lockfile is up to date");
        return Ok(false);
    }
    lockfile.save(path).map_err(InstallError::SaveLockfile)?;
    Ok(true)
}
