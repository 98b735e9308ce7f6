use podvend_catalog::PackageSpec;
use podvend_manifest::Podfile;
use podvend_resolver::ResolvedGraph;
use podvend_vendor::BuildSettingsExport;
use std::{path::Path, sync::Arc};

/// What a post-install hook gets to see of a finished installation.
#[derive(Debug, Clone)]
pub struct InstallerRepresentation<'a> {
    /// Installed podspecs sorted by name.
    pub pods: Vec<&'a PackageSpec>,
    pub podfile: &'a Podfile,
    pub build_settings: &'a BuildSettingsExport,
    pub pods_dir: &'a Path,
    pub graph: &'a ResolvedGraph,
}

impl<'a> InstallerRepresentation<'a> {
    pub(crate) fn new(
        podfile: &'a Podfile,
        graph: &'a ResolvedGraph,
        build_settings: &'a BuildSettingsExport,
        pods_dir: &'a Path,
    ) -> Self {
        let pods = graph.iter().map(Arc::as_ref).collect();
        InstallerRepresentation { pods, podfile, build_settings, pods_dir, graph }
    }

    pub fn pod_names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.pods.iter().map(|&spec| spec.name.as_str())
    }
}

/// Handler run once pods are materialized and before the lockfile is written.
pub type PostInstallHook<'a> = Box<dyn FnOnce(&InstallerRepresentation<'_>) + Send + 'a>;
