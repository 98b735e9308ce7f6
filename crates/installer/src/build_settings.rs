use derive_more::{Display, Error};
use miette::Diagnostic;
use podvend_catalog::{CatalogError, PackageSource};
use podvend_config::Config;
use podvend_lockfile::{LoadLockfileError, Lockfile};
use podvend_manifest::Podfile;
use podvend_resolver::ResolvedGraph;
use podvend_vendor::{aggregate_build_settings, BuildSettingsExport};
use std::path::PathBuf;

/// Error type of [`load_build_settings`].
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum LoadBuildSettingsError {
    #[display("No lockfile at {path:?}")]
    #[diagnostic(code(podvend_installer::not_installed), help("Run `podvend install` first"))]
    NotInstalled { path: PathBuf },

    #[diagnostic(transparent)]
    LoadLockfile(#[error(source)] LoadLockfileError),

    #[diagnostic(transparent)]
    Catalog(#[error(source)] CatalogError),
}

/// Recompute the build settings of the pods pinned by the current lockfile.
///
/// Nothing is written.
pub fn load_build_settings<Source>(
    config: &Config,
    podfile: &Podfile,
    source: &Source,
) -> Result<BuildSettingsExport, LoadBuildSettingsError>
where
    Source: PackageSource + ?Sized,
{
    let path = config.lockfile_path();
    let lockfile = Lockfile::load(&path)
        .map_err(LoadBuildSettingsError::LoadLockfile)?
        .ok_or(LoadBuildSettingsError::NotInstalled { path })?;
    let graph =
        ResolvedGraph::from_pins(source, lockfile.pins()).map_err(LoadBuildSettingsError::Catalog)?;
    Ok(aggregate_build_settings(podfile, &graph, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipe_trait::Pipe;
    use podvend_catalog::SpecRepo;
    use podvend_resolver::Resolver;
    use podvend_testing_utils::fixtures::AfFixture;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn from_current_lockfile() {
        let root = tempdir().unwrap();
        let fixture = AfFixture::write(root.path());
        let project_dir = root.path().join("project");
        let podfile = AfFixture::write_podfile(&project_dir).pipe(Podfile::from_path).unwrap();
        let config = Config { spec_repo: fixture.spec_repo.clone(), ..Config::default() }
            .resolve_relative_to(&project_dir);
        let source = SpecRepo::new(fixture.spec_repo);

        assert!(matches!(
            load_build_settings(&config, &podfile, &source),
            Err(LoadBuildSettingsError::NotInstalled { .. }),
        ));

        let requirements = podfile.requirements().unwrap();
        let graph = Resolver::new(&source, &podfile.platforms()).resolve(&requirements).unwrap();
        Lockfile::from_graph(&graph, &requirements).save(&config.lockfile_path()).unwrap();

        let settings = load_build_settings(&config, &podfile, &source).unwrap();
        assert_eq!(settings, aggregate_build_settings(&podfile, &graph, &config));
        assert!(settings.libs.contains("/usr/lib/libxml2.dylib"));
    }
}
