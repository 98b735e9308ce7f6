use derive_more::{Display, Error};
use miette::Diagnostic;
use pipe_trait::Pipe;
use podvend_catalog::SpecRepo;
use podvend_config::Config;
use podvend_fetcher::SourceFetcher;
use podvend_manifest::{ManifestError, Podfile};
use podvend_network::ThrottledClient;
use std::path::PathBuf;

/// Application state when running `podvend install` or `podvend build-settings`.
pub struct State {
    /// Configuration read from `.podvendrc`.
    pub config: &'static Config,
    /// Data from the `Podfile.json` file, with the configured deployment target applied.
    pub podfile: Podfile,
    /// Podspecs of the spec repository.
    pub source: SpecRepo,
    /// Fetcher of pod sources.
    pub fetcher: SourceFetcher,
}

/// Error type of [`State::init`].
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum InitStateError {
    #[diagnostic(transparent)]
    LoadManifest(#[error(source)] ManifestError),
}

impl State {
    /// Initialize the application state.
    pub fn init(podfile_path: PathBuf, config: &'static Config) -> Result<Self, InitStateError> {
        Ok(State {
            config,
            podfile: podfile_path
                .pipe(Podfile::from_path)
                .map_err(InitStateError::LoadManifest)?
                .with_default_deployment_target(config.deployment_target.clone()),
            source: SpecRepo::new(config.spec_repo.clone()),
            fetcher: config
                .fetch_concurrency
                .pipe(ThrottledClient::new_with_permits)
                .pipe(SourceFetcher::new),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podvend_manifest::PlatformName;
    use podvend_testing_utils::fixtures::AfFixture;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn apply_configured_deployment_target() {
        let dir = tempdir().unwrap();
        let podfile_path = AfFixture::write_podfile(dir.path());
        let config =
            Config { deployment_target: Some("6.1".parse().unwrap()), ..Config::default() }.leak();

        let state = State::init(podfile_path, config).unwrap();
        let platforms = state.podfile.platforms();
        assert_eq!(platforms.len(), 1);
        assert_eq!(platforms[0].name, PlatformName::Ios);
        assert_eq!(platforms[0].deployment_target.as_ref().unwrap().to_string(), "6.1");
    }

    #[test]
    fn missing_podfile() {
        let dir = tempdir().unwrap();
        let config = Config::default().leak();
        let error = State::init(dir.path().join("Podfile.json"), config).err().unwrap();
        assert!(matches!(error, InitStateError::LoadManifest(ManifestError::NotFound(_))));
    }
}
