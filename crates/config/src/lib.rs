mod custom_deserializer;

use pipe_trait::Pipe;
use podvend_version::PodVersion;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::custom_deserializer::{
    default_bridgesupport_file, default_fetch_concurrency, default_spec_repo, default_store_dir,
    default_vendor_dir, deserialize_bool, deserialize_pathbuf, deserialize_usize,
    deserialize_version,
};

/// Name of the configuration file looked up in the project and home directories.
pub const CONFIG_FILE_NAME: &str = ".podvendrc";

/// Name of the directory inside the vendor root that holds installed pods.
pub const PODS_DIR_NAME: &str = "Pods";

/// Name of the directory inside the pods directory that holds header links.
pub const HEADERS_DIR_NAME: &str = "Headers";

/// Name of the lockfile inside the vendor root.
pub const LOCKFILE_NAME: &str = "Podfile.lock";

/// Name of the guard file inside the vendor root.
pub const GUARD_FILE_NAME: &str = ".install-guard";

/// Settings of one project, read from `.podvendrc`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// The directory that receives the pods, the lockfile and the derived artifacts.
    #[serde(default = "default_vendor_dir", deserialize_with = "deserialize_pathbuf")]
    pub vendor_dir: PathBuf,

    /// The per-user cache of fetched pod sources, shared across projects.
    #[serde(default = "default_store_dir", deserialize_with = "deserialize_pathbuf")]
    pub store_dir: PathBuf,

    /// Local spec repository laid out as `<Name>/<version>/<Name>.podspec.json`.
    #[serde(default = "default_spec_repo", deserialize_with = "deserialize_pathbuf")]
    pub spec_repo: PathBuf,

    /// Deployment target of the host project, inherited by targets that don't pin one.
    #[serde(default, deserialize_with = "deserialize_version")]
    pub deployment_target: Option<PodVersion>,

    /// File name of the derived artifact inside the pods directory.
    #[serde(default = "default_bridgesupport_file")]
    pub bridgesupport_file: String,

    /// Maximum number of pods fetched at the same time.
    #[serde(default = "default_fetch_concurrency", deserialize_with = "deserialize_usize")]
    pub fetch_concurrency: usize,

    /// Print nothing but errors.
    #[serde(default, deserialize_with = "deserialize_bool")]
    pub silent: bool,

    /// Print every installed and removed pod.
    #[serde(default, deserialize_with = "deserialize_bool")]
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            vendor_dir: default_vendor_dir(),
            store_dir: default_store_dir(),
            spec_repo: default_spec_repo(),
            deployment_target: None,
            bridgesupport_file: default_bridgesupport_file(),
            fetch_concurrency: default_fetch_concurrency(),
            silent: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Try loading `.podvendrc` in the project directory, then in the home directory.
    /// If neither is found or readable, use `default`.
    ///
    /// Relative paths are resolved against the project directory.
    pub fn current<Error, CurrentDir, HomeDir, Default>(
        current_dir: CurrentDir,
        home_dir: HomeDir,
        default: Default,
    ) -> Self
    where
        CurrentDir: FnOnce() -> Result<PathBuf, Error>,
        HomeDir: FnOnce() -> Option<PathBuf>,
        Default: FnOnce() -> Config,
    {
        let load = |dir: &Path| -> Option<Config> {
            let path = dir.join(CONFIG_FILE_NAME);
            let text = fs::read_to_string(&path).ok()?;
            match serde_ini::from_str::<Config>(&text) {
                Ok(config) => Some(config),
                Err(error) => {
                    tracing::warn!(target: "podvend::config", ?path, %error, "Ignoring invalid config file");
                    None
                }
            }
        };

        let project_dir = current_dir().ok();
        let config = project_dir
            .as_deref()
            .and_then(load)
            .or_else(|| home_dir().as_deref().and_then(load))
            .unwrap_or_else(default);

        match project_dir {
            Some(project_dir) => config.resolve_relative_to(&project_dir),
            None => config,
        }
    }

    /// Turn every relative path into a path under `project_dir`.
    #[must_use]
    pub fn resolve_relative_to(self, project_dir: &Path) -> Self {
        let resolve =
            |path: PathBuf| if path.is_absolute() { path } else { project_dir.join(path) };
        Config {
            vendor_dir: resolve(self.vendor_dir),
            store_dir: resolve(self.store_dir),
            spec_repo: resolve(self.spec_repo),
            ..self
        }
    }

    /// Persist the config for the whole program.
    pub fn leak(self) -> &'static mut Self {
        self.pipe(Box::new).pipe(Box::leak)
    }

    /// `<vendor>/Pods`
    pub fn pods_dir(&self) -> PathBuf {
        self.vendor_dir.join(PODS_DIR_NAME)
    }

    /// `<vendor>/Pods/Headers`
    pub fn headers_dir(&self) -> PathBuf {
        self.pods_dir().join(HEADERS_DIR_NAME)
    }

    /// `<vendor>/Podfile.lock`
    pub fn lockfile_path(&self) -> PathBuf {
        self.vendor_dir.join(LOCKFILE_NAME)
    }

    /// `<vendor>/Pods/<bridgesupport-file>`
    pub fn bridgesupport_path(&self) -> PathBuf {
        self.pods_dir().join(&self.bridgesupport_file)
    }

    /// `<vendor>/.install-guard`
    pub fn guard_path(&self) -> PathBuf {
        self.vendor_dir.join(GUARD_FILE_NAME)
    }
}
