use podvend_version::PodVersion;
use serde::{de, Deserialize, Deserializer};
use std::{env, path::PathBuf, str::FromStr};

pub fn default_vendor_dir() -> PathBuf {
    PathBuf::from("vendor")
}

pub fn default_bridgesupport_file() -> String {
    "Pods.bridgesupport".to_string()
}

/// Use the number of CPUs, but never fewer than 16.
pub fn default_fetch_concurrency() -> usize {
    const MIN_PERMITS: usize = 16;
    num_cpus::get().max(MIN_PERMITS)
}

/// If the $PODVEND_HOME env variable is set, then $PODVEND_HOME/store
/// If the $XDG_DATA_HOME env variable is set, then $XDG_DATA_HOME/podvend/store
/// On Windows: ~/AppData/Local/podvend/store
/// On macOS: ~/Library/podvend/store
/// Elsewhere: ~/.local/share/podvend/store
pub fn default_store_dir() -> PathBuf {
    store_dir_from(|name| env::var(name).ok(), home::home_dir())
}

pub(crate) fn store_dir_from(
    env_var: impl Fn(&str) -> Option<String>,
    home_dir: Option<PathBuf>,
) -> PathBuf {
    if let Some(podvend_home) = env_var("PODVEND_HOME") {
        return PathBuf::from(podvend_home).join("store");
    }

    if let Some(xdg_data_home) = env_var("XDG_DATA_HOME") {
        return PathBuf::from(xdg_data_home).join("podvend/store");
    }

    // relative to the project directory when there is no home
    let Some(home_dir) = home_dir else {
        return PathBuf::from(".podvend/store");
    };

    match env::consts::OS {
        "macos" => home_dir.join("Library/podvend/store"),
        "windows" => home_dir.join("AppData/Local/podvend/store"),
        _ => home_dir.join(".local/share/podvend/store"),
    }
}

/// If the $PODVEND_HOME env variable is set, then $PODVEND_HOME/specs, otherwise ~/.podvend/specs
pub fn default_spec_repo() -> PathBuf {
    spec_repo_from(|name| env::var(name).ok(), home::home_dir())
}

pub(crate) fn spec_repo_from(
    env_var: impl Fn(&str) -> Option<String>,
    home_dir: Option<PathBuf>,
) -> PathBuf {
    if let Some(podvend_home) = env_var("PODVEND_HOME") {
        return PathBuf::from(podvend_home).join("specs");
    }
    home_dir.unwrap_or_default().join(".podvend/specs")
}

pub fn deserialize_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    bool::from_str(&s).map_err(de::Error::custom)
}

pub fn deserialize_usize<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match usize::from_str(&s).map_err(de::Error::custom)? {
        0 => Err(de::Error::custom("value must be at least 1")),
        value => Ok(value),
    }
}

pub fn deserialize_pathbuf<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    PathBuf::from_str(&s).map_err(de::Error::custom)
}

pub fn deserialize_version<'de, D>(deserializer: D) -> Result<Option<PodVersion>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.trim().is_empty() {
        return Ok(None);
    }
    s.parse::<PodVersion>().map(Some).map_err(de::Error::custom)
}
