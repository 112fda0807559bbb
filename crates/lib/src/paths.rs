//! Filesystem locations for preferences, simulated device storage and config.
//!
//! Follows XDG on unix and `%APPDATA%` on Windows. Each file location can be
//! overridden with an environment variable, which is how tests and the CLI
//! isolate state.

use std::path::{Path, PathBuf};

use crate::consts::{APP_NAME, CONFIG_FILENAME, DEVICE_FILENAME, LOCK_FILENAME, PREFS_FILENAME};

/// Overrides the preference file location.
pub const PREFS_ENV: &str = "ANCHORKEEP_PREFS";
/// Overrides the simulated device storage location.
pub const DEVICE_ENV: &str = "ANCHORKEEP_DEVICE";
/// Overrides the config file location.
pub const CONFIG_ENV: &str = "ANCHORKEEP_CONFIG";

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  std::env::var("USERPROFILE")
    .map(PathBuf::from)
    .unwrap_or_else(|_| PathBuf::from("."))
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  std::env::var("HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| PathBuf::from("."))
}

/// Returns the directory for configuration files for the application
#[cfg(windows)]
pub fn config_dir() -> PathBuf {
  std::env::var("APPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir())
    .join(APP_NAME)
}

/// Returns the directory for configuration files for the application
#[cfg(not(windows))]
pub fn config_dir() -> PathBuf {
  let config_home = std::env::var("XDG_CONFIG_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".config"));
  config_home.join(APP_NAME)
}

/// Returns the directory for data files for the application
#[cfg(windows)]
pub fn data_dir() -> PathBuf {
  std::env::var("APPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir())
    .join(APP_NAME)
}

/// Returns the directory for data files for the application
#[cfg(not(windows))]
pub fn data_dir() -> PathBuf {
  let data_home = std::env::var("XDG_DATA_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".local").join("share"));
  data_home.join(APP_NAME)
}

fn env_path_or(var: &str, default: impl FnOnce() -> PathBuf) -> PathBuf {
  match std::env::var(var) {
    Ok(path) if !path.is_empty() => PathBuf::from(path),
    _ => default(),
  }
}

/// Preference file holding the save-list and per-anchor kinds.
pub fn prefs_path() -> PathBuf {
  env_path_or(PREFS_ENV, || data_dir().join(PREFS_FILENAME))
}

/// Device storage file used by the simulated anchor platform.
pub fn device_path() -> PathBuf {
  env_path_or(DEVICE_ENV, || data_dir().join(DEVICE_FILENAME))
}

pub fn config_path() -> PathBuf {
  env_path_or(CONFIG_ENV, || config_dir().join(CONFIG_FILENAME))
}

/// Lock file guarding the preference file at `prefs`; lives next to it.
pub fn lock_path_for(prefs: &Path) -> PathBuf {
  match prefs.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent.join(LOCK_FILENAME),
    _ => PathBuf::from(LOCK_FILENAME),
  }
}
