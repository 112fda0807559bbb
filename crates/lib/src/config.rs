//! User configuration, read from `config.toml`.
//!
//! ```toml
//! load_timeout_ms = 5000
//! storage = "local"
//! default_kind = "cube"
//!
//! [palette]
//! saved = "#00ff00"
//! unsaved = "#ff0000"
//! highlight = "#0000ff"
//! ```
//!
//! Every field is optional. A missing or unreadable file yields the defaults.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::anchor::{LoadOptions, StorageLocation};
use crate::paths::config_path;
use crate::scene::Palette;
use crate::types::ObjectKind;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to serialize config: {0}")]
  Serialize(#[from] toml::ser::Error),

  #[error("failed to write config to {path}: {source}")]
  Write {
    path: String,
    #[source]
    source: io::Error,
  },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnchorConfig {
  /// Batch load timeout in milliseconds. Zero leaves it to the platform.
  pub load_timeout_ms: u64,
  pub storage: StorageLocation,
  /// Kind placed when none is given.
  pub default_kind: ObjectKind,
  pub palette: Palette,
}

impl Default for AnchorConfig {
  fn default() -> Self {
    Self {
      load_timeout_ms: 0,
      storage: StorageLocation::Local,
      default_kind: ObjectKind::Wall,
      palette: Palette::default(),
    }
  }
}

impl AnchorConfig {
  /// Load from the default location (see [`config_path`]).
  pub fn load() -> Self {
    Self::load_from_path(&config_path())
  }

  /// Load from `path`, falling back to defaults on any error.
  pub fn load_from_path(path: &Path) -> Self {
    match fs::read_to_string(path) {
      Ok(contents) => match toml::from_str::<AnchorConfig>(&contents) {
        Ok(config) => {
          debug!(path = %path.display(), "loaded config");
          config
        }
        Err(err) => {
          warn!("Failed to parse {}: {err}. Using defaults", path.display());
          AnchorConfig::default()
        }
      },
      Err(err) if err.kind() == io::ErrorKind::NotFound => {
        debug!(path = %path.display(), "no config file, using defaults");
        AnchorConfig::default()
      }
      Err(err) => {
        warn!("Failed to read {}: {err}. Using defaults", path.display());
        AnchorConfig::default()
      }
    }
  }

  pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
    let toml = toml::to_string_pretty(self)?;
    let write_err = |source| ConfigError::Write {
      path: path.display().to_string(),
      source,
    };
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, toml).map_err(write_err)
  }

  pub fn load_timeout(&self) -> Option<Duration> {
    (self.load_timeout_ms > 0).then(|| Duration::from_millis(self.load_timeout_ms))
  }

  pub fn load_options(&self) -> LoadOptions {
    LoadOptions {
      timeout: self.load_timeout(),
      location: self.storage,
    }
  }
}
