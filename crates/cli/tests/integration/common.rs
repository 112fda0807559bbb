//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

pub const A: &str = "6f1c1f0e-3c39-4e55-9f55-3e0b4bd0a001";
pub const B: &str = "6f1c1f0e-3c39-4e55-9f55-3e0b4bd0a002";

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the preference file,
/// the simulated device storage and the config file.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Environment whose preference file holds `strings` and `ints`.
  pub fn with_prefs(strings: serde_json::Value, ints: serde_json::Value) -> Self {
    let env = Self::empty();
    let doc = serde_json::json!({ "version": 1, "strings": strings, "ints": ints });
    std::fs::write(env.prefs_path(), serde_json::to_string_pretty(&doc).unwrap()).unwrap();
    env
  }

  fn root(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path()).unwrap_or_else(|_| self.temp.path().to_path_buf())
  }

  pub fn prefs_path(&self) -> PathBuf {
    self.root().join("prefs.json")
  }

  pub fn device_path(&self) -> PathBuf {
    self.root().join("device.json")
  }

  pub fn config_path(&self) -> PathBuf {
    self.root().join("config.toml")
  }

  /// Write a file relative to the temp directory and return its path.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.root().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  /// Parsed preference file.
  pub fn prefs(&self) -> serde_json::Value {
    let raw = std::fs::read_to_string(self.prefs_path()).unwrap();
    serde_json::from_str(&raw).unwrap()
  }

  /// Preference string value, if present.
  pub fn pref_string(&self, key: &str) -> Option<String> {
    self.prefs()["strings"][key].as_str().map(str::to_string)
  }

  /// Get a pre-configured Command for the anchorkeep binary.
  ///
  /// Points every file location at the temp directory and clears `RUST_LOG`
  /// so log output does not leak into assertions.
  pub fn cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("anchorkeep");
    cmd.env("ANCHORKEEP_PREFS", self.prefs_path());
    cmd.env("ANCHORKEEP_DEVICE", self.device_path());
    cmd.env("ANCHORKEEP_CONFIG", self.config_path());
    cmd.env("XDG_DATA_HOME", self.root().join("data"));
    cmd.env("XDG_CONFIG_HOME", self.root().join("config"));
    cmd.env("APPDATA", self.root().join("data")); // For Windows
    cmd.env_remove("RUST_LOG");
    cmd
  }
}
