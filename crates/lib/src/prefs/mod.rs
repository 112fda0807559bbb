//! Durable key-value preference storage.
//!
//! The store holds string and integer values under string keys and is the only
//! thing that survives a restart. Higher layers (the identifier registry) own
//! the key naming; nothing else should touch raw keys.

mod file;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::PREFS_VERSION;
use crate::util::json_file::JsonFileError;

pub use file::FilePrefs;

/// Errors raised by a preference store.
#[derive(Debug, Error)]
pub enum PrefsError {
  #[error(transparent)]
  File(#[from] JsonFileError),

  #[error("unsupported preference file version: {0}")]
  UnsupportedVersion(u32),
}

/// Durable key-value storage.
///
/// Reads never fail: a missing key is reported as `None`. Writes persist
/// immediately and report failure through [`PrefsError`].
pub trait PrefsStore {
  fn get_string(&self, key: &str) -> Option<String>;

  fn get_int(&self, key: &str) -> Option<i64>;

  fn has_key(&self, key: &str) -> bool;

  /// All keys currently present, in sorted order.
  fn keys(&self) -> Vec<String>;

  fn set_string(&mut self, key: &str, value: &str) -> Result<(), PrefsError>;

  fn set_int(&mut self, key: &str, value: i64) -> Result<(), PrefsError>;

  /// Remove a key. Removing an absent key is not an error.
  fn delete_key(&mut self, key: &str) -> Result<(), PrefsError>;
}

/// Serialized contents of a preference store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefsData {
  pub version: u32,
  #[serde(default)]
  pub strings: BTreeMap<String, String>,
  #[serde(default)]
  pub ints: BTreeMap<String, i64>,
}

impl Default for PrefsData {
  fn default() -> Self {
    Self {
      version: PREFS_VERSION,
      strings: BTreeMap::new(),
      ints: BTreeMap::new(),
    }
  }
}

impl PrefsData {
  fn has_key(&self, key: &str) -> bool {
    self.strings.contains_key(key) || self.ints.contains_key(key)
  }

  fn keys(&self) -> Vec<String> {
    let mut keys: Vec<String> = self.strings.keys().chain(self.ints.keys()).cloned().collect();
    keys.sort();
    keys.dedup();
    keys
  }

  /// A key holds one value; writing one type replaces the other.
  fn set_string(&mut self, key: &str, value: &str) {
    self.ints.remove(key);
    self.strings.insert(key.to_string(), value.to_string());
  }

  fn set_int(&mut self, key: &str, value: i64) {
    self.strings.remove(key);
    self.ints.insert(key.to_string(), value);
  }

  /// Returns true if anything was removed.
  fn delete_key(&mut self, key: &str) -> bool {
    let removed_string = self.strings.remove(key).is_some();
    let removed_int = self.ints.remove(key).is_some();
    removed_string || removed_int
  }
}

/// In-memory store. Writes never fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryPrefs {
  data: PrefsData,
}

impl MemoryPrefs {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn data(&self) -> &PrefsData {
    &self.data
  }
}

impl PrefsStore for MemoryPrefs {
  fn get_string(&self, key: &str) -> Option<String> {
    self.data.strings.get(key).cloned()
  }

  fn get_int(&self, key: &str) -> Option<i64> {
    self.data.ints.get(key).copied()
  }

  fn has_key(&self, key: &str) -> bool {
    self.data.has_key(key)
  }

  fn keys(&self) -> Vec<String> {
    self.data.keys()
  }

  fn set_string(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
    self.data.set_string(key, value);
    Ok(())
  }

  fn set_int(&mut self, key: &str, value: i64) -> Result<(), PrefsError> {
    self.data.set_int(key, value);
    Ok(())
  }

  fn delete_key(&mut self, key: &str) -> Result<(), PrefsError> {
    self.data.delete_key(key);
    Ok(())
  }
}
