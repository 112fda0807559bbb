//! File-backed preference store.
//!
//! # Storage Layout
//!
//! ```text
//! {data_dir}/prefs.json
//! ```
//!
//! ```json
//! {
//!   "version": 1,
//!   "strings": {
//!     "anchor_ids": "67e55044-10b1-426f-9247-bb680e5fe0c8",
//!     "anchor_67e55044-10b1-426f-9247-bb680e5fe0c8": "67e55044-10b1-426f-9247-bb680e5fe0c8",
//!     "type_67e55044-10b1-426f-9247-bb680e5fe0c8": "cube"
//!   },
//!   "ints": {}
//! }
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{PrefsData, PrefsError, PrefsStore};
use crate::consts::PREFS_VERSION;
use crate::paths::prefs_path;
use crate::util::json_file;

/// Preference store persisted as a single JSON document.
///
/// The whole document is rewritten atomically on every write.
#[derive(Debug, Clone)]
pub struct FilePrefs {
  path: PathBuf,
  data: PrefsData,
}

impl FilePrefs {
  /// Open the store at `path`. A missing file yields an empty store.
  pub fn open(path: impl Into<PathBuf>) -> Result<Self, PrefsError> {
    let path = path.into();
    let data = match json_file::load::<PrefsData>(&path)? {
      Some(data) => {
        if data.version != PREFS_VERSION {
          return Err(PrefsError::UnsupportedVersion(data.version));
        }
        info!(path = %path.display(), keys = data.strings.len() + data.ints.len(), "loaded preferences");
        data
      }
      None => {
        debug!(path = %path.display(), "no preference file, starting empty");
        PrefsData::default()
      }
    };

    Ok(Self { path, data })
  }

  /// Open the store at the default location (see [`prefs_path`]).
  pub fn open_default() -> Result<Self, PrefsError> {
    Self::open(prefs_path())
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn persist(&self) -> Result<(), PrefsError> {
    json_file::save_atomic(&self.path, &self.data)?;
    Ok(())
  }
}

impl PrefsStore for FilePrefs {
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
    self.persist()
  }

  fn set_int(&mut self, key: &str, value: i64) -> Result<(), PrefsError> {
    self.data.set_int(key, value);
    self.persist()
  }

  fn delete_key(&mut self, key: &str) -> Result<(), PrefsError> {
    if self.data.delete_key(key) {
      self.persist()?;
    }
    Ok(())
  }
}
