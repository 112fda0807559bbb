//! JSON documents on disk with atomic replacement.
//!
//! Writes go to `<file>.tmp` first and are renamed over the target, so a crash
//! mid-write never leaves a truncated document behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors from reading or writing a JSON document.
#[derive(Debug, Error)]
pub enum JsonFileError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to create directory {path}: {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to serialize document: {0}")]
  Serialize(#[source] serde_json::Error),
}

/// Load a document, returning `Ok(None)` if the file does not exist.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, JsonFileError> {
  let content = match fs::read_to_string(path) {
    Ok(content) => content,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
    Err(source) => {
      return Err(JsonFileError::Read {
        path: path.to_path_buf(),
        source,
      });
    }
  };

  let value = serde_json::from_str(&content).map_err(|source| JsonFileError::Parse {
    path: path.to_path_buf(),
    source,
  })?;
  Ok(Some(value))
}

/// Write a document atomically (temp file, then rename).
pub fn save_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), JsonFileError> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent).map_err(|source| JsonFileError::CreateDir {
      path: parent.to_path_buf(),
      source,
    })?;
  }

  let content = serde_json::to_string_pretty(value).map_err(JsonFileError::Serialize)?;

  let mut temp_path = path.as_os_str().to_owned();
  temp_path.push(".tmp");
  let temp_path = PathBuf::from(temp_path);

  let write_err = |source| JsonFileError::Write {
    path: path.to_path_buf(),
    source,
  };
  fs::write(&temp_path, &content).map_err(write_err)?;
  fs::rename(&temp_path, path).map_err(write_err)?;

  Ok(())
}
