//! Advisory lock on the preference file.
//!
//! Commands that rewrite preferences hold an exclusive lock for their whole
//! run; read-only commands take a shared one. The lock file sits next to the
//! preference file and carries JSON metadata about the holder so a blocked
//! process can say who is in the way.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::paths::lock_path_for;

const LOCK_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
  Shared,
  Exclusive,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LockMetadata {
  pub version: u32,
  pub pid: u32,
  pub started_at_unix: u64,
  pub command: String,
  pub prefs: PathBuf,
}

#[derive(Debug, Error)]
pub enum LockError {
  #[error(
    "preferences are in use by another process: {command} (PID {pid}, since {started_at})\n\
     If no anchorkeep process is running, remove the lock file:\n  {lock_path}",
    lock_path = .lock_path.display()
  )]
  Contention {
    command: String,
    pid: u32,
    started_at: String,
    lock_path: PathBuf,
  },

  #[error(
    "preferences are in use by another process\n\
     If no anchorkeep process is running, remove the lock file:\n  {lock_path}",
    lock_path = .lock_path.display()
  )]
  ContentionUnknown { lock_path: PathBuf },

  #[error("failed to create lock directory: {0}")]
  CreateDir(#[source] io::Error),

  #[error("failed to open lock file: {0}")]
  OpenFile(#[source] io::Error),

  #[error("failed to write lock metadata: {0}")]
  WriteMetadata(#[source] io::Error),

  #[error("failed to acquire lock: {0}")]
  LockFailed(#[source] io::Error),
}

/// Held lock; released when dropped.
#[derive(Debug)]
pub struct PrefsLock {
  file: File,
  lock_path: PathBuf,
}

impl PrefsLock {
  /// Lock the preference file at `prefs` without blocking.
  pub fn acquire(prefs: &Path, mode: LockMode, command: &str) -> Result<Self, LockError> {
    let lock_path = lock_path_for(prefs);
    if let Some(dir) = lock_path.parent()
      && !dir.as_os_str().is_empty()
      && !dir.exists()
    {
      std::fs::create_dir_all(dir).map_err(LockError::CreateDir)?;
    }

    let file = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(false)
      .open(&lock_path)
      .map_err(LockError::OpenFile)?;

    if let Err(err) = try_lock(&file, mode) {
      if err.kind() == io::ErrorKind::WouldBlock {
        return Err(contention_error(&lock_path));
      }
      return Err(LockError::LockFailed(err));
    }

    if mode == LockMode::Exclusive {
      write_metadata(&file, command, prefs)?;
    }
    debug!(path = %lock_path.display(), ?mode, "acquired preferences lock");

    Ok(Self { file, lock_path })
  }

  /// Read the metadata through the held handle. Opening the file again would
  /// fail on Windows while the lock is held.
  pub fn read_metadata(&self) -> io::Result<LockMetadata> {
    let mut file = &self.file;
    file.seek(SeekFrom::Start(0))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    serde_json::from_str(&contents).map_err(io::Error::other)
  }

  pub fn lock_path(&self) -> &Path {
    &self.lock_path
  }
}

fn write_metadata(file: &File, command: &str, prefs: &Path) -> Result<(), LockError> {
  let metadata = LockMetadata {
    version: LOCK_VERSION,
    pid: std::process::id(),
    started_at_unix: SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .unwrap_or_default()
      .as_secs(),
    command: command.to_string(),
    prefs: prefs.to_path_buf(),
  };

  file.set_len(0).map_err(LockError::WriteMetadata)?;
  let mut writer = io::BufWriter::new(file);
  serde_json::to_writer_pretty(&mut writer, &metadata).map_err(|e| LockError::WriteMetadata(io::Error::other(e)))?;
  writer.flush().map_err(LockError::WriteMetadata)
}

fn contention_error(lock_path: &Path) -> LockError {
  let metadata = std::fs::read_to_string(lock_path)
    .ok()
    .and_then(|contents| serde_json::from_str::<LockMetadata>(&contents).ok());

  match metadata {
    Some(metadata) => {
      let started = UNIX_EPOCH + Duration::from_secs(metadata.started_at_unix);
      LockError::Contention {
        command: metadata.command,
        pid: metadata.pid,
        started_at: humantime::format_rfc3339_seconds(started).to_string(),
        lock_path: lock_path.to_path_buf(),
      }
    }
    None => LockError::ContentionUnknown {
      lock_path: lock_path.to_path_buf(),
    },
  }
}

#[cfg(unix)]
fn try_lock(file: &File, mode: LockMode) -> io::Result<()> {
  use rustix::fs::{FlockOperation, flock};
  use std::os::unix::io::AsFd;

  let operation = match mode {
    LockMode::Shared => FlockOperation::NonBlockingLockShared,
    LockMode::Exclusive => FlockOperation::NonBlockingLockExclusive,
  };

  flock(file.as_fd(), operation).map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(windows)]
fn try_lock(file: &File, mode: LockMode) -> io::Result<()> {
  use std::os::windows::io::AsRawHandle;
  use windows_sys::Win32::Foundation::HANDLE;
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, LockFileEx};

  let handle = file.as_raw_handle() as HANDLE;
  let flags = match mode {
    LockMode::Shared => LOCKFILE_FAIL_IMMEDIATELY,
    LockMode::Exclusive => LOCKFILE_FAIL_IMMEDIATELY | LOCKFILE_EXCLUSIVE_LOCK,
  };

  // SAFETY: OVERLAPPED is plain data and valid when zeroed; the handle is
  // owned by `file` for the duration of the call.
  let result = unsafe {
    let mut overlapped = std::mem::zeroed();
    LockFileEx(handle, flags, 0, 1, 0, &mut overlapped)
  };

  if result == 0 {
    Err(io::Error::last_os_error())
  } else {
    Ok(())
  }
}
