//! Simulated anchor platform.
//!
//! Keeps "device storage" in memory, optionally mirrored to a JSON file so
//! saved anchors survive a process restart. Faults can be injected per
//! operation, and every request is recorded for inspection.
//!
//! # Storage Layout
//!
//! ```json
//! {
//!   "version": 1,
//!   "anchors": {
//!     "67e55044-10b1-426f-9247-bb680e5fe0c8": {
//!       "position": [0.0, 1.0, 2.0],
//!       "rotation": [0.0, 0.0, 0.0, 1.0]
//!     }
//!   }
//! }
//! ```

use std::cell::{Cell, RefCell, RefMut};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::{AnchorPlatform, LoadOptions, PlatformError, PlatformOp, StorageLocation, UnboundAnchor};
use crate::consts::DEVICE_VERSION;
use crate::paths::device_path;
use crate::scene::ObjectHandle;
use crate::types::{AnchorUuid, Pose};
use crate::util::json_file::{self, JsonFileError};

#[derive(Debug, Error)]
pub enum DeviceError {
  #[error(transparent)]
  File(#[from] JsonFileError),

  #[error("unsupported device storage version: {0}")]
  UnsupportedVersion(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DeviceStorage {
  version: u32,
  #[serde(default)]
  anchors: BTreeMap<AnchorUuid, Pose>,
}

impl Default for DeviceStorage {
  fn default() -> Self {
    Self {
      version: DEVICE_VERSION,
      anchors: BTreeMap::new(),
    }
  }
}

/// A request received by the simulated platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
  Create,
  Save(AnchorUuid),
  Erase(AnchorUuid),
  Load(Vec<AnchorUuid>, StorageLocation),
  Localize(AnchorUuid),
}

/// Failures and delays to inject.
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
  pub fail_create: bool,
  pub fail_save: bool,
  pub fail_erase: bool,
  pub fail_load: bool,
  /// Loads from [`StorageLocation::Cloud`] fail as if offline.
  pub cloud_unavailable: bool,
  pub fail_localize: HashSet<AnchorUuid>,
  /// Localization succeeds but no pose is available.
  pub missing_pose: HashSet<AnchorUuid>,
  /// Loaded anchors come back already localized.
  pub already_localized: bool,
  /// Number of scheduler yields before a created anchor is ready.
  pub creation_ticks: u32,
  pub load_latency: Option<Duration>,
}

/// Live anchor handle of the simulated platform.
#[derive(Debug, Clone, PartialEq)]
pub struct SimAnchor {
  uuid: AnchorUuid,
  object: ObjectHandle,
  pose: Pose,
}

impl SimAnchor {
  pub fn uuid(&self) -> AnchorUuid {
    self.uuid
  }

  pub fn object(&self) -> ObjectHandle {
    self.object
  }

  pub fn pose(&self) -> Pose {
    self.pose
  }
}

/// Unbound anchor returned by [`SimulatedPlatform::load_unbound`].
#[derive(Debug)]
pub struct SimUnbound {
  uuid: AnchorUuid,
  pose: Pose,
  localized: Cell<bool>,
  fail_localize: bool,
  pose_missing: bool,
  calls: Rc<RefCell<Vec<PlatformCall>>>,
}

#[async_trait(?Send)]
impl UnboundAnchor for SimUnbound {
  type Anchor = SimAnchor;

  fn uuid(&self) -> AnchorUuid {
    self.uuid
  }

  fn is_localized(&self) -> bool {
    self.localized.get()
  }

  async fn localize(&self) -> bool {
    self.calls.borrow_mut().push(PlatformCall::Localize(self.uuid));
    tokio::task::yield_now().await;
    if self.fail_localize {
      return false;
    }
    self.localized.set(true);
    true
  }

  fn pose(&self) -> Option<Pose> {
    (self.localized.get() && !self.pose_missing).then_some(self.pose)
  }

  fn bind_to(self, object: ObjectHandle) -> SimAnchor {
    SimAnchor {
      uuid: self.uuid,
      object,
      pose: self.pose,
    }
  }
}

/// In-process stand-in for a spatial anchor service.
#[derive(Debug, Default)]
pub struct SimulatedPlatform {
  backing: Option<PathBuf>,
  device: RefCell<DeviceStorage>,
  faults: RefCell<FaultPlan>,
  calls: Rc<RefCell<Vec<PlatformCall>>>,
}

impl SimulatedPlatform {
  /// Platform whose storage lives only as long as the value.
  pub fn new() -> Self {
    Self::default()
  }

  /// Platform whose storage is mirrored to `path`.
  pub fn open(path: impl Into<PathBuf>) -> Result<Self, DeviceError> {
    let path = path.into();
    let device = match json_file::load::<DeviceStorage>(&path)? {
      Some(device) if device.version != DEVICE_VERSION => {
        return Err(DeviceError::UnsupportedVersion(device.version));
      }
      Some(device) => device,
      None => DeviceStorage::default(),
    };
    info!(path = %path.display(), anchors = device.anchors.len(), "opened simulated device storage");

    Ok(Self {
      backing: Some(path),
      device: RefCell::new(device),
      ..Self::default()
    })
  }

  /// Open the device storage at the default location (see [`device_path`]).
  pub fn open_default() -> Result<Self, DeviceError> {
    Self::open(device_path())
  }

  pub fn backing_path(&self) -> Option<&Path> {
    self.backing.as_deref()
  }

  pub fn faults_mut(&self) -> RefMut<'_, FaultPlan> {
    self.faults.borrow_mut()
  }

  pub fn set_faults(&self, faults: FaultPlan) {
    *self.faults.borrow_mut() = faults;
  }

  pub fn calls(&self) -> Vec<PlatformCall> {
    self.calls.borrow().clone()
  }

  pub fn clear_calls(&self) {
    self.calls.borrow_mut().clear();
  }

  /// Identifiers currently held in device storage.
  pub fn stored(&self) -> Vec<AnchorUuid> {
    self.device.borrow().anchors.keys().copied().collect()
  }

  pub fn stored_pose(&self, uuid: &AnchorUuid) -> Option<Pose> {
    self.device.borrow().anchors.get(uuid).copied()
  }

  /// Put an anchor straight into device storage, bypassing `save`.
  pub fn insert_stored(&self, uuid: AnchorUuid, pose: Pose) -> Result<(), DeviceError> {
    self.device.borrow_mut().anchors.insert(uuid, pose);
    self.persist()
  }

  fn persist(&self) -> Result<(), DeviceError> {
    if let Some(path) = &self.backing {
      json_file::save_atomic(path, &*self.device.borrow())?;
      debug!(path = %path.display(), "device storage written");
    }
    Ok(())
  }

  fn record(&self, call: PlatformCall) {
    self.calls.borrow_mut().push(call);
  }
}

#[async_trait(?Send)]
impl AnchorPlatform for SimulatedPlatform {
  type Anchor = SimAnchor;
  type Unbound = SimUnbound;

  fn create(&self, object: ObjectHandle, pose: &Pose) -> SimAnchor {
    self.record(PlatformCall::Create);
    SimAnchor {
      uuid: AnchorUuid::new_v4(),
      object,
      pose: *pose,
    }
  }

  async fn until_created(&self, anchor: &SimAnchor) -> Result<AnchorUuid, PlatformError> {
    let ticks = self.faults.borrow().creation_ticks;
    for _ in 0..ticks {
      tokio::task::yield_now().await;
    }
    if self.faults.borrow().fail_create {
      return Err(PlatformError::new(PlatformOp::Create, "simulated create failure"));
    }
    Ok(anchor.uuid)
  }

  async fn save(&self, anchor: &SimAnchor) -> Result<(), PlatformError> {
    self.record(PlatformCall::Save(anchor.uuid));
    tokio::task::yield_now().await;
    if self.faults.borrow().fail_save {
      return Err(PlatformError::new(PlatformOp::Save, "simulated save failure"));
    }

    let previous = self.device.borrow_mut().anchors.insert(anchor.uuid, anchor.pose);
    if let Err(err) = self.persist() {
      let mut device = self.device.borrow_mut();
      match previous {
        Some(pose) => device.anchors.insert(anchor.uuid, pose),
        None => device.anchors.remove(&anchor.uuid),
      };
      return Err(PlatformError::new(PlatformOp::Save, err.to_string()));
    }
    Ok(())
  }

  async fn erase(&self, anchor: &SimAnchor) -> Result<(), PlatformError> {
    self.record(PlatformCall::Erase(anchor.uuid));
    tokio::task::yield_now().await;
    if self.faults.borrow().fail_erase {
      return Err(PlatformError::new(PlatformOp::Erase, "simulated erase failure"));
    }

    let previous = self.device.borrow_mut().anchors.remove(&anchor.uuid);
    if let Some(pose) = previous
      && let Err(err) = self.persist()
    {
      self.device.borrow_mut().anchors.insert(anchor.uuid, pose);
      return Err(PlatformError::new(PlatformOp::Erase, err.to_string()));
    }
    Ok(())
  }

  async fn load_unbound(&self, uuids: &[AnchorUuid], options: &LoadOptions) -> Result<Vec<SimUnbound>, PlatformError> {
    self.record(PlatformCall::Load(uuids.to_vec(), options.location));
    let faults = self.faults.borrow().clone();
    if faults.fail_load {
      return Err(PlatformError::new(PlatformOp::Load, "simulated load failure"));
    }
    if options.location == StorageLocation::Cloud && faults.cloud_unavailable {
      return Err(PlatformError::new(PlatformOp::Load, "cloud storage unavailable"));
    }

    let wait = async {
      match faults.load_latency {
        Some(latency) => tokio::time::sleep(latency).await,
        None => tokio::task::yield_now().await,
      }
    };
    match options.effective_timeout() {
      Some(timeout) => tokio::time::timeout(timeout, wait)
        .await
        .map_err(|_| PlatformError::new(PlatformOp::Load, format!("timed out after {timeout:?}")))?,
      None => wait.await,
    }

    let device = self.device.borrow();
    let mut seen = HashSet::new();
    let unbound = uuids
      .iter()
      .filter(|uuid| seen.insert(**uuid))
      .filter_map(|uuid| {
        device.anchors.get(uuid).map(|pose| SimUnbound {
          uuid: *uuid,
          pose: *pose,
          localized: Cell::new(faults.already_localized),
          fail_localize: faults.fail_localize.contains(uuid),
          pose_missing: faults.missing_pose.contains(uuid),
          calls: Rc::clone(&self.calls),
        })
      })
      .collect();
    Ok(unbound)
  }
}
