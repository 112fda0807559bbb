//! Anchor platform collaborator.
//!
//! The platform owns the spatially tracked reference frames. Every call that
//! talks to it may suspend and may fail; none can be cancelled once issued.
//! Futures are `!Send`: the core runs on a single cooperative thread.

pub mod sim;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scene::ObjectHandle;
use crate::types::{AnchorUuid, Pose};

pub use sim::{FaultPlan, PlatformCall, SimAnchor, SimUnbound, SimulatedPlatform};

/// Where anchors are saved to and loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageLocation {
  #[default]
  Local,
  Cloud,
}

/// Options for a batch load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
  /// `None` or zero means the platform default.
  pub timeout: Option<Duration>,
  pub location: StorageLocation,
}

impl LoadOptions {
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }

  /// The timeout to enforce, treating zero as "none".
  pub fn effective_timeout(&self) -> Option<Duration> {
    self.timeout.filter(|t| !t.is_zero())
  }
}

/// The platform request that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformOp {
  Create,
  Save,
  Erase,
  Load,
}

impl fmt::Display for PlatformOp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      PlatformOp::Create => "create",
      PlatformOp::Save => "save",
      PlatformOp::Erase => "erase",
      PlatformOp::Load => "load",
    };
    f.write_str(name)
  }
}

/// A platform request returned a failure status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("anchor {op} failed: {status}")]
pub struct PlatformError {
  pub op: PlatformOp,
  pub status: String,
}

impl PlatformError {
  pub fn new(op: PlatformOp, status: impl Into<String>) -> Self {
    Self {
      op,
      status: status.into(),
    }
  }
}

/// An anchor loaded from storage that is not yet attached to an object.
#[async_trait(?Send)]
pub trait UnboundAnchor {
  type Anchor;

  fn uuid(&self) -> AnchorUuid;

  /// Whether a pose is already available without localizing.
  fn is_localized(&self) -> bool;

  /// Localize the anchor. Returns `false` if the platform could not recover
  /// its pose in the current environment.
  async fn localize(&self) -> bool;

  fn pose(&self) -> Option<Pose>;

  /// Attach the anchor to a live object.
  fn bind_to(self, object: ObjectHandle) -> Self::Anchor;
}

/// Spatial anchor service.
#[async_trait(?Send)]
pub trait AnchorPlatform {
  /// A live anchor attached to an object. Cheap to clone.
  type Anchor: Clone + fmt::Debug;
  type Unbound: UnboundAnchor<Anchor = Self::Anchor>;

  /// Begin creating an anchor for `object` at `pose`. The returned anchor is
  /// pending until [`AnchorPlatform::until_created`] resolves.
  fn create(&self, object: ObjectHandle, pose: &Pose) -> Self::Anchor;

  /// Wait for a pending anchor to be created and return its identifier.
  async fn until_created(&self, anchor: &Self::Anchor) -> Result<AnchorUuid, PlatformError>;

  /// Persist the anchor to storage.
  async fn save(&self, anchor: &Self::Anchor) -> Result<(), PlatformError>;

  /// Remove the anchor from storage. Erasing an anchor that was never saved
  /// succeeds.
  async fn erase(&self, anchor: &Self::Anchor) -> Result<(), PlatformError>;

  /// Load every stored anchor among `uuids`. Identifiers the platform does not
  /// know are silently absent from the result.
  async fn load_unbound(&self, uuids: &[AnchorUuid], options: &LoadOptions) -> Result<Vec<Self::Unbound>, PlatformError>;
}
