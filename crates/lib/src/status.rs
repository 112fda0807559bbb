//! Status reporting for anchor operations.
//!
//! Every place/save/unsave/delete/restore outcome, success or failure, is
//! reported exactly once to a [`StatusSink`] handed to the controller at
//! construction. Presentation (labels, colors, toasts) lives behind the sink.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{info, warn};

use crate::types::AnchorUuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorStatus {
  /// Object placed and anchor created, not yet saved.
  Placed,
  PlaceFailed,
  Saved,
  SaveFailed,
  Unsaved,
  UnsaveFailed,
  Deleted,
  DeleteFailed,
  /// Restored from device storage at startup.
  Restored,
  /// Batch load of saved anchors failed.
  LoadFailed,
  /// Operation targeted an object without an anchor.
  NoAnchor,
}

impl AnchorStatus {
  /// Short user-facing label.
  pub fn label(&self) -> &'static str {
    match self {
      AnchorStatus::Placed => "Not Saved",
      AnchorStatus::PlaceFailed => "Place Failed",
      AnchorStatus::Saved => "Saved",
      AnchorStatus::SaveFailed => "Save Failed",
      AnchorStatus::Unsaved => "Not Saved",
      AnchorStatus::UnsaveFailed => "Unsave Failed",
      AnchorStatus::Deleted => "Deleted",
      AnchorStatus::DeleteFailed => "Delete Failed",
      AnchorStatus::Restored => "Loaded from Device",
      AnchorStatus::LoadFailed => "Load Failed",
      AnchorStatus::NoAnchor => "No anchor",
    }
  }

  pub fn is_failure(&self) -> bool {
    matches!(
      self,
      AnchorStatus::PlaceFailed
        | AnchorStatus::SaveFailed
        | AnchorStatus::UnsaveFailed
        | AnchorStatus::DeleteFailed
        | AnchorStatus::LoadFailed
        | AnchorStatus::NoAnchor
    )
  }
}

impl std::fmt::Display for AnchorStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

/// Receives operation outcomes. `uuid` is `None` when no anchor exists yet
/// (failed placement) or the outcome concerns a whole batch.
pub trait StatusSink {
  fn report(&self, uuid: Option<AnchorUuid>, status: AnchorStatus);
}

impl<T: StatusSink + ?Sized> StatusSink for Rc<T> {
  fn report(&self, uuid: Option<AnchorUuid>, status: AnchorStatus) {
    (**self).report(uuid, status)
  }
}

/// Sink that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogStatus;

impl StatusSink for LogStatus {
  fn report(&self, uuid: Option<AnchorUuid>, status: AnchorStatus) {
    let uuid = uuid.map(|u| u.to_string()).unwrap_or_else(|| "-".to_string());
    if status.is_failure() {
      warn!(uuid = %uuid, status = %status, "anchor status");
    } else {
      info!(uuid = %uuid, status = %status, "anchor status");
    }
  }
}

/// Sink that keeps every report, for tests and scripted sessions.
#[derive(Debug, Default)]
pub struct RecordingStatus {
  events: RefCell<Vec<(Option<AnchorUuid>, AnchorStatus)>>,
}

impl RecordingStatus {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn events(&self) -> Vec<(Option<AnchorUuid>, AnchorStatus)> {
    self.events.borrow().clone()
  }

  /// Drain and return every report so far.
  pub fn take(&self) -> Vec<(Option<AnchorUuid>, AnchorStatus)> {
    std::mem::take(&mut *self.events.borrow_mut())
  }

  pub fn failures(&self) -> usize {
    self.events.borrow().iter().filter(|(_, s)| s.is_failure()).count()
  }

  pub fn last(&self) -> Option<(Option<AnchorUuid>, AnchorStatus)> {
    self.events.borrow().last().copied()
  }
}

impl StatusSink for RecordingStatus {
  fn report(&self, uuid: Option<AnchorUuid>, status: AnchorStatus) {
    self.events.borrow_mut().push((uuid, status));
  }
}
