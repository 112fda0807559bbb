//! Restoration of saved anchors at startup.
//!
//! Reads the save-list, batch-loads the listed anchors from the platform,
//! localizes each one independently and recreates the object it was attached
//! to. Per-UUID progress follows:
//!
//! ```text
//! Listed -> LoadRequested -> Unbound -> Localizing -> LocalizedBound
//!                |               |            |-> LocalizeFailed
//!                |               |            '-> PoseUnavailable
//!                |               '-> AlreadyBound
//!                '-> NotFound
//! ```
//!
//! A failed batch load aborts the whole run; there is no per-UUID retry.
//! Failed UUIDs stay in the save-list. Completion order between UUIDs is not
//! defined.

use std::cell::RefCell;
use std::collections::BTreeMap;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::anchor::{AnchorPlatform, LoadOptions, PlatformError, UnboundAnchor};
use crate::binding::{Binding, BindingTable};
use crate::prefs::PrefsStore;
use crate::registry::IdentifierRegistry;
use crate::scene::{Palette, Scene};
use crate::status::{AnchorStatus, StatusSink};
use crate::types::{AnchorUuid, ObjectKind};

/// Progress of one listed UUID through a restoration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreState {
  Listed,
  LoadRequested,
  Unbound,
  Localizing,
  LocalizedBound,
  LocalizeFailed,
  PoseUnavailable,
  /// Listed but not returned by the platform.
  NotFound,
  /// Already bound in this session; left alone.
  AlreadyBound,
}

impl RestoreState {
  pub fn is_terminal(&self) -> bool {
    matches!(
      self,
      RestoreState::LocalizedBound
        | RestoreState::LocalizeFailed
        | RestoreState::PoseUnavailable
        | RestoreState::NotFound
        | RestoreState::AlreadyBound
    )
  }
}

#[derive(Debug, Error)]
pub enum RestoreError {
  #[error("failed to load saved anchors: {0}")]
  LoadFailed(#[source] PlatformError),
}

/// Outcome of a restoration run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RestoreReport {
  /// The save-list at the start of the run.
  pub listed: Vec<AnchorUuid>,
  pub outcomes: BTreeMap<AnchorUuid, RestoreState>,
  /// Kinds of the objects recreated, in completion order.
  pub restored: Vec<(AnchorUuid, ObjectKind)>,
}

impl RestoreReport {
  fn listed(uuids: &[AnchorUuid]) -> Self {
    Self {
      listed: uuids.to_vec(),
      outcomes: uuids.iter().map(|u| (*u, RestoreState::Listed)).collect(),
      restored: Vec::new(),
    }
  }

  fn set(&mut self, uuid: AnchorUuid, state: RestoreState) {
    self.outcomes.insert(uuid, state);
  }

  fn set_all(&mut self, from: RestoreState, to: RestoreState) {
    for state in self.outcomes.values_mut().filter(|s| **s == from) {
      *state = to;
    }
  }

  pub fn state(&self, uuid: &AnchorUuid) -> Option<RestoreState> {
    self.outcomes.get(uuid).copied()
  }

  pub fn listed_count(&self) -> usize {
    self.listed.len()
  }

  pub fn restored_count(&self) -> usize {
    self.restored.len()
  }

  /// UUIDs that ended in a failure state.
  pub fn failed(&self) -> Vec<(AnchorUuid, RestoreState)> {
    self
      .outcomes
      .iter()
      .filter(|(_, s)| {
        matches!(
          s,
          RestoreState::LocalizeFailed | RestoreState::PoseUnavailable | RestoreState::NotFound
        )
      })
      .map(|(u, s)| (*u, *s))
      .collect()
  }
}

/// Everything a restoration run reads from or writes to.
pub struct RestoreEngine<'a, P: AnchorPlatform, S, K> {
  pub platform: &'a P,
  pub scene: &'a S,
  pub registry: &'a RefCell<IdentifierRegistry<K>>,
  pub bindings: &'a RefCell<BindingTable<P::Anchor>>,
  pub status: &'a dyn StatusSink,
  pub palette: &'a Palette,
}

impl<P, S, K> RestoreEngine<'_, P, S, K>
where
  P: AnchorPlatform,
  S: Scene,
  K: PrefsStore,
{
  /// Run one restoration pass.
  ///
  /// Must not run concurrently with itself; the controller enforces this.
  pub async fn run(&self, options: &LoadOptions) -> Result<RestoreReport, RestoreError> {
    let uuids = self.registry.borrow().list_saved();
    if uuids.is_empty() {
      info!("no saved anchors found");
      return Ok(RestoreReport::default());
    }

    let mut report = RestoreReport::listed(&uuids);
    report.set_all(RestoreState::Listed, RestoreState::LoadRequested);
    info!(count = uuids.len(), timeout = ?options.effective_timeout(), "loading saved anchors");

    let unbound = match self.platform.load_unbound(&uuids, options).await {
      Ok(unbound) => unbound,
      Err(err) => {
        error!(error = %err, "failed to load anchors");
        self.status.report(None, AnchorStatus::LoadFailed);
        return Err(RestoreError::LoadFailed(err));
      }
    };

    let mut localizing = FuturesUnordered::new();
    for anchor in unbound {
      let uuid = anchor.uuid();
      if report.state(&uuid) != Some(RestoreState::LoadRequested) {
        continue;
      }
      if self.bindings.borrow().contains(&uuid) {
        warn!(uuid = %uuid, "anchor already bound, skipping");
        report.set(uuid, RestoreState::AlreadyBound);
        continue;
      }
      report.set(uuid, RestoreState::Unbound);

      report.set(uuid, RestoreState::Localizing);
      localizing.push(async move {
        let localized = anchor.is_localized() || anchor.localize().await;
        (anchor, localized)
      });
    }
    report.set_all(RestoreState::LoadRequested, RestoreState::NotFound);
    for (uuid, _) in report.outcomes.iter().filter(|(_, s)| **s == RestoreState::NotFound) {
      warn!(uuid = %uuid, "saved anchor not found in storage");
    }

    while let Some((anchor, localized)) = localizing.next().await {
      let uuid = anchor.uuid();
      let state = self.settle(anchor, localized);
      if state == RestoreState::LocalizedBound {
        report.restored.push((uuid, self.registry.borrow().get_type(&uuid)));
      }
      report.set(uuid, state);
    }

    info!(
      listed = report.listed_count(),
      restored = report.restored_count(),
      failed = report.failed().len(),
      "restoration finished"
    );
    Ok(report)
  }

  /// Bind one localized anchor to a fresh object.
  fn settle(&self, anchor: P::Unbound, localized: bool) -> RestoreState {
    let uuid = anchor.uuid();
    if !localized {
      warn!(uuid = %uuid, "failed to localize anchor");
      return RestoreState::LocalizeFailed;
    }
    let Some(pose) = anchor.pose() else {
      warn!(uuid = %uuid, "failed to get pose for anchor");
      return RestoreState::PoseUnavailable;
    };
    if self.bindings.borrow().contains(&uuid) {
      warn!(uuid = %uuid, "anchor bound while localizing, skipping");
      return RestoreState::AlreadyBound;
    }

    let kind = self.registry.borrow().get_type(&uuid);
    let object = self.scene.instantiate(kind, &pose);
    let handle = anchor.bind_to(object);
    self.bindings.borrow_mut().insert(
      uuid,
      Binding {
        object,
        anchor: handle,
        kind,
        saved: true,
      },
    );
    self.scene.set_color(object, self.palette.saved);
    self.status.report(Some(uuid), AnchorStatus::Restored);

    info!(uuid = %uuid, kind = %kind, pose = %pose, "restored anchor");
    RestoreState::LocalizedBound
  }
}
