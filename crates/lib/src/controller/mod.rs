//! Placement, save toggling and deletion of anchored objects.
//!
//! The controller owns the session state (registry handle, binding table,
//! in-flight guard) and is the only path through which user actions reach the
//! anchor platform. Registry and binding table change only after the platform
//! reports success; on failure the prior state is left as it was.
//!
//! All methods take `&self`. State lives in `RefCell`s that are never borrowed
//! across an await, so operations on different anchors can interleave freely
//! on one thread. Operations on the same anchor are serialized by
//! [`FlightGuard`]: a second request while one is pending fails with
//! [`ControlError::Busy`] before reaching the platform.

mod flight;

use std::cell::{Cell, Ref, RefCell};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub use flight::{FlightGuard, FlightState, FlightTicket};

use crate::anchor::{AnchorPlatform, LoadOptions, PlatformError};
use crate::binding::{Binding, BindingTable};
use crate::prefs::PrefsStore;
use crate::registry::{IdentifierRegistry, RegistryError};
use crate::restore::{RestoreEngine, RestoreError, RestoreReport};
use crate::scene::{ObjectHandle, Palette, Scene};
use crate::status::{AnchorStatus, LogStatus, StatusSink};
use crate::types::{AnchorRecord, AnchorUuid, ObjectKind, Pose};

#[derive(Debug, Error)]
pub enum ControlError {
  #[error(transparent)]
  Platform(#[from] PlatformError),

  /// The platform succeeded but the registry could not be updated. The
  /// platform side is not rolled back.
  #[error(transparent)]
  Registry(#[from] RegistryError),

  #[error("an operation on anchor {0} is already pending")]
  Busy(AnchorUuid),

  #[error("restoration is already running")]
  RestoreInProgress,

  #[error(transparent)]
  Restore(#[from] RestoreError),
}

/// Outcome of [`AnchorController::toggle_save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggled {
  Saved,
  Unsaved,
  /// No anchor is bound to the UUID.
  Ignored,
}

/// Outcome of [`AnchorController::delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Deleted {
  Removed,
  Ignored,
}

/// Outcome of [`AnchorController::unsave_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkUnsave {
  /// Bound anchors erased from storage.
  pub unsaved: Vec<AnchorUuid>,
  /// Anchors whose erase or registry update failed. They stay saved.
  pub failed: Vec<AnchorUuid>,
  /// Anchors left to another operation that was already in flight.
  pub busy: Vec<AnchorUuid>,
  /// Listed anchors with no binding in this session, removed from the
  /// save-list without a platform erase.
  pub dropped: Vec<AnchorUuid>,
}

/// Clears the restoring flag even if the restore future is dropped.
struct RestoreFlag<'a>(&'a Cell<bool>);

impl Drop for RestoreFlag<'_> {
  fn drop(&mut self) {
    self.0.set(false);
  }
}

/// Counts a placement as pending until dropped.
struct PendingPlacement<'a>(&'a Cell<usize>);

impl<'a> PendingPlacement<'a> {
  fn enter(count: &'a Cell<usize>) -> Self {
    count.set(count.get() + 1);
    Self(count)
  }
}

impl Drop for PendingPlacement<'_> {
  fn drop(&mut self) {
    self.0.set(self.0.get().saturating_sub(1));
  }
}

pub struct AnchorController<P: AnchorPlatform, S, K> {
  platform: P,
  scene: S,
  registry: RefCell<IdentifierRegistry<K>>,
  bindings: RefCell<BindingTable<P::Anchor>>,
  flights: FlightGuard,
  restoring: Cell<bool>,
  pending: Cell<usize>,
  status: Box<dyn StatusSink>,
  palette: Palette,
}

/// Builder for [`AnchorController`]. Status goes to the log unless a sink is
/// supplied.
pub struct ControllerBuilder<P, S, K> {
  platform: P,
  scene: S,
  store: K,
  status: Option<Box<dyn StatusSink>>,
  palette: Palette,
}

impl<P, S, K> ControllerBuilder<P, S, K>
where
  P: AnchorPlatform,
  S: Scene,
  K: PrefsStore,
{
  pub fn status(mut self, sink: impl StatusSink + 'static) -> Self {
    self.status = Some(Box::new(sink));
    self
  }

  pub fn palette(mut self, palette: Palette) -> Self {
    self.palette = palette;
    self
  }

  pub fn build(self) -> AnchorController<P, S, K> {
    AnchorController {
      platform: self.platform,
      scene: self.scene,
      registry: RefCell::new(IdentifierRegistry::new(self.store)),
      bindings: RefCell::new(BindingTable::new()),
      flights: FlightGuard::new(),
      restoring: Cell::new(false),
      pending: Cell::new(0),
      status: self.status.unwrap_or_else(|| Box::new(LogStatus)),
      palette: self.palette,
    }
  }
}

impl<P, S, K> AnchorController<P, S, K>
where
  P: AnchorPlatform,
  S: Scene,
  K: PrefsStore,
{
  pub fn builder(platform: P, scene: S, store: K) -> ControllerBuilder<P, S, K> {
    ControllerBuilder {
      platform,
      scene,
      store,
      status: None,
      palette: Palette::default(),
    }
  }

  /// Place an object of `kind` at `pose` and anchor it.
  ///
  /// The kind is persisted under the new UUID as soon as the anchor exists,
  /// whether or not it is later saved. If creation fails the object is
  /// destroyed and nothing is registered.
  pub async fn place(&self, kind: ObjectKind, pose: Pose) -> Result<AnchorUuid, ControlError> {
    let object = self.scene.instantiate(kind, &pose);
    let anchor = self.platform.create(object, &pose);

    let pending = PendingPlacement::enter(&self.pending);
    let created = self.platform.until_created(&anchor).await;
    drop(pending);

    let uuid = match created {
      Ok(uuid) => uuid,
      Err(err) => {
        error!(kind = %kind, error = %err, "failed to create anchor");
        self.scene.destroy(object);
        self.status.report(None, AnchorStatus::PlaceFailed);
        return Err(err.into());
      }
    };

    let typed = self.registry.borrow_mut().set_type(&uuid, kind);
    if let Err(err) = typed {
      error!(uuid = %uuid, error = %err, "failed to record anchor kind");
      self.scene.destroy(object);
      self.status.report(Some(uuid), AnchorStatus::PlaceFailed);
      return Err(err.into());
    }

    self.bindings.borrow_mut().insert(
      uuid,
      Binding {
        object,
        anchor,
        kind,
        saved: false,
      },
    );
    self.scene.set_color(object, self.palette.unsaved);
    self.status.report(Some(uuid), AnchorStatus::Placed);
    info!(uuid = %uuid, kind = %kind, pose = %pose, "placed anchor");
    Ok(uuid)
  }

  /// Save the anchor if it is unsaved, erase it from storage if it is saved.
  pub async fn toggle_save(&self, uuid: AnchorUuid) -> Result<Toggled, ControlError> {
    let Some((anchor, object, saved)) = self.bound(&uuid) else {
      warn!(uuid = %uuid, "no anchor bound, ignoring toggle");
      self.status.report(Some(uuid), AnchorStatus::NoAnchor);
      return Ok(Toggled::Ignored);
    };
    let _ticket = self.begin(uuid)?;

    if saved {
      self.unsave(uuid, &anchor, object).await?;
      Ok(Toggled::Unsaved)
    } else {
      self.save(uuid, &anchor, object).await?;
      Ok(Toggled::Saved)
    }
  }

  /// Erase the anchor from storage, then drop every trace of it.
  ///
  /// If the erase fails the object, binding and registry entries stay.
  pub async fn delete(&self, uuid: AnchorUuid) -> Result<Deleted, ControlError> {
    let Some((anchor, object, _)) = self.bound(&uuid) else {
      warn!(uuid = %uuid, "no anchor bound, ignoring delete");
      self.status.report(Some(uuid), AnchorStatus::NoAnchor);
      return Ok(Deleted::Ignored);
    };
    let _ticket = self.begin(uuid)?;

    if let Err(err) = self.platform.erase(&anchor).await {
      warn!(uuid = %uuid, error = %err, "failed to erase anchor, keeping object");
      self.status.report(Some(uuid), AnchorStatus::DeleteFailed);
      return Err(err.into());
    }

    let forgotten = self.registry.borrow_mut().forget(&uuid);
    if let Err(err) = forgotten {
      error!(uuid = %uuid, error = %err, "anchor erased but registry update failed");
      self.status.report(Some(uuid), AnchorStatus::DeleteFailed);
      return Err(err.into());
    }

    self.bindings.borrow_mut().remove(&uuid);
    self.scene.destroy(object);
    self.status.report(Some(uuid), AnchorStatus::Deleted);
    info!(uuid = %uuid, object = %object, "deleted anchor");
    Ok(Deleted::Removed)
  }

  /// Erase every saved, bound anchor from storage, one at a time, then drop
  /// the listed anchors this session never bound and the legacy index.
  ///
  /// Unbound entries are skipped while a restore is running, since they may
  /// be about to bind.
  pub async fn unsave_all(&self) -> BulkUnsave {
    let targets: Vec<_> = self
      .bindings
      .borrow()
      .iter()
      .filter(|(_, binding)| binding.saved)
      .map(|(uuid, binding)| (*uuid, binding.anchor.clone(), binding.object))
      .collect();

    let mut result = BulkUnsave::default();
    for (uuid, anchor, object) in targets {
      let Ok(_ticket) = self.begin(uuid) else {
        result.busy.push(uuid);
        continue;
      };
      if !self.bindings.borrow().get(&uuid).is_some_and(|b| b.saved) {
        debug!(uuid = %uuid, "anchor no longer saved, skipping");
        continue;
      }
      match self.unsave(uuid, &anchor, object).await {
        Ok(()) => result.unsaved.push(uuid),
        Err(_) => result.failed.push(uuid),
      }
    }

    if self.restoring.get() {
      debug!("restore running, keeping unbound save-list entries");
    } else {
      self.drop_unbound(&mut result);
    }

    info!(
      unsaved = result.unsaved.len(),
      failed = result.failed.len(),
      busy = result.busy.len(),
      dropped = result.dropped.len(),
      "unsaved all anchors"
    );
    result
  }

  fn drop_unbound(&self, result: &mut BulkUnsave) {
    let unbound: Vec<_> = {
      let bindings = self.bindings.borrow();
      let registry = self.registry.borrow();
      registry
        .list_saved()
        .into_iter()
        .filter(|uuid| !bindings.contains(uuid))
        .collect()
    };

    for uuid in unbound {
      let forgotten = self.registry.borrow_mut().forget(&uuid);
      match forgotten {
        Ok(()) => {
          self.status.report(Some(uuid), AnchorStatus::Unsaved);
          result.dropped.push(uuid);
        }
        Err(err) => {
          error!(uuid = %uuid, error = %err, "failed to drop unbound anchor from save-list");
          self.status.report(Some(uuid), AnchorStatus::UnsaveFailed);
          result.failed.push(uuid);
        }
      }
    }

    let cleared = self.registry.borrow_mut().clear_legacy();
    if let Err(err) = cleared {
      error!(error = %err, "failed to clear legacy anchor index");
    }
  }

  /// Restore saved anchors from the platform into this session.
  pub async fn restore(&self, options: &LoadOptions) -> Result<RestoreReport, ControlError> {
    if self.restoring.replace(true) {
      warn!("restoration already running");
      return Err(ControlError::RestoreInProgress);
    }
    let _flag = RestoreFlag(&self.restoring);

    let engine = RestoreEngine {
      platform: &self.platform,
      scene: &self.scene,
      registry: &self.registry,
      bindings: &self.bindings,
      status: &*self.status,
      palette: &self.palette,
    };
    Ok(engine.run(options).await?)
  }

  /// Tint the object bound to `uuid` with the highlight color.
  pub fn highlight(&self, uuid: &AnchorUuid) -> bool {
    match self.bindings.borrow().get(uuid) {
      Some(binding) => {
        self.scene.set_color(binding.object, self.palette.highlight);
        true
      }
      None => false,
    }
  }

  /// Restore the saved/unsaved tint of the object bound to `uuid`.
  pub fn clear_highlight(&self, uuid: &AnchorUuid) -> bool {
    match self.bindings.borrow().get(uuid) {
      Some(binding) => {
        self.scene.set_color(binding.object, self.palette.for_state(binding.saved));
        true
      }
      None => false,
    }
  }

  pub fn registry(&self) -> Ref<'_, IdentifierRegistry<K>> {
    self.registry.borrow()
  }

  pub fn bindings(&self) -> Ref<'_, BindingTable<P::Anchor>> {
    self.bindings.borrow()
  }

  pub fn records(&self) -> Vec<AnchorRecord> {
    self.bindings.borrow().records()
  }

  pub fn platform(&self) -> &P {
    &self.platform
  }

  pub fn scene(&self) -> &S {
    &self.scene
  }

  pub fn palette(&self) -> &Palette {
    &self.palette
  }

  /// Anchors still waiting for the platform to create them.
  pub fn pending_placements(&self) -> usize {
    self.pending.get()
  }

  pub fn flight_state(&self, uuid: &AnchorUuid) -> FlightState {
    self.flights.state(uuid)
  }

  pub fn is_restoring(&self) -> bool {
    self.restoring.get()
  }

  /// End the session and hand back the preference store.
  pub fn into_store(self) -> K {
    self.registry.into_inner().into_store()
  }

  fn bound(&self, uuid: &AnchorUuid) -> Option<(P::Anchor, ObjectHandle, bool)> {
    self
      .bindings
      .borrow()
      .get(uuid)
      .map(|b| (b.anchor.clone(), b.object, b.saved))
  }

  fn begin(&self, uuid: AnchorUuid) -> Result<FlightTicket<'_>, ControlError> {
    self.flights.begin(uuid).ok_or_else(|| {
      warn!(uuid = %uuid, "operation already pending for anchor");
      ControlError::Busy(uuid)
    })
  }

  async fn save(&self, uuid: AnchorUuid, anchor: &P::Anchor, object: ObjectHandle) -> Result<(), ControlError> {
    if let Err(err) = self.platform.save(anchor).await {
      warn!(uuid = %uuid, error = %err, "failed to save anchor");
      self.status.report(Some(uuid), AnchorStatus::SaveFailed);
      return Err(err.into());
    }

    let added = self.registry.borrow_mut().add_saved(&uuid);
    if let Err(err) = added {
      error!(uuid = %uuid, error = %err, "anchor saved but registry update failed");
      self.status.report(Some(uuid), AnchorStatus::SaveFailed);
      return Err(err.into());
    }

    self.bindings.borrow_mut().set_saved(&uuid, true);
    self.scene.set_color(object, self.palette.saved);
    self.status.report(Some(uuid), AnchorStatus::Saved);
    info!(uuid = %uuid, "saved anchor");
    Ok(())
  }

  async fn unsave(&self, uuid: AnchorUuid, anchor: &P::Anchor, object: ObjectHandle) -> Result<(), ControlError> {
    if let Err(err) = self.platform.erase(anchor).await {
      warn!(uuid = %uuid, error = %err, "failed to erase anchor");
      self.status.report(Some(uuid), AnchorStatus::UnsaveFailed);
      return Err(err.into());
    }

    let removed = self.registry.borrow_mut().remove_saved(&uuid);
    if let Err(err) = removed {
      error!(uuid = %uuid, error = %err, "anchor erased but registry update failed");
      self.status.report(Some(uuid), AnchorStatus::UnsaveFailed);
      return Err(err.into());
    }

    self.bindings.borrow_mut().set_saved(&uuid, false);
    self.scene.set_color(object, self.palette.unsaved);
    self.status.report(Some(uuid), AnchorStatus::Unsaved);
    info!(uuid = %uuid, "unsaved anchor");
    Ok(())
  }
}
