//! Per-anchor single-flight guard.
//!
//! Save, unsave and delete on one UUID must not interleave across suspension
//! points. Each UUID is `Idle` or `Pending`; a [`FlightTicket`] holds it
//! `Pending` and returns it to `Idle` when dropped.

use std::cell::RefCell;
use std::collections::HashSet;

use crate::types::AnchorUuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightState {
  Idle,
  Pending,
}

#[derive(Debug, Default)]
pub struct FlightGuard {
  pending: RefCell<HashSet<AnchorUuid>>,
}

impl FlightGuard {
  pub fn new() -> Self {
    Self::default()
  }

  /// Move `uuid` to `Pending`. Returns `None` if it already is.
  pub fn begin(&self, uuid: AnchorUuid) -> Option<FlightTicket<'_>> {
    if !self.pending.borrow_mut().insert(uuid) {
      return None;
    }
    Some(FlightTicket { guard: self, uuid })
  }

  pub fn state(&self, uuid: &AnchorUuid) -> FlightState {
    if self.pending.borrow().contains(uuid) {
      FlightState::Pending
    } else {
      FlightState::Idle
    }
  }

  pub fn pending_count(&self) -> usize {
    self.pending.borrow().len()
  }
}

/// Holds one UUID in the `Pending` state.
#[derive(Debug)]
pub struct FlightTicket<'a> {
  guard: &'a FlightGuard,
  uuid: AnchorUuid,
}

impl FlightTicket<'_> {
  pub fn uuid(&self) -> AnchorUuid {
    self.uuid
  }
}

impl Drop for FlightTicket<'_> {
  fn drop(&mut self) {
    self.guard.pending.borrow_mut().remove(&self.uuid);
  }
}
