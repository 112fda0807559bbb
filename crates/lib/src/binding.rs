//! Session-scoped mapping from anchor identifiers to live objects.
//!
//! Never persisted. Rebuilt by restoration at startup, grown by placement and
//! shrunk by deletion. A UUID is bound at most once.

use std::collections::BTreeMap;

use crate::scene::ObjectHandle;
use crate::types::{AnchorRecord, AnchorUuid, ObjectKind};

/// A live object bound to an anchor.
#[derive(Debug, Clone)]
pub struct Binding<A> {
  pub object: ObjectHandle,
  pub anchor: A,
  pub kind: ObjectKind,
  pub saved: bool,
}

impl<A> Binding<A> {
  pub fn record(&self, uuid: AnchorUuid) -> AnchorRecord {
    AnchorRecord {
      uuid,
      kind: self.kind,
      saved: self.saved,
    }
  }
}

#[derive(Debug)]
pub struct BindingTable<A> {
  entries: BTreeMap<AnchorUuid, Binding<A>>,
}

impl<A> Default for BindingTable<A> {
  fn default() -> Self {
    Self {
      entries: BTreeMap::new(),
    }
  }
}

impl<A> BindingTable<A> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Bind `uuid`. Returns `false` and leaves the table unchanged if the UUID
  /// is already bound.
  pub fn insert(&mut self, uuid: AnchorUuid, binding: Binding<A>) -> bool {
    if self.entries.contains_key(&uuid) {
      return false;
    }
    self.entries.insert(uuid, binding);
    true
  }

  pub fn get(&self, uuid: &AnchorUuid) -> Option<&Binding<A>> {
    self.entries.get(uuid)
  }

  pub fn contains(&self, uuid: &AnchorUuid) -> bool {
    self.entries.contains_key(uuid)
  }

  pub fn remove(&mut self, uuid: &AnchorUuid) -> Option<Binding<A>> {
    self.entries.remove(uuid)
  }

  /// Update the saved flag. Returns `false` if the UUID is not bound.
  pub fn set_saved(&mut self, uuid: &AnchorUuid, saved: bool) -> bool {
    match self.entries.get_mut(uuid) {
      Some(binding) => {
        binding.saved = saved;
        true
      }
      None => false,
    }
  }

  /// The UUID bound to `object`, if any.
  pub fn find_by_object(&self, object: ObjectHandle) -> Option<AnchorUuid> {
    self
      .entries
      .iter()
      .find(|(_, binding)| binding.object == object)
      .map(|(uuid, _)| *uuid)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&AnchorUuid, &Binding<A>)> {
    self.entries.iter()
  }

  pub fn records(&self) -> Vec<AnchorRecord> {
    self.entries.iter().map(|(uuid, b)| b.record(*uuid)).collect()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// End of session: drop every binding and return them.
  pub fn drain(&mut self) -> Vec<(AnchorUuid, Binding<A>)> {
    std::mem::take(&mut self.entries).into_iter().collect()
  }
}
