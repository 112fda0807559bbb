//! Identifier registry: the durable record of which anchors are saved.
//!
//! The registry is the single owner of the preference key layout:
//!
//! ```text
//! anchor_ids       "<uuid>,<uuid>,..."   save-list (index)
//! anchor_<uuid>    "<uuid>"              saved marker (row)
//! type_<uuid>      "wall" | "cube" | ...  object kind for restoration
//! numUuid, uuid<i>                        legacy indexed layout (see `legacy`)
//! ```
//!
//! Every UUID in the save-list has a saved marker. Entries are unique and keep
//! insertion order. Malformed entries in the stored list are skipped on read
//! and left in place.

pub mod legacy;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::consts::{KIND_PREFIX, SAVE_LIST_KEY, SAVE_LIST_SEPARATOR, SAVED_MARKER_PREFIX};
use crate::prefs::{PrefsError, PrefsStore};
use crate::types::{AnchorUuid, ObjectKind};

/// Errors that can occur when updating the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
  #[error("preference store error: {0}")]
  Store(#[from] PrefsError),
}

fn marker_key(uuid: &AnchorUuid) -> String {
  format!("{SAVED_MARKER_PREFIX}{uuid}")
}

fn kind_key(uuid: &AnchorUuid) -> String {
  format!("{KIND_PREFIX}{uuid}")
}

/// Split a stored save-list into its non-empty, unique raw entries.
fn split_list(raw: &str) -> Vec<String> {
  let mut entries: Vec<String> = Vec::new();
  for entry in raw.split(SAVE_LIST_SEPARATOR).map(str::trim) {
    if !entry.is_empty() && !entries.iter().any(|e| e == entry) {
      entries.push(entry.to_string());
    }
  }
  entries
}

/// Result of [`IdentifierRegistry::check`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryReport {
  /// Parsed save-list entries.
  pub saved: Vec<AnchorUuid>,
  /// Save-list entries that are not valid UUIDs.
  pub malformed: Vec<String>,
  /// Save-list entries without an `anchor_<uuid>` marker.
  pub missing_marker: Vec<AnchorUuid>,
  /// Markers whose UUID is absent from the save-list.
  pub orphan_markers: Vec<AnchorUuid>,
  /// UUIDs still stored in the legacy indexed layout.
  pub legacy: Vec<AnchorUuid>,
}

impl RegistryReport {
  pub fn is_consistent(&self) -> bool {
    self.malformed.is_empty() && self.missing_marker.is_empty() && self.orphan_markers.is_empty()
  }
}

/// Typed access to the saved-anchor index and per-anchor metadata.
#[derive(Debug)]
pub struct IdentifierRegistry<S> {
  store: S,
}

impl<S: PrefsStore> IdentifierRegistry<S> {
  pub fn new(store: S) -> Self {
    Self { store }
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  pub fn into_store(self) -> S {
    self.store
  }

  fn raw_entries(&self) -> Vec<String> {
    self
      .store
      .get_string(SAVE_LIST_KEY)
      .map(|raw| split_list(&raw))
      .unwrap_or_default()
  }

  fn write_entries(&mut self, entries: &[String]) -> Result<(), RegistryError> {
    let joined = entries.join(&SAVE_LIST_SEPARATOR.to_string());
    self.store.set_string(SAVE_LIST_KEY, &joined)?;
    Ok(())
  }

  /// The current save-list, in insertion order.
  ///
  /// Empty entries are ignored and malformed entries are dropped.
  pub fn list_saved(&self) -> Vec<AnchorUuid> {
    let mut saved: Vec<AnchorUuid> = Vec::new();
    for entry in self.raw_entries() {
      match AnchorUuid::parse(&entry) {
        Ok(uuid) if !saved.contains(&uuid) => saved.push(uuid),
        Ok(_) => {}
        Err(err) => debug!(entry = %entry, error = %err, "skipping malformed save-list entry"),
      }
    }
    saved
  }

  /// Whether the anchor carries a saved marker.
  pub fn is_saved(&self, uuid: &AnchorUuid) -> bool {
    self.store.has_key(&marker_key(uuid))
  }

  /// Add `uuid` to the save-list and write its marker.
  ///
  /// Returns `false` if it was already listed.
  pub fn add_saved(&mut self, uuid: &AnchorUuid) -> Result<bool, RegistryError> {
    let mut entries = self.raw_entries();
    let id = uuid.to_string();
    let added = !entries.iter().any(|e| AnchorUuid::parse(e).is_ok_and(|u| u == *uuid));

    self.store.set_string(&marker_key(uuid), &id)?;
    if added {
      entries.push(id);
      self.write_entries(&entries)?;
      info!(uuid = %uuid, "anchor added to save-list");
    }
    Ok(added)
  }

  /// Remove `uuid` and its marker. Absent UUIDs are not an error.
  ///
  /// Returns `false` if it was not listed.
  pub fn remove_saved(&mut self, uuid: &AnchorUuid) -> Result<bool, RegistryError> {
    let mut entries = self.raw_entries();
    let before = entries.len();
    entries.retain(|e| AnchorUuid::parse(e).map_or(true, |u| u != *uuid));
    let removed = entries.len() != before;

    if removed {
      self.write_entries(&entries)?;
      info!(uuid = %uuid, "anchor removed from save-list");
    }
    self.store.delete_key(&marker_key(uuid))?;
    Ok(removed)
  }

  pub fn set_type(&mut self, uuid: &AnchorUuid, kind: ObjectKind) -> Result<(), RegistryError> {
    self.store.set_string(&kind_key(uuid), kind.as_str())?;
    Ok(())
  }

  /// Stored kind of the anchor's object, [`ObjectKind::Wall`] if unknown.
  pub fn get_type(&self, uuid: &AnchorUuid) -> ObjectKind {
    ObjectKind::from_stored(self.store.get_string(&kind_key(uuid)).as_deref())
  }

  /// Whether a kind entry exists for the anchor.
  pub fn has_type(&self, uuid: &AnchorUuid) -> bool {
    self.store.has_key(&kind_key(uuid))
  }

  /// Remove every trace of `uuid`: save-list entry, marker and kind.
  pub fn forget(&mut self, uuid: &AnchorUuid) -> Result<(), RegistryError> {
    self.remove_saved(uuid)?;
    self.store.delete_key(&kind_key(uuid))?;
    Ok(())
  }

  /// Remove every saved UUID with its marker and kind, plus stray markers and
  /// the legacy index.
  ///
  /// Kinds of anchors that were never saved are kept. Returns the number of
  /// save-list entries removed.
  pub fn clear_all(&mut self) -> Result<usize, RegistryError> {
    let saved = self.list_saved();
    for uuid in &saved {
      self.store.delete_key(&marker_key(uuid))?;
      self.store.delete_key(&kind_key(uuid))?;
    }
    for uuid in self.orphan_markers(&saved) {
      self.store.delete_key(&marker_key(&uuid))?;
    }
    self.store.delete_key(SAVE_LIST_KEY)?;
    let legacy = legacy::clear(&mut self.store)?;

    info!(count = saved.len(), legacy, "cleared all saved anchors");
    Ok(saved.len())
  }

  /// Markers whose UUID is not in `saved`.
  fn orphan_markers(&self, saved: &[AnchorUuid]) -> Vec<AnchorUuid> {
    self
      .store
      .keys()
      .iter()
      .filter(|key| key.as_str() != SAVE_LIST_KEY)
      .filter_map(|key| key.strip_prefix(SAVED_MARKER_PREFIX))
      .filter_map(|rest| AnchorUuid::parse(rest).ok())
      .filter(|uuid| !saved.contains(uuid))
      .collect()
  }

  /// Inspect the stored layout for invariant violations.
  pub fn check(&self) -> RegistryReport {
    let mut report = RegistryReport::default();
    for entry in self.raw_entries() {
      match AnchorUuid::parse(&entry) {
        Ok(uuid) if !report.saved.contains(&uuid) => report.saved.push(uuid),
        Ok(_) => {}
        Err(_) => report.malformed.push(entry),
      }
    }
    report.missing_marker = report.saved.iter().copied().filter(|u| !self.is_saved(u)).collect();
    report.orphan_markers = self.orphan_markers(&report.saved);
    report.legacy = legacy::list(&self.store);
    report
  }

  /// Delete the legacy indexed layout without migrating it. Returns the
  /// number of slots removed.
  pub fn clear_legacy(&mut self) -> Result<usize, RegistryError> {
    Ok(legacy::clear(&mut self.store)?)
  }

  /// UUIDs stored in the legacy indexed layout.
  pub fn legacy_saved(&self) -> Vec<AnchorUuid> {
    legacy::list(&self.store)
  }

  /// Move every legacy indexed UUID into the save-list, then clear the legacy
  /// keys. Idempotent. Returns the number of newly listed UUIDs.
  pub fn migrate_legacy(&mut self) -> Result<usize, RegistryError> {
    let legacy = legacy::list(&self.store);
    let mut migrated = 0;
    for uuid in &legacy {
      if self.add_saved(uuid)? {
        migrated += 1;
      }
    }
    legacy::clear(&mut self.store)?;

    info!(found = legacy.len(), migrated, "migrated legacy anchor index");
    Ok(migrated)
  }
}
