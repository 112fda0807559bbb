//! Legacy indexed layout: `numUuid` holds a count and `uuid0..uuid{n-1}` hold
//! the identifiers.
//!
//! Only read, appended to (for fixtures and migration tests) and cleared; new
//! saves always go to the comma-joined save-list.

use tracing::debug;

use crate::consts::{LEGACY_COUNT_KEY, LEGACY_SLOT_PREFIX};
use crate::prefs::{PrefsError, PrefsStore};
use crate::types::AnchorUuid;

fn slot_key(index: i64) -> String {
  format!("{LEGACY_SLOT_PREFIX}{index}")
}

fn count(store: &impl PrefsStore) -> i64 {
  store.get_int(LEGACY_COUNT_KEY).unwrap_or(0).max(0)
}

/// Parsed UUIDs in slot order. Missing or malformed slots are skipped.
pub fn list(store: &impl PrefsStore) -> Vec<AnchorUuid> {
  let mut uuids = Vec::new();
  for index in 0..count(store) {
    let Some(raw) = store.get_string(&slot_key(index)) else {
      debug!(slot = index, "legacy slot missing");
      continue;
    };
    match AnchorUuid::parse(&raw) {
      Ok(uuid) if !uuids.contains(&uuid) => uuids.push(uuid),
      Ok(_) => {}
      Err(err) => debug!(slot = index, error = %err, "skipping malformed legacy slot"),
    }
  }
  uuids
}

/// Write `uuid` into the next slot and bump the count.
pub fn append(store: &mut impl PrefsStore, uuid: &AnchorUuid) -> Result<(), PrefsError> {
  let next = count(store);
  store.set_string(&slot_key(next), &uuid.to_string())?;
  store.set_int(LEGACY_COUNT_KEY, next + 1)
}

/// Delete every slot and the count. Returns the number of slots removed.
pub fn clear(store: &mut impl PrefsStore) -> Result<usize, PrefsError> {
  if !store.has_key(LEGACY_COUNT_KEY) {
    return Ok(0);
  }
  let slots = count(store);
  for index in 0..slots {
    store.delete_key(&slot_key(index))?;
  }
  store.delete_key(LEGACY_COUNT_KEY)?;
  Ok(slots as usize)
}
