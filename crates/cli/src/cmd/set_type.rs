use std::path::Path;

use anyhow::Result;

use anchorkeep_lib::lock::LockMode;
use anchorkeep_lib::types::{AnchorUuid, ObjectKind};

use super::open_registry;
use crate::output::{print_success, print_warning};

pub fn cmd_set_type(prefs: &Path, uuid: &AnchorUuid, kind: ObjectKind) -> Result<()> {
  let (_lock, mut registry) = open_registry(prefs, LockMode::Exclusive, "set-type")?;

  let previous = registry.has_type(uuid).then(|| registry.get_type(uuid));
  registry.set_type(uuid, kind)?;

  match previous {
    Some(previous) if previous != kind => print_success(&format!("{uuid}: {previous} -> {kind}")),
    _ => print_success(&format!("{uuid}: {kind}")),
  }
  if !registry.list_saved().contains(uuid) {
    print_warning(&format!("{uuid} is not in the save-list and will not be restored"));
  }
  Ok(())
}
