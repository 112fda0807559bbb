use std::path::Path;

use anyhow::Result;

use anchorkeep_lib::lock::LockMode;
use anchorkeep_lib::types::AnchorUuid;

use super::open_registry;
use crate::output::{print_info, print_success};

/// Drop an anchor from the preferences. Device storage is not touched.
pub fn cmd_forget(prefs: &Path, uuid: &AnchorUuid) -> Result<()> {
  let (_lock, mut registry) = open_registry(prefs, LockMode::Exclusive, "forget")?;

  let known = registry.list_saved().contains(uuid) || registry.is_saved(uuid) || registry.has_type(uuid);
  if !known {
    print_info(&format!("Nothing stored for {uuid}"));
    return Ok(());
  }

  registry.forget(uuid)?;
  print_success(&format!("Forgot {uuid}"));
  Ok(())
}
