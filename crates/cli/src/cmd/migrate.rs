use std::path::Path;

use anyhow::Result;

use anchorkeep_lib::lock::LockMode;

use super::open_registry;
use crate::output::{print_info, print_success};

/// Fold the legacy `numUuid`/`uuid<i>` index into the save-list.
pub fn cmd_migrate(prefs: &Path) -> Result<()> {
  let (_lock, mut registry) = open_registry(prefs, LockMode::Exclusive, "migrate")?;

  if registry.legacy_saved().is_empty() {
    print_info("No legacy anchors to migrate.");
    return Ok(());
  }

  let migrated = registry.migrate_legacy()?;
  print_success(&format!("Migrated {migrated} anchor(s) into the save-list"));
  Ok(())
}
