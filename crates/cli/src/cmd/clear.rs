//! `anchorkeep clear`: forget every saved anchor.

use std::path::Path;

use anyhow::Result;

use anchorkeep_lib::lock::LockMode;

use super::open_registry;
use crate::output::{print_info, print_success};
use crate::prompts::confirm;

pub fn cmd_clear(prefs: &Path, force: bool) -> Result<()> {
  let (_lock, mut registry) = open_registry(prefs, LockMode::Exclusive, "clear")?;

  let saved = registry.list_saved().len();
  let legacy = registry.legacy_saved().len();
  if saved == 0 && legacy == 0 {
    print_info("No saved anchors.");
    return Ok(());
  }

  if !confirm(&format!("Remove {saved} saved anchor(s) from {}?", prefs.display()), force)? {
    print_info("Aborted.");
    return Ok(());
  }

  let removed = registry.clear_all()?;
  print_success(&format!("Removed {removed} saved anchor(s)"));
  Ok(())
}
