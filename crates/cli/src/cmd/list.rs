//! `anchorkeep list`: show the save-list.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use anchorkeep_lib::lock::LockMode;
use anchorkeep_lib::types::{AnchorUuid, ObjectKind};

use super::open_registry;
use crate::output::{OutputFormat, print_info, print_json, print_stat, print_warning, symbols};

#[derive(Serialize)]
struct SavedEntry {
  uuid: AnchorUuid,
  kind: ObjectKind,
  marked: bool,
}

pub fn cmd_list(prefs: &Path, verbose: bool, output: OutputFormat) -> Result<()> {
  let (_lock, registry) = open_registry(prefs, LockMode::Shared, "list")?;

  let entries: Vec<SavedEntry> = registry
    .list_saved()
    .into_iter()
    .map(|uuid| SavedEntry {
      uuid,
      kind: registry.get_type(&uuid),
      marked: registry.is_saved(&uuid),
    })
    .collect();

  if output.is_json() {
    return print_json(&entries);
  }

  if entries.is_empty() {
    print_info("No saved anchors.");
  } else {
    println!("Saved anchors:");
    for entry in &entries {
      println!("  {} {} {}", symbols::INFO, entry.uuid, entry.kind);
      if !entry.marked {
        print_warning(&format!("{} is listed but has no saved marker", entry.uuid));
      }
    }
  }

  let legacy = registry.legacy_saved();
  if !legacy.is_empty() {
    print_warning(&format!(
      "{} anchor(s) in the legacy layout; run 'anchorkeep migrate'",
      legacy.len()
    ));
  }

  if verbose {
    println!();
    print_stat("Preferences", &prefs.display().to_string());
    print_stat("Saved", &entries.len().to_string());
  }

  Ok(())
}
