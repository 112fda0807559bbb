//! `anchorkeep check`: report layout inconsistencies without fixing them.

use std::path::Path;

use anyhow::Result;

use anchorkeep_lib::lock::LockMode;

use super::open_registry;
use crate::output::{OutputFormat, print_json, print_stat, print_success, print_warning};

pub fn cmd_check(prefs: &Path, output: OutputFormat) -> Result<()> {
  let (_lock, registry) = open_registry(prefs, LockMode::Shared, "check")?;
  let report = registry.check();

  if output.is_json() {
    return print_json(&report);
  }

  if report.is_consistent() {
    print_success("Preferences are consistent");
  } else {
    for entry in &report.malformed {
      print_warning(&format!("Malformed save-list entry: {entry:?}"));
    }
    for uuid in &report.missing_marker {
      print_warning(&format!("Listed without saved marker: {uuid}"));
    }
    for uuid in &report.orphan_markers {
      print_warning(&format!("Saved marker not in save-list: {uuid}"));
    }
  }

  print_stat("Saved", &report.saved.len().to_string());
  if !report.legacy.is_empty() {
    print_stat("Legacy", &report.legacy.len().to_string());
  }

  Ok(())
}
