use std::path::Path;

use anyhow::Result;

use anchorkeep_lib::config::AnchorConfig;
use anchorkeep_lib::paths::{config_path, device_path, lock_path_for};

use crate::output::{OutputFormat, print_json, print_stat};

pub fn cmd_info(prefs: &Path, output: OutputFormat) -> Result<()> {
  let config = AnchorConfig::load();
  let timeout = config
    .load_timeout()
    .map(|t| humantime::format_duration(t).to_string())
    .unwrap_or_else(|| "platform default".to_string());

  if output.is_json() {
    return print_json(&serde_json::json!({
      "version": env!("CARGO_PKG_VERSION"),
      "prefs": prefs,
      "device": device_path(),
      "config": config_path(),
      "lock": lock_path_for(prefs),
      "settings": config,
    }));
  }

  println!("anchorkeep v{}", env!("CARGO_PKG_VERSION"));
  println!();
  println!("Files:");
  print_stat("Preferences", &prefs.display().to_string());
  print_stat("Device", &device_path().display().to_string());
  print_stat("Config", &config_path().display().to_string());
  print_stat("Lock", &lock_path_for(prefs).display().to_string());
  println!();
  println!("Settings:");
  print_stat("Load timeout", &timeout);
  print_stat("Storage", &format!("{:?}", config.storage).to_lowercase());
  print_stat("Default kind", config.default_kind.as_str());
  print_stat(
    "Colors",
    &format!(
      "saved {}, unsaved {}, highlight {}",
      config.palette.saved, config.palette.unsaved, config.palette.highlight
    ),
  );
  Ok(())
}
