mod check;
mod clear;
mod forget;
mod info;
mod list;
mod migrate;
mod session;
mod set_type;

pub use check::cmd_check;
pub use clear::cmd_clear;
pub use forget::cmd_forget;
pub use info::cmd_info;
pub use list::cmd_list;
pub use migrate::cmd_migrate;
pub use session::cmd_session;
pub use set_type::cmd_set_type;

use std::path::Path;

use anyhow::{Context, Result};

use anchorkeep_lib::lock::{LockMode, PrefsLock};
use anchorkeep_lib::prefs::FilePrefs;
use anchorkeep_lib::registry::IdentifierRegistry;

/// Lock the preference file, then open the registry on it. The lock must
/// outlive every write through the registry.
fn open_registry(prefs: &Path, mode: LockMode, command: &str) -> Result<(PrefsLock, IdentifierRegistry<FilePrefs>)> {
  let lock = PrefsLock::acquire(prefs, mode, command).context("Failed to lock preferences")?;
  let store = FilePrefs::open(prefs).with_context(|| format!("Failed to open preferences at {}", prefs.display()))?;
  Ok((lock, IdentifierRegistry::new(store)))
}
