//! Names and key layout shared across the crate.

/// Application name used for config/data directories.
pub const APP_NAME: &str = "anchorkeep";

/// Preference key holding the comma-joined save-list.
pub const SAVE_LIST_KEY: &str = "anchor_ids";

/// Prefix of the per-anchor "saved" marker key (`anchor_<uuid>`).
pub const SAVED_MARKER_PREFIX: &str = "anchor_";

/// Prefix of the per-anchor object kind key (`type_<uuid>`).
pub const KIND_PREFIX: &str = "type_";

/// Legacy layout: number of indexed UUID slots.
pub const LEGACY_COUNT_KEY: &str = "numUuid";

/// Legacy layout: prefix of indexed UUID slots (`uuid0`, `uuid1`, ...).
pub const LEGACY_SLOT_PREFIX: &str = "uuid";

/// Separator used in the serialized save-list.
pub const SAVE_LIST_SEPARATOR: char = ',';

pub const PREFS_FILENAME: &str = "prefs.json";
pub const DEVICE_FILENAME: &str = "device.json";
pub const CONFIG_FILENAME: &str = "config.toml";
pub const LOCK_FILENAME: &str = ".lock";

/// Current on-disk format version of the preference file.
pub const PREFS_VERSION: u32 = 1;

/// Current on-disk format version of the simulated device storage.
pub const DEVICE_VERSION: u32 = 1;
