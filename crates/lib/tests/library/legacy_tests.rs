//! Anchors saved in the legacy numbered layout are restorable after migration.

use glam::Vec3;

use anchorkeep_lib::anchor::LoadOptions;
use anchorkeep_lib::prefs::{FilePrefs, PrefsStore};
use anchorkeep_lib::registry::IdentifierRegistry;
use anchorkeep_lib::types::{AnchorUuid, Pose};

use super::common::Device;

#[tokio::test]
async fn migrated_anchors_restore_as_walls() {
  let device = Device::new();
  let uuid = AnchorUuid::new_v4();

  {
    let (controller, _) = device.launch();
    controller.platform().insert_stored(uuid, Pose::at(Vec3::Y)).unwrap();
  }
  {
    let mut store = FilePrefs::open(device.prefs_path()).unwrap();
    store.set_int("numUuid", 1).unwrap();
    store.set_string("uuid0", &uuid.to_string()).unwrap();

    let mut registry = IdentifierRegistry::new(store);
    assert_eq!(registry.legacy_saved(), vec![uuid]);
    assert_eq!(registry.migrate_legacy().unwrap(), 1);
    assert!(registry.check().is_consistent());
  }

  let (controller, _) = device.launch();
  let report = controller.restore(&LoadOptions::default()).await.unwrap();

  assert_eq!(report.restored_count(), 1);
  assert_eq!(controller.scene().objects()[0].1.kind, anchorkeep_lib::types::ObjectKind::Wall);
  assert!(!controller.registry().store().has_key("numUuid"));
}
