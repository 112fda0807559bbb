//! Place, save and restore across several sessions on file-backed storage.

use glam::Vec3;

use anchorkeep_lib::anchor::LoadOptions;
use anchorkeep_lib::controller::{Deleted, Toggled};
use anchorkeep_lib::restore::RestoreState;
use anchorkeep_lib::status::AnchorStatus;
use anchorkeep_lib::types::{ObjectKind, Pose};

use super::common::Device;

#[tokio::test]
async fn only_saved_anchors_come_back() {
  let device = Device::new();
  let kept_pose = Pose::at_yaw(Vec3::new(0.0, 1.5, -1.0), 180.0);

  let (kept, dropped) = {
    let (controller, _) = device.launch();
    let kept = controller.place(ObjectKind::Table, kept_pose).await.unwrap();
    let dropped = controller.place(ObjectKind::Cube, Pose::at(Vec3::X)).await.unwrap();
    assert_eq!(controller.toggle_save(kept).await.unwrap(), Toggled::Saved);
    (kept, dropped)
  };

  let (controller, status) = device.launch();
  let report = controller.restore(&LoadOptions::default()).await.unwrap();

  assert_eq!(report.restored, vec![(kept, ObjectKind::Table)]);
  assert!(controller.bindings().get(&dropped).is_none());
  let objects = controller.scene().objects();
  assert_eq!(objects.len(), 1);
  assert_eq!(objects[0].1.pose, kept_pose);
  assert_eq!(status.events(), vec![(Some(kept), AnchorStatus::Restored)]);
}

#[tokio::test]
async fn delete_in_later_session_is_permanent() {
  let device = Device::new();

  let uuid = {
    let (controller, _) = device.launch();
    let uuid = controller.place(ObjectKind::Wall, Pose::IDENTITY).await.unwrap();
    controller.toggle_save(uuid).await.unwrap();
    uuid
  };

  {
    let (controller, _) = device.launch();
    controller.restore(&LoadOptions::default()).await.unwrap();
    assert_eq!(controller.delete(uuid).await.unwrap(), Deleted::Removed);
  }

  let (controller, _) = device.launch();
  let report = controller.restore(&LoadOptions::default()).await.unwrap();
  assert_eq!(report.listed_count(), 0);
  assert!(controller.scene().is_empty());
  assert!(controller.platform().stored().is_empty());
}

#[tokio::test]
async fn anchor_missing_from_device_stays_listed() {
  let device = Device::new();

  let uuid = {
    let (controller, _) = device.launch();
    let uuid = controller.place(ObjectKind::Floor, Pose::IDENTITY).await.unwrap();
    controller.toggle_save(uuid).await.unwrap();
    uuid
  };
  std::fs::remove_file(device.device_path()).unwrap();

  let (controller, _) = device.launch();
  let report = controller.restore(&LoadOptions::default()).await.unwrap();

  assert_eq!(report.state(&uuid), Some(RestoreState::NotFound));
  assert_eq!(controller.registry().list_saved(), vec![uuid]);
}

#[tokio::test]
async fn unsave_all_also_drops_anchors_that_failed_to_restore() {
  let device = Device::new();

  let (kept, stale) = {
    let (controller, _) = device.launch();
    let kept = controller.place(ObjectKind::Wall, Pose::IDENTITY).await.unwrap();
    let stale = controller.place(ObjectKind::Cube, Pose::at(Vec3::Z)).await.unwrap();
    controller.toggle_save(kept).await.unwrap();
    controller.toggle_save(stale).await.unwrap();
    (kept, stale)
  };

  {
    let (controller, _) = device.launch();
    controller.platform().faults_mut().fail_localize.insert(stale);
    let report = controller.restore(&LoadOptions::default()).await.unwrap();
    assert_eq!(report.restored_count(), 1);

    let result = controller.unsave_all().await;
    assert_eq!(result.unsaved, vec![kept]);
    assert_eq!(result.dropped, vec![stale]);
    assert!(result.failed.is_empty());
    assert!(controller.registry().list_saved().is_empty());
  }

  let (controller, _) = device.launch();
  let report = controller.restore(&LoadOptions::default()).await.unwrap();
  assert_eq!(report.listed_count(), 0);
  assert!(controller.scene().is_empty());
}
