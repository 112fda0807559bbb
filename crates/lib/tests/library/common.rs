//! Shared helpers for library integration tests.

use std::path::PathBuf;
use std::rc::Rc;

use tempfile::TempDir;

use anchorkeep_lib::anchor::SimulatedPlatform;
use anchorkeep_lib::controller::AnchorController;
use anchorkeep_lib::prefs::FilePrefs;
use anchorkeep_lib::scene::RecordingScene;
use anchorkeep_lib::status::RecordingStatus;

pub type FileController = AnchorController<SimulatedPlatform, RecordingScene, FilePrefs>;

/// Preference file and device storage in one temp directory, so several
/// "app launches" can share them.
pub struct Device {
  pub temp: TempDir,
}

impl Device {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn prefs_path(&self) -> PathBuf {
    self.temp.path().join("prefs.json")
  }

  pub fn device_path(&self) -> PathBuf {
    self.temp.path().join("device.json")
  }

  /// Start a new session on the stored state.
  pub fn launch(&self) -> (FileController, Rc<RecordingStatus>) {
    let status = Rc::new(RecordingStatus::new());
    let controller = AnchorController::builder(
      SimulatedPlatform::open(self.device_path()).unwrap(),
      RecordingScene::new(),
      FilePrefs::open(self.prefs_path()).unwrap(),
    )
    .status(Rc::clone(&status))
    .build();
    (controller, status)
  }
}
