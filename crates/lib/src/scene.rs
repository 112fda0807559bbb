//! Scene collaborator: whatever renders placed objects.
//!
//! The core only needs to create an object at a pose, destroy it and tint it
//! to reflect its saved state.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Color, ObjectKind, Pose};

/// Opaque handle to a live object in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ObjectHandle(pub u64);

impl std::fmt::Display for ObjectHandle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "#{}", self.0)
  }
}

pub trait Scene {
  fn instantiate(&self, kind: ObjectKind, pose: &Pose) -> ObjectHandle;

  fn destroy(&self, object: ObjectHandle);

  fn set_color(&self, object: ObjectHandle, color: Color);
}

/// Colors used to show an object's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
  pub saved: Color,
  pub unsaved: Color,
  pub highlight: Color,
}

impl Default for Palette {
  fn default() -> Self {
    Self {
      saved: Color::GREEN,
      unsaved: Color::RED,
      highlight: Color::BLUE,
    }
  }
}

impl Palette {
  pub fn for_state(&self, saved: bool) -> Color {
    if saved { self.saved } else { self.unsaved }
  }
}

/// A live object tracked by [`RecordingScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
  pub kind: ObjectKind,
  pub pose: Pose,
  pub color: Option<Color>,
}

/// In-memory scene that records what the core asked it to do.
#[derive(Debug, Default)]
pub struct RecordingScene {
  next_id: Cell<u64>,
  objects: RefCell<BTreeMap<ObjectHandle, SceneObject>>,
  destroyed: RefCell<Vec<ObjectHandle>>,
}

impl RecordingScene {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn object(&self, handle: ObjectHandle) -> Option<SceneObject> {
    self.objects.borrow().get(&handle).cloned()
  }

  /// Live objects in creation order.
  pub fn objects(&self) -> Vec<(ObjectHandle, SceneObject)> {
    self
      .objects
      .borrow()
      .iter()
      .map(|(handle, object)| (*handle, object.clone()))
      .collect()
  }

  pub fn len(&self) -> usize {
    self.objects.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.objects.borrow().is_empty()
  }

  pub fn destroyed(&self) -> Vec<ObjectHandle> {
    self.destroyed.borrow().clone()
  }
}

impl Scene for RecordingScene {
  fn instantiate(&self, kind: ObjectKind, pose: &Pose) -> ObjectHandle {
    let handle = ObjectHandle(self.next_id.get());
    self.next_id.set(handle.0 + 1);
    self.objects.borrow_mut().insert(
      handle,
      SceneObject {
        kind,
        pose: *pose,
        color: None,
      },
    );
    handle
  }

  fn destroy(&self, object: ObjectHandle) {
    if self.objects.borrow_mut().remove(&object).is_some() {
      self.destroyed.borrow_mut().push(object);
    }
  }

  fn set_color(&self, object: ObjectHandle, color: Color) {
    if let Some(entry) = self.objects.borrow_mut().get_mut(&object) {
      entry.color = Some(color);
    }
  }
}
