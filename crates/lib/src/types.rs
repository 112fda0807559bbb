//! Core value types: anchor identifiers, object kinds, poses and colors.

use std::fmt;
use std::str::FromStr;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// Identifier of a spatial anchor.
///
/// Displayed and stored in lowercase hyphenated form, e.g.
/// `"67e55044-10b1-426f-9247-bb680e5fe0c8"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnchorUuid(pub Uuid);

impl AnchorUuid {
  /// Generate a fresh random identifier.
  pub fn new_v4() -> Self {
    Self(Uuid::new_v4())
  }

  /// Parse an identifier, tolerating surrounding whitespace.
  pub fn parse(value: &str) -> Result<Self, uuid::Error> {
    Uuid::parse_str(value.trim()).map(Self)
  }
}

impl fmt::Display for AnchorUuid {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.hyphenated())
  }
}

impl FromStr for AnchorUuid {
  type Err = uuid::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl From<Uuid> for AnchorUuid {
  fn from(value: Uuid) -> Self {
    Self(value)
  }
}

/// The kind of object placed at an anchor.
///
/// Persisted as a lowercase string under `type_<uuid>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
  #[default]
  Wall,
  Cube,
  Floor,
  Table,
  Chair,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown object kind: {0}")]
pub struct UnknownKind(pub String);

impl ObjectKind {
  pub const ALL: [ObjectKind; 5] = [
    ObjectKind::Wall,
    ObjectKind::Cube,
    ObjectKind::Floor,
    ObjectKind::Table,
    ObjectKind::Chair,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      ObjectKind::Wall => "wall",
      ObjectKind::Cube => "cube",
      ObjectKind::Floor => "floor",
      ObjectKind::Table => "table",
      ObjectKind::Chair => "chair",
    }
  }

  /// Interpret a stored kind string.
  ///
  /// Missing values fall back to [`ObjectKind::Wall`] silently; unknown values
  /// fall back to it with a warning.
  pub fn from_stored(value: Option<&str>) -> Self {
    match value {
      None => ObjectKind::default(),
      Some(raw) => raw.parse().unwrap_or_else(|err: UnknownKind| {
        warn!(value = %err.0, "unknown stored object kind, using fallback");
        ObjectKind::default()
      }),
    }
  }
}

impl fmt::Display for ObjectKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ObjectKind {
  type Err = UnknownKind;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let normalized = s.trim().to_ascii_lowercase();
    ObjectKind::ALL
      .into_iter()
      .find(|kind| kind.as_str() == normalized)
      .ok_or_else(|| UnknownKind(s.to_string()))
  }
}

/// Position and orientation of an anchor in tracking space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
  pub position: Vec3,
  pub rotation: Quat,
}

impl Pose {
  pub const IDENTITY: Pose = Pose {
    position: Vec3::ZERO,
    rotation: Quat::IDENTITY,
  };

  pub fn new(position: Vec3, rotation: Quat) -> Self {
    Self { position, rotation }
  }

  /// Pose at `position` with no rotation.
  pub fn at(position: Vec3) -> Self {
    Self {
      position,
      rotation: Quat::IDENTITY,
    }
  }

  /// Pose at `position` rotated `degrees` around the vertical axis.
  pub fn at_yaw(position: Vec3, degrees: f32) -> Self {
    Self {
      position,
      rotation: Quat::from_rotation_y(degrees.to_radians()),
    }
  }
}

impl Default for Pose {
  fn default() -> Self {
    Self::IDENTITY
  }
}

impl fmt::Display for Pose {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let p = self.position;
    write!(f, "({:.2}, {:.2}, {:.2})", p.x, p.y, p.z)
  }
}

/// An sRGB color, serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color '{0}', expected #rrggbb")]
pub struct InvalidColor(pub String);

impl Color {
  pub const RED: Color = Color::rgb(255, 0, 0);
  pub const GREEN: Color = Color::rgb(0, 255, 0);
  pub const BLUE: Color = Color::rgb(0, 0, 255);
  pub const WHITE: Color = Color::rgb(255, 255, 255);

  pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
    Self { r, g, b }
  }
}

impl fmt::Display for Color {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
  }
}

impl FromStr for Color {
  type Err = InvalidColor;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || InvalidColor(s.to_string());
    let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
    if hex.len() != 6 || !hex.is_ascii() {
      return Err(invalid());
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).map_err(|_| invalid());
    Ok(Color::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
  }
}

impl TryFrom<String> for Color {
  type Error = InvalidColor;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Color> for String {
  fn from(value: Color) -> Self {
    value.to_string()
  }
}

/// Persistence view of a placed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnchorRecord {
  pub uuid: AnchorUuid,
  pub kind: ObjectKind,
  pub saved: bool,
}
