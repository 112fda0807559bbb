//! anchorkeep-lib: persistence and restoration of spatial anchors.
//!
//! Objects placed in a mixed-reality scene are attached to anchors owned by
//! the device's anchor platform. This crate keeps track of which anchors the
//! user saved and what kind of object sat on each, so a later session can
//! bring them back:
//! - `registry`: the durable save-list and per-anchor kinds, on top of `prefs`
//! - `controller`: place, save/unsave toggling, delete and bulk unsave
//! - `restore`: batch load, localization and re-binding at startup
//! - `anchor`: the platform seam, plus a simulated platform for tests and the CLI

pub mod anchor;
pub mod binding;
pub mod config;
pub mod consts;
pub mod controller;
pub mod lock;
pub mod paths;
pub mod prefs;
pub mod registry;
pub mod restore;
pub mod scene;
pub mod status;
pub mod types;
pub mod util;
