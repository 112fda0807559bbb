//! Shared utilities.

pub mod json_file;
