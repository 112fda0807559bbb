mod common;
mod legacy_tests;
mod lifecycle_tests;
