mod common;
mod registry_tests;
mod session_tests;
