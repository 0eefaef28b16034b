//! Core module tests
//!
//! Contains test suites for core functionality:
//! - Tree structure and derived index tests
//! - Uniqueness checks and conflict detection tests
//! - Configuration manager tests (rebuild, persistence, import)

#[cfg(test)]
mod manager_tests;
