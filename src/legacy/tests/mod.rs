//! Legacy module tests
//!
//! Contains test suites for legacy import:
//! - Flat file parsing (sections, quoting, multi-line values)
//! - Key grouping and orphan flushing
//! - Phrase construction from defaults and overrides

#[cfg(test)]
mod importer_tests;
