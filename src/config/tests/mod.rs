//! Config module tests
//!
//! Contains test suites for snapshot persistence:
//! - FileStore save/load round trips
//! - Backup creation and restore on failed writes
//! - Transaction rollback
