// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Snapshot write transaction with backup and restore
//!
//! Provides the write half of `FileStore`.

use atomic_write_file::AtomicWriteFile;
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing::{error, info};

use crate::config::{backup_path_for, PersistenceError};

/// One snapshot write with a rollback point.
///
/// # Lifecycle
///
/// 1. `begin()` - Copies the existing snapshot to `<file>~`
/// 2. `commit()` - Writes the new content atomically
/// 3. `rollback()` - On failure, puts the backup back
///
/// When no snapshot existed before `begin()`, rolling back removes
/// whatever the failed write left behind.
///
/// # Example
///
/// ```no_run
/// use phrasebook::config::SnapshotTransaction;
/// use std::path::Path;
///
/// let path = Path::new("phrasebook.json");
/// let tx = SnapshotTransaction::begin(path)?;
///
/// if let Err(e) = tx.commit(b"{}") {
///     eprintln!("Commit failed: {}", e);
///     tx.rollback()?;
/// }
/// # Ok::<(), phrasebook::config::PersistenceError>(())
/// ```
#[derive(Debug)]
pub struct SnapshotTransaction<'a> {
    path: &'a Path,
    backup_path: Option<PathBuf>,
}

impl<'a> SnapshotTransaction<'a> {
    /// Begins a transaction, backing up the current snapshot if there is one.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::BackupFailed` if the existing snapshot
    /// cannot be copied. Nothing has been written in that case.
    pub fn begin(path: &'a Path) -> Result<Self, PersistenceError> {
        if !path.exists() {
            return Ok(Self {
                path,
                backup_path: None,
            });
        }

        let backup_path = backup_path_for(path);
        info!(backup = %backup_path.display(), "Backing up existing config file");
        fs::copy(path, &backup_path).map_err(|e| {
            PersistenceError::BackupFailed(format!("{} -> {}: {}", path.display(), backup_path.display(), e))
        })?;

        Ok(Self {
            path,
            backup_path: Some(backup_path),
        })
    }

    /// The backup taken by `begin()`, if a snapshot existed.
    pub fn backup_path(&self) -> Option<&Path> {
        self.backup_path.as_deref()
    }

    /// Writes `content` atomically over the snapshot.
    pub fn commit(&self, content: &[u8]) -> Result<(), PersistenceError> {
        self.commit_with(content, write_atomic)
    }

    pub(crate) fn commit_with<W>(&self, content: &[u8], write: W) -> Result<(), PersistenceError>
    where
        W: FnOnce(&Path, &[u8]) -> io::Result<()>,
    {
        write(self.path, content).map_err(|e| PersistenceError::WriteFailed(e.to_string()))
    }

    /// Restores the snapshot to its state at `begin()`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::RestoreFailed` if the backup cannot be
    /// copied back (or the new file cannot be removed).
    pub fn rollback(&self) -> Result<(), PersistenceError> {
        match &self.backup_path {
            Some(backup) => {
                let content = fs::read(backup).map_err(|e| restore_failed(backup, e))?;
                write_atomic(self.path, &content).map_err(|e| restore_failed(backup, e))?;
                info!(path = %self.path.display(), "Backup has been restored");
            }
            None => match fs::remove_file(self.path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(restore_failed(self.path, e)),
            },
        }

        Ok(())
    }
}

fn restore_failed(backup: &Path, e: io::Error) -> PersistenceError {
    error!(backup = %backup.display(), error = %e, "Failed to restore configuration backup");
    PersistenceError::RestoreFailed {
        backup: backup.to_path_buf(),
        message: e.to_string(),
    }
}

/// Writes `content` to `path` via temp file and rename.
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = AtomicWriteFile::options().open(path)?;
    file.write_all(content)?;
    file.commit()
}
