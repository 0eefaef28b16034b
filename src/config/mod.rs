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

//! Snapshot persistence with atomic writes and backup support.
//!
//! The configuration core hands a `(Settings, TreeSnapshot)` pair to a
//! `SnapshotStore` and never looks at the encoding. `FileStore` is the
//! on-disk implementation:
//!
//! - **JSON document**: `{ "settings": ..., "tree": ... }`
//! - **Backup**: the existing snapshot is copied to `<file>~` before writing
//! - **Atomic writes**: temp-file-then-rename, so a crash never leaves a
//!   half-written snapshot
//! - **Restore on failure**: if writing fails the backup is copied back, so
//!   the snapshot is byte-identical to what it was before the save
//!
//! # Example
//!
//! ```no_run
//! use phrasebook::config::{FileStore, SnapshotStore, TreeSnapshot};
//! use phrasebook::config::settings::Settings;
//!
//! let store = FileStore::new("~/.config/phrasebook/phrasebook.json");
//! store.save(&Settings::default(), &TreeSnapshot::default())?;
//!
//! if let Some((settings, snapshot)) = store.load()? {
//!     println!("{} root folders", snapshot.tree.root_folders().count());
//!     println!("first run: {}", settings.is_first_run);
//! }
//! # Ok::<(), phrasebook::config::PersistenceError>(())
//! ```

pub mod error;
pub mod settings;
pub mod transaction;

pub use error::PersistenceError;
pub use transaction::SnapshotTransaction;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::settings::Settings;
use crate::core::tree::ConfigTree;
use crate::core::types::GlobalHotkeys;

/// Default snapshot location, before tilde expansion.
pub const DEFAULT_STORE_PATH: &str = "~/.config/phrasebook/phrasebook.json";

/// The persisted part of the configuration: the tree and the global hotkeys.
///
/// Global hotkeys carry action identifiers only, so everything here is
/// plain data.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct TreeSnapshot {
    pub tree: ConfigTree,
    pub global_hotkeys: GlobalHotkeys,
}

/// Storage for configuration snapshots
pub trait SnapshotStore {
    /// Persists the settings and tree.
    fn save(&self, settings: &Settings, snapshot: &TreeSnapshot) -> Result<(), PersistenceError>;

    /// Loads the last saved snapshot, or `None` when nothing was saved yet.
    fn load(&self) -> Result<Option<(Settings, TreeSnapshot)>, PersistenceError>;
}

/// On-disk layout of a snapshot file.
///
/// Settings are read as a loose value so they can be merged additively
/// over the defaults.
#[derive(Deserialize)]
struct StoredDocument {
    #[serde(default)]
    settings: Value,
    tree: TreeSnapshot,
}

#[derive(Serialize)]
struct StoredDocumentRef<'a> {
    settings: &'a Settings,
    tree: &'a TreeSnapshot,
}

/// File-backed `SnapshotStore` writing JSON.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a store for `path`. A leading `~` or `$VAR` is expanded.
    pub fn new(path: impl AsRef<str>) -> Self {
        let expanded = shellexpand::full(path.as_ref())
            .map(|cow| cow.into_owned())
            .unwrap_or_else(|_| path.as_ref().to_string());

        Self {
            path: PathBuf::from(expanded),
        }
    }

    /// Store at the default location.
    pub fn at_default_location() -> Self {
        Self::new(DEFAULT_STORE_PATH)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the backup copy written before each save (`<file>~`).
    pub fn backup_path(&self) -> PathBuf {
        backup_path_for(&self.path)
    }

    /// Saves using `write` for the final write step.
    ///
    /// `save` passes an atomic writer; tests inject failing writers to
    /// exercise the restore path.
    pub(crate) fn save_with<W>(
        &self,
        settings: &Settings,
        snapshot: &TreeSnapshot,
        write: W,
    ) -> Result<(), PersistenceError>
    where
        W: FnOnce(&Path, &[u8]) -> io::Result<()>,
    {
        info!(path = %self.path.display(), "Persisting configuration");

        let document = StoredDocumentRef {
            settings,
            tree: snapshot,
        };
        let content = serde_json::to_vec_pretty(&document)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let transaction = SnapshotTransaction::begin(&self.path)?;

        if let Err(e) = transaction.commit_with(&content, write) {
            transaction.rollback()?;
            warn!(path = %self.path.display(), error = %e, "Error while saving configuration. Backup has been restored.");
            return Err(e);
        }

        info!("Finished persisting configuration");
        Ok(())
    }
}

impl SnapshotStore for FileStore {
    fn save(&self, settings: &Settings, snapshot: &TreeSnapshot) -> Result<(), PersistenceError> {
        self.save_with(settings, snapshot, transaction::write_atomic)
    }

    fn load(&self) -> Result<Option<(Settings, TreeSnapshot)>, PersistenceError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No configuration file found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        info!(path = %self.path.display(), "Loading config from existing file");

        let document: StoredDocument =
            serde_json::from_str(&content).map_err(|e| PersistenceError::Corrupt {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        let mut settings = Settings::default();
        settings
            .merge_from(&document.settings)
            .map_err(|e| PersistenceError::Corrupt {
                path: self.path.clone(),
                message: format!("invalid settings: {}", e),
            })?;

        debug!(?settings, "Global settings");
        Ok(Some((settings, document.tree)))
    }
}

fn backup_path_for(path: &Path) -> PathBuf {
    let mut backup = path.as_os_str().to_owned();
    backup.push("~");
    PathBuf::from(backup)
}

#[cfg(test)]
mod tests;
