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

//! Configuration manager - owns the tree and keeps everything derived from it current
//!
//! # Responsibilities
//!
//! - Hold the phrase/folder tree, the global hotkeys and the settings
//! - Recompute the derived indexes after every change (`rebuild`)
//! - Persist a snapshot and re-register global hotkeys on every rebuild
//! - Answer abbreviation and hotkey uniqueness questions
//! - Import legacy abbreviation files as a candidate folder
//!
//! # Architecture
//!
//! Persistence and hotkey registration are reached through the
//! `SnapshotStore` and `HotkeyRegistrar` traits, so the manager never
//! knows the file format or the windowing system. Every mutation goes
//! through `&mut self`; callers that change the tree via `tree_mut()` must
//! call `rebuild()` before relying on the indexes again.

use std::path::Path;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::app::{ActionRegistry, HotkeyRegistrar};
use crate::config::settings::Settings;
use crate::config::{PersistenceError, SnapshotStore, TreeSnapshot};
use crate::core::conflict::{self, Conflict, ConflictDetector};
use crate::core::tree::{compute_indexes, ConfigTree, FolderId, Indexes, ItemId, PhraseId, TreeError};
use crate::core::types::{Folder, GlobalHotkeys, Hotkey, Phrase};
use crate::legacy::{ImportError, LegacyImporter};

/// Title of the folder legacy abbreviations are imported into
pub const DEFAULT_IMPORT_FOLDER: &str = "Imported Abbreviations";

/// Errors surfaced by `ConfigurationManager`
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Owner of the configuration tree and its derived state
pub struct ConfigurationManager {
    snapshot: TreeSnapshot,
    indexes: Indexes,
    settings: Settings,
    store: Box<dyn SnapshotStore>,
    app: Box<dyn HotkeyRegistrar>,
}

impl ConfigurationManager {
    /// First-run construction with the sample tree and default settings.
    ///
    /// Performs an initial `rebuild()`, which persists the new
    /// configuration and registers the global hotkeys.
    ///
    /// # Example
    ///
    /// ```
    /// use phrasebook::app::NullRegistrar;
    /// use phrasebook::config::FileStore;
    /// use phrasebook::core::ConfigurationManager;
    ///
    /// let dir = tempfile::tempdir()?;
    /// let store = FileStore::new(dir.path().join("phrasebook.json").to_string_lossy());
    ///
    /// let manager = ConfigurationManager::create(Box::new(store), Box::new(NullRegistrar))?;
    /// assert!(!manager.check_abbreviation_unique("adr", None));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn create(
        store: Box<dyn SnapshotStore>,
        app: Box<dyn HotkeyRegistrar>,
    ) -> Result<Self, ManagerError> {
        info!("No configuration file found - creating new one");

        let mut manager = Self {
            snapshot: TreeSnapshot {
                tree: ConfigTree::seed()?,
                global_hotkeys: GlobalHotkeys::default(),
            },
            indexes: Indexes::default(),
            settings: Settings::default(),
            store,
            app,
        };

        manager.rebuild()?;
        Ok(manager)
    }

    /// Restores the saved configuration, or creates the first-run one.
    ///
    /// A restored configuration is not written back; its indexes are
    /// computed and its global hotkeys registered.
    pub fn load_or_create(
        store: Box<dyn SnapshotStore>,
        app: Box<dyn HotkeyRegistrar>,
    ) -> Result<Self, ManagerError> {
        let Some((settings, snapshot)) = store.load()? else {
            return Self::create(store, app);
        };

        let indexes = compute_indexes(&snapshot.tree);
        let mut manager = Self {
            snapshot,
            indexes,
            settings,
            store,
            app,
        };

        manager.register_global_hotkeys();
        info!(
            folders = manager.indexes.all_folders.len(),
            phrases = manager.indexes.all_phrases.len(),
            "Successfully loaded configuration"
        );
        Ok(manager)
    }

    /// Recomputes the indexes, persists the snapshot and re-registers the
    /// global hotkeys.
    ///
    /// The global hotkeys are registered even when saving fails.
    ///
    /// # Errors
    ///
    /// Returns `ManagerError::Persistence` if the snapshot could not be
    /// saved. The in-memory state is fully rebuilt regardless.
    pub fn rebuild(&mut self) -> Result<(), ManagerError> {
        info!("Configuration changed - rebuilding in-memory structures");

        self.indexes = compute_indexes(&self.snapshot.tree);
        self.log_indexes();

        let saved = self.store.save(&self.settings, &self.snapshot);
        if let Err(e) = &saved {
            error!(error = %e, "Failed to persist configuration");
        }

        self.register_global_hotkeys();
        saved.map_err(ManagerError::from)
    }

    /// Returns true if `abbreviation` is free for `candidate` to use.
    ///
    /// See `conflict::check_abbreviation_unique`.
    pub fn check_abbreviation_unique(&self, abbreviation: &str, candidate: Option<ItemId>) -> bool {
        conflict::check_abbreviation_unique(&self.snapshot.tree, &self.indexes, abbreviation, candidate)
    }

    /// Returns true if `hotkey` is free for `candidate` to use.
    ///
    /// Enabled global hotkeys always count as a conflict.
    pub fn check_hotkey_unique(&self, hotkey: &Hotkey, candidate: Option<ItemId>) -> bool {
        conflict::check_hotkey_unique(
            &self.snapshot.tree,
            &self.indexes,
            &self.snapshot.global_hotkeys,
            hotkey,
            candidate,
        )
    }

    /// Imports a legacy abbreviations file as a candidate folder.
    ///
    /// The tree is not modified; pass the result to `attach_import` to add
    /// it.
    ///
    /// # Errors
    ///
    /// Any importer failure, or `ImportError::AbbreviationInUse` for the
    /// first imported abbreviation already used in the tree. No phrases
    /// are returned on error.
    pub fn import_legacy(&self, path: &Path) -> Result<(Folder, Vec<Phrase>), ManagerError> {
        let phrases = LegacyImporter::new().load(path)?;

        for abbreviation in phrases.iter().filter_map(|p| p.abbreviation.as_deref()) {
            if !self.check_abbreviation_unique(abbreviation, None) {
                return Err(ImportError::AbbreviationInUse(abbreviation.to_string()).into());
            }
        }

        Ok((Folder::new(DEFAULT_IMPORT_FOLDER), phrases))
    }

    /// Adds an imported folder as a root folder holding `phrases`, then
    /// rebuilds.
    pub fn attach_import(&mut self, folder: Folder, phrases: Vec<Phrase>) -> Result<FolderId, ManagerError> {
        let tree = &mut self.snapshot.tree;
        let folder_id = tree.add_root_folder(folder)?;
        for phrase in phrases {
            tree.add_phrase(folder_id, phrase)?;
        }

        self.rebuild()?;
        Ok(folder_id)
    }

    /// Every abbreviation or hotkey claimed more than once.
    pub fn conflicts(&self) -> Vec<Conflict> {
        ConflictDetector::from_tree(&self.snapshot.tree, &self.indexes, &self.snapshot.global_hotkeys)
            .find_conflicts()
    }

    /// Runs the action of the enabled global hotkey bound to `hotkey`.
    ///
    /// Returns false when no enabled global hotkey matches or its action has
    /// no handler.
    pub fn dispatch_global_hotkey(&self, hotkey: &Hotkey, registry: &mut ActionRegistry) -> bool {
        match self.snapshot.global_hotkeys.iter().find(|g| g.matches(hotkey)) {
            Some(global) => {
                debug!(%hotkey, action = %global.action, "Triggered global hotkey");
                registry.invoke(global.action)
            }
            None => false,
        }
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.snapshot.tree
    }

    /// Mutable tree access. Call `rebuild()` after changing the tree.
    pub fn tree_mut(&mut self) -> &mut ConfigTree {
        &mut self.snapshot.tree
    }

    pub fn indexes(&self) -> &Indexes {
        &self.indexes
    }

    pub fn global_hotkeys(&self) -> &GlobalHotkeys {
        &self.snapshot.global_hotkeys
    }

    /// Mutable global hotkeys. Call `rebuild()` to persist and re-register.
    pub fn global_hotkeys_mut(&mut self) -> &mut GlobalHotkeys {
        &mut self.snapshot.global_hotkeys
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    fn register_global_hotkeys(&mut self) {
        let hotkeys = &self.snapshot.global_hotkeys;
        self.app
            .register_global_hotkeys(&hotkeys.config, &hotkeys.toggle_service, &hotkeys.show_popup);
    }

    fn log_indexes(&self) {
        let tree = &self.snapshot.tree;
        let folder_titles = |ids: &[FolderId]| -> Vec<String> {
            ids.iter()
                .filter_map(|id| tree.folder(*id).map(|f| f.title.clone()))
                .collect()
        };
        let phrase_titles = |ids: &[PhraseId]| -> Vec<String> {
            ids.iter()
                .filter_map(|id| tree.phrase(*id).map(|p| p.title.clone()))
                .collect()
        };

        let globals: Vec<String> = self.snapshot.global_hotkeys.iter().map(ToString::to_string).collect();
        debug!(?globals, "Global hotkeys");
        debug!(titles = ?folder_titles(&self.indexes.hotkey_folders), "Hotkey folders");
        debug!(titles = ?phrase_titles(&self.indexes.hotkey_phrases), "Hotkey phrases");
        debug!(titles = ?phrase_titles(&self.indexes.abbreviation_phrases), "Abbreviation phrases");
        debug!(titles = ?folder_titles(&self.indexes.all_folders), "All folders");
        debug!(titles = ?phrase_titles(&self.indexes.all_phrases), "All phrases");
    }
}

impl std::fmt::Debug for ConfigurationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationManager")
            .field("snapshot", &self.snapshot)
            .field("indexes", &self.indexes)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
