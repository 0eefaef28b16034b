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

//! ConfigurationManager tests
//!
//! Uses an in-memory store so persistence can be observed (and made to
//! fail) without touching the filesystem, except for the legacy import
//! tests which need a file to read.

use std::cell::{Cell, RefCell};
use std::fs;
use std::rc::Rc;
use tempfile::TempDir;

use crate::app::{ActionRegistry, NullRegistrar, RecordingRegistrar};
use crate::config::settings::Settings;
use crate::config::{FileStore, PersistenceError, SnapshotStore, TreeSnapshot};
use crate::core::{
    ConfigurationManager, Folder, GlobalAction, Hotkey, ItemId, ManagerError, Modifier, Phrase,
    PhraseMode, DEFAULT_IMPORT_FOLDER,
};
use crate::legacy::ImportError;

/// In-memory store; clones share state.
#[derive(Clone, Default)]
struct MemoryStore {
    saved: Rc<RefCell<Option<(Settings, TreeSnapshot)>>>,
    saves: Rc<Cell<usize>>,
    fail: Rc<Cell<bool>>,
}

impl SnapshotStore for MemoryStore {
    fn save(&self, settings: &Settings, snapshot: &TreeSnapshot) -> Result<(), PersistenceError> {
        if self.fail.get() {
            return Err(PersistenceError::WriteFailed("store unavailable".to_string()));
        }
        *self.saved.borrow_mut() = Some((settings.clone(), snapshot.clone()));
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn load(&self) -> Result<Option<(Settings, TreeSnapshot)>, PersistenceError> {
        Ok(self.saved.borrow().clone())
    }
}

/// Helper: seeded manager plus handles on its collaborators.
fn create_manager() -> (ConfigurationManager, MemoryStore, RecordingRegistrar) {
    let store = MemoryStore::default();
    let registrar = RecordingRegistrar::new();
    let manager =
        ConfigurationManager::create(Box::new(store.clone()), Box::new(registrar.clone())).unwrap();
    (manager, store, registrar)
}

fn abbr_phrase(title: &str, abbreviation: &str) -> Phrase {
    let mut phrase = Phrase::new(title, "body");
    phrase.abbreviation = Some(abbreviation.to_string());
    phrase.set_modes(&[PhraseMode::Abbreviation]);
    phrase
}

const LEGACY_DEFAULTS: &str = "[defaults]
wordchars = [\\w]
immediate = False
ignorecase = False
matchcase = False
backspace = True
omittrigger = False
triggerinside = False
";

fn write_legacy(dir: &TempDir, abbr_lines: &str) -> std::path::PathBuf {
    let path = dir.path().join("abbr.ini");
    fs::write(&path, format!("{}\n[abbr]\n{}", LEGACY_DEFAULTS, abbr_lines)).unwrap();
    path
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_create_persists_and_registers() {
    let (manager, store, registrar) = create_manager();

    assert_eq!(store.saves.get(), 1);
    assert_eq!(registrar.registration_count(), 1);
    assert_eq!(manager.tree().phrase_count(), 8);
    assert_eq!(manager.indexes().all_phrases.len(), 8);
    assert!(manager.settings().is_first_run);
}

#[test]
fn test_load_or_create_restores_saved_state() {
    let (mut manager, store, _) = create_manager();
    manager.settings_mut().is_first_run = false;
    manager.global_hotkeys_mut().toggle_service.enabled = false;
    manager.rebuild().unwrap();
    let saved_indexes = manager.indexes().clone();

    let registrar = RecordingRegistrar::new();
    let restored =
        ConfigurationManager::load_or_create(Box::new(store.clone()), Box::new(registrar.clone()))
            .unwrap();

    assert!(!restored.settings().is_first_run);
    assert!(!restored.global_hotkeys().toggle_service.enabled);
    assert_eq!(restored.indexes(), &saved_indexes);
    assert_eq!(registrar.registration_count(), 1);
    assert_eq!(store.saves.get(), 2, "Loading should not write the snapshot back");
}

#[test]
fn test_load_or_create_rejects_cyclic_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("phrasebook.json");
    let store = FileStore::new(path.to_string_lossy());
    ConfigurationManager::create(Box::new(store.clone()), Box::new(NullRegistrar)).unwrap();

    // "Addresses" (folder 1) is made to contain its own parent, "My Phrases".
    let mut document: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    document["tree"]["tree"]["folders"][1]["folders"] = serde_json::json!([0]);
    fs::write(&path, serde_json::to_vec(&document).unwrap()).unwrap();

    let result = ConfigurationManager::load_or_create(Box::new(store), Box::new(NullRegistrar));
    assert!(matches!(
        result,
        Err(ManagerError::Persistence(PersistenceError::Corrupt { .. }))
    ));
}

#[test]
fn test_load_or_create_without_snapshot_seeds() {
    let store = MemoryStore::default();
    let manager =
        ConfigurationManager::load_or_create(Box::new(store.clone()), Box::new(NullRegistrar)).unwrap();

    assert!(manager.tree().root("My Phrases").is_some());
    assert_eq!(store.saves.get(), 1);
}

// ============================================================================
// Rebuild
// ============================================================================

#[test]
fn test_rebuild_is_idempotent() {
    let (mut manager, _, _) = create_manager();

    manager.rebuild().unwrap();
    let first = manager.indexes().clone();
    manager.rebuild().unwrap();

    assert_eq!(manager.indexes(), &first);
}

#[test]
fn test_rebuild_picks_up_tree_changes() {
    let (mut manager, _, _) = create_manager();
    let root = manager.tree().root("Tray Phrases").unwrap();
    let phrase = manager.tree_mut().add_phrase(root, abbr_phrase("New", "new")).unwrap();

    assert!(!manager.indexes().all_phrases.contains(&phrase));
    manager.rebuild().unwrap();
    assert!(manager.indexes().abbreviation_phrases.contains(&phrase));
}

#[test]
fn test_rebuild_registers_even_when_save_fails() {
    let (mut manager, store, registrar) = create_manager();
    store.fail.set(true);

    let root = manager.tree().root("Tray Phrases").unwrap();
    let phrase = manager.tree_mut().add_phrase(root, abbr_phrase("New", "new")).unwrap();
    let result = manager.rebuild();

    assert!(matches!(result, Err(ManagerError::Persistence(_))));
    assert_eq!(registrar.registration_count(), 2);
    assert!(
        manager.indexes().all_phrases.contains(&phrase),
        "Indexes are rebuilt even if saving fails"
    );
}

#[test]
fn test_removal_leaves_no_stale_matches() {
    let (mut manager, _, _) = create_manager();
    assert!(!manager.check_abbreviation_unique("adr", None));

    let my_phrases = manager.tree().root("My Phrases").unwrap();
    let addresses = manager.tree().folder(my_phrases).unwrap().folders[0];
    manager.tree_mut().remove_folder(addresses).unwrap();
    manager.rebuild().unwrap();

    assert!(manager.check_abbreviation_unique("adr", None));
}

// ============================================================================
// Uniqueness
// ============================================================================

#[test]
fn test_abbreviation_unique_before_and_after_adding() {
    let (mut manager, _, _) = create_manager();
    assert!(manager.check_abbreviation_unique("xyz", None));

    let root = manager.tree().root("Tray Phrases").unwrap();
    let phrase = manager.tree_mut().add_phrase(root, abbr_phrase("Xyz", "xyz")).unwrap();
    manager.rebuild().unwrap();

    assert!(manager.check_abbreviation_unique("xyz", Some(phrase.into())));
    assert!(!manager.check_abbreviation_unique("xyz", None));

    let other = manager.tree().folder(root).unwrap().phrases[0];
    assert!(!manager.check_abbreviation_unique("xyz", Some(ItemId::Phrase(other))));
}

#[test]
fn test_global_hotkey_precedence() {
    let (mut manager, _, _) = create_manager();
    let hotkey = Hotkey::new(vec![Modifier::Ctrl, Modifier::Shift], "k");

    // Default toggle-service hotkey
    assert!(!manager.check_hotkey_unique(&hotkey, None));

    manager.global_hotkeys_mut().toggle_service.enabled = false;
    assert!(manager.check_hotkey_unique(&hotkey, None));
}

#[test]
fn test_seed_hotkey_owned_by_phrase() {
    let (manager, _, _) = create_manager();
    let hotkey = Hotkey::new(vec![Modifier::Ctrl], "j");
    let owner = manager.indexes().hotkey_phrases[0];

    assert!(!manager.check_hotkey_unique(&hotkey, None));
    assert!(manager.check_hotkey_unique(&hotkey, Some(owner.into())));
}

#[test]
fn test_conflicts_report() {
    let (mut manager, _, _) = create_manager();
    assert!(manager.conflicts().is_empty());

    let root = manager.tree().root("Tray Phrases").unwrap();
    manager.tree_mut().add_phrase(root, abbr_phrase("Copy", "adr")).unwrap();
    manager.rebuild().unwrap();

    let conflicts = manager.conflicts();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].owners.len(), 2);
}

// ============================================================================
// Global hotkey dispatch
// ============================================================================

#[test]
fn test_dispatch_global_hotkey() {
    let (mut manager, _, _) = create_manager();
    let toggled = Rc::new(Cell::new(0));
    let counter = Rc::clone(&toggled);

    let mut registry = ActionRegistry::new();
    registry.register(GlobalAction::ToggleService, move || counter.set(counter.get() + 1));

    let hotkey = Hotkey::new(vec![Modifier::Shift, Modifier::Ctrl], "k");
    assert!(manager.dispatch_global_hotkey(&hotkey, &mut registry));
    assert_eq!(toggled.get(), 1);

    manager.global_hotkeys_mut().toggle_service.enabled = false;
    assert!(!manager.dispatch_global_hotkey(&hotkey, &mut registry));
    assert_eq!(toggled.get(), 1);
}

// ============================================================================
// Legacy import
// ============================================================================

#[test]
fn test_import_legacy_builds_candidate_folder() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_legacy(&temp_dir, "sig = Kind regards\nsig.immediate = True\nfoo.backspace = False\n");
    let (manager, store, _) = create_manager();

    let (folder, phrases) = manager.import_legacy(&path).unwrap();

    assert_eq!(folder.title, DEFAULT_IMPORT_FOLDER);
    assert_eq!(phrases.len(), 1);
    assert!(phrases[0].immediate);
    assert_eq!(manager.tree().phrase_count(), 8, "Tree must not be modified");
    assert_eq!(store.saves.get(), 1);
}

#[test]
fn test_import_legacy_rejects_used_abbreviation() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_legacy(&temp_dir, "aaa = first\nadr = clash\nzzz = last\n");
    let (manager, _, _) = create_manager();

    match manager.import_legacy(&path) {
        Err(ManagerError::Import(ImportError::AbbreviationInUse(abbr))) => assert_eq!(abbr, "adr"),
        other => panic!("Expected AbbreviationInUse, got: {:?}", other.map(|(f, _)| f)),
    }
}

#[test]
fn test_attach_import_adds_root_and_rebuilds() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_legacy(&temp_dir, "sig = Kind regards\ntel = 555 0100\n");
    let (mut manager, store, _) = create_manager();

    let (folder, phrases) = manager.import_legacy(&path).unwrap();
    let folder_id = manager.attach_import(folder, phrases).unwrap();

    assert_eq!(manager.tree().root(DEFAULT_IMPORT_FOLDER), Some(folder_id));
    assert!(!manager.check_abbreviation_unique("sig", None));
    assert_eq!(store.saves.get(), 2);

    // A second import of the same file now clashes.
    assert!(manager.import_legacy(&path).is_err());
}

#[test]
fn test_attach_import_title_collision() {
    let (mut manager, _, _) = create_manager();
    manager
        .tree_mut()
        .add_root_folder(Folder::new(DEFAULT_IMPORT_FOLDER))
        .unwrap();

    let result = manager.attach_import(Folder::new(DEFAULT_IMPORT_FOLDER), Vec::new());
    assert!(matches!(result, Err(ManagerError::Tree(_))));
}
