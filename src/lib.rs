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

//! Phrasebook
//!
//! Configuration core for a text-expansion tool: a tree of folders and
//! phrases triggered by abbreviations and hotkeys, kept consistent with its
//! derived indexes and free of trigger collisions.
//!
//! # Features
//!
//! - **Phrase tree:** Folders and phrases with stable ids and title-unique roots
//! - **Derived indexes:** Hotkey, abbreviation and flat lists, rebuilt after every change
//! - **Uniqueness checks:** Abbreviations and hotkeys, including global hotkeys
//! - **Legacy import:** Converts the old flat abbreviations file into phrases
//! - **Atomic persistence:** JSON snapshots with backup and restore on failure
//!
//! # Architecture
//!
//! - **`core`:** Business logic (types, tree, indexes, conflicts, manager)
//! - **`legacy`:** Legacy abbreviations parser and importer
//! - **`config`:** Snapshot persistence and settings
//! - **`app`:** Seams to the application (hotkey registration, global actions)
//!
//! # Examples
//!
//! ## Checking an abbreviation
//!
//! ```
//! use phrasebook::core::{compute_indexes, ConfigTree};
//! use phrasebook::core::conflict::check_abbreviation_unique;
//!
//! let tree = ConfigTree::seed()?;
//! let indexes = compute_indexes(&tree);
//!
//! assert!(!check_abbreviation_unique(&tree, &indexes, "adr", None));
//! assert!(check_abbreviation_unique(&tree, &indexes, "brb", None));
//! # Ok::<(), phrasebook::core::TreeError>(())
//! ```
//!
//! ## Importing a legacy file
//!
//! ```no_run
//! use phrasebook::app::NullRegistrar;
//! use phrasebook::config::FileStore;
//! use phrasebook::core::ConfigurationManager;
//! use std::path::Path;
//!
//! let store = FileStore::at_default_location();
//! let mut manager = ConfigurationManager::load_or_create(Box::new(store), Box::new(NullRegistrar))?;
//!
//! let (folder, phrases) = manager.import_legacy(Path::new("/tmp/abbr.ini"))?;
//! manager.attach_import(folder, phrases)?;
//! # Ok::<(), phrasebook::core::ManagerError>(())
//! ```

pub mod app;
pub mod config;
pub mod core;
pub mod legacy;

// Re-export commonly used types for convenience
pub use core::{ConfigTree, ConfigurationManager, Folder, Hotkey, Modifier, Phrase, PhraseMode};
