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

//! src/core/mod.rs
//!
//! Core business logic module
//!
//! This module contains the fundamental data structures and algorithms
//! for phrase management, including:
//! - Type definitions for phrases, folders, hotkeys and global hotkeys
//! - The arena-backed configuration tree and its derived indexes
//! - Abbreviation/hotkey uniqueness checks and HashMap-based conflict reports
//! - The configuration manager tying tree, persistence and hotkeys together
//!
//! Persistence and hotkey registration are behind traits, so everything
//! here can be tested without a filesystem or a display server.

pub mod conflict;
pub mod manager;
pub mod tree;
pub mod types;

pub use conflict::{Conflict, ConflictDetector, Trigger, TriggerOwner};
pub use manager::{ConfigurationManager, ManagerError, DEFAULT_IMPORT_FOLDER};
pub use tree::{compute_indexes, ConfigTree, FolderId, Indexes, ItemId, PhraseId, TreeError};
pub use types::*;

#[cfg(test)]
mod tests;
