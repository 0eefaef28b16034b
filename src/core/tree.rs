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

//! src/core/tree.rs
//!
//! Arena-backed configuration tree
//!
//! Folders and phrases live in two slot vectors owned by `ConfigTree`.
//! Parent-child links are stored as ids, so an entity is identified by a
//! copyable `FolderId` / `PhraseId` rather than by reference. Removed
//! entities leave an empty slot behind; slots are never reused, so an id
//! stays valid (or dangling-but-detectable) for the life of the tree.
//!
//! Root folders are keyed by title, which makes root titles unique.
//!
//! Derived indexes are never maintained incrementally. `compute_indexes`
//! walks the whole tree and is called after every structural change.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::core::types::{Folder, Hotkey, Modifier, Pattern, Phrase, PhraseMode};

/// Stable identifier of a folder in a `ConfigTree`
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct FolderId(usize);

/// Stable identifier of a phrase in a `ConfigTree`
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PhraseId(usize);

/// Either kind of tree entity
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ItemId {
    Folder(FolderId),
    Phrase(PhraseId),
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "folder#{}", self.0)
    }
}

impl fmt::Display for PhraseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "phrase#{}", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Folder(id) => write!(f, "{}", id),
            ItemId::Phrase(id) => write!(f, "{}", id),
        }
    }
}

/// Errors from structural tree mutations
#[derive(Debug, Error, PartialEq)]
pub enum TreeError {
    /// A root folder with this title already exists
    #[error("A root folder named '{0}' already exists")]
    DuplicateRootTitle(String),

    #[error("Unknown folder: {0}")]
    UnknownFolder(FolderId),

    #[error("Unknown phrase: {0}")]
    UnknownPhrase(PhraseId),

    /// Folders enter the tree empty; children are added through the tree
    #[error("Folder '{0}' already has children")]
    FolderNotEmpty(String),

    #[error("{0} has more than one parent")]
    MultipleParents(ItemId),

    #[error("{0} is its own ancestor")]
    Cycle(FolderId),
}

/// The phrase/folder tree
///
/// Every folder and phrase has at most one parent and no folder is its own
/// ancestor. Mutations preserve this; a deserialized tree is checked before
/// it is accepted.
///
/// # Example
/// ```
/// use phrasebook::core::{ConfigTree, Folder, Phrase};
///
/// let mut tree = ConfigTree::new();
/// let root = tree.add_root_folder(Folder::new("Work"))?;
/// let phrase = tree.add_phrase(root, Phrase::new("Sig", "Regards"))?;
/// assert_eq!(tree.parent_of(phrase), Some(root));
/// # Ok::<(), phrasebook::core::TreeError>(())
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(try_from = "TreeParts")]
pub struct ConfigTree {
    folders: Vec<Option<Folder>>,
    phrases: Vec<Option<Phrase>>,
    roots: BTreeMap<String, FolderId>,
}

/// A tree as stored, before its structure is checked
#[derive(Deserialize)]
struct TreeParts {
    folders: Vec<Option<Folder>>,
    phrases: Vec<Option<Phrase>>,
    roots: BTreeMap<String, FolderId>,
}

impl TryFrom<TreeParts> for ConfigTree {
    type Error = TreeError;

    fn try_from(parts: TreeParts) -> Result<Self, Self::Error> {
        let tree = Self {
            folders: parts.folders,
            phrases: parts.phrases,
            roots: parts.roots,
        };
        tree.validate()?;
        Ok(tree)
    }
}

impl ConfigTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a top-level folder.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::DuplicateRootTitle` if a root folder with the
    /// same title exists, or `TreeError::FolderNotEmpty` if `folder`
    /// already lists children.
    pub fn add_root_folder(&mut self, folder: Folder) -> Result<FolderId, TreeError> {
        ensure_empty(&folder)?;
        if self.roots.contains_key(&folder.title) {
            return Err(TreeError::DuplicateRootTitle(folder.title));
        }

        let title = folder.title.clone();
        let id = self.insert_folder(folder);
        self.roots.insert(title, id);
        Ok(id)
    }

    /// Adds `folder` as the last child folder of `parent`.
    pub fn add_subfolder(&mut self, parent: FolderId, folder: Folder) -> Result<FolderId, TreeError> {
        if self.folder(parent).is_none() {
            return Err(TreeError::UnknownFolder(parent));
        }
        ensure_empty(&folder)?;

        let id = self.insert_folder(folder);
        self.folder_mut(parent)
            .ok_or(TreeError::UnknownFolder(parent))?
            .folders
            .push(id);
        Ok(id)
    }

    /// Adds `phrase` as the last phrase of `parent`.
    pub fn add_phrase(&mut self, parent: FolderId, phrase: Phrase) -> Result<PhraseId, TreeError> {
        let folder = self
            .folders
            .get_mut(parent.0)
            .and_then(Option::as_mut)
            .ok_or(TreeError::UnknownFolder(parent))?;

        let id = PhraseId(self.phrases.len());
        folder.phrases.push(id);
        self.phrases.push(Some(phrase));
        Ok(id)
    }

    /// Removes a folder together with every folder and phrase below it.
    pub fn remove_folder(&mut self, id: FolderId) -> Result<Folder, TreeError> {
        let folder = self
            .folders
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(TreeError::UnknownFolder(id))?;

        self.roots.retain(|_, root| *root != id);
        for parent in self.folders.iter_mut().flatten() {
            parent.folders.retain(|child| *child != id);
        }

        for phrase in &folder.phrases {
            if let Some(slot) = self.phrases.get_mut(phrase.0) {
                *slot = None;
            }
        }
        for child in &folder.folders {
            self.remove_folder(*child)?;
        }

        Ok(folder)
    }

    pub fn remove_phrase(&mut self, id: PhraseId) -> Result<Phrase, TreeError> {
        let phrase = self
            .phrases
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(TreeError::UnknownPhrase(id))?;

        for parent in self.folders.iter_mut().flatten() {
            parent.phrases.retain(|child| *child != id);
        }

        Ok(phrase)
    }

    /// Renames a root folder and re-keys it in the root map.
    pub fn rename_root_folder(&mut self, id: FolderId, title: &str) -> Result<(), TreeError> {
        if !self.roots.values().any(|root| *root == id) {
            return Err(TreeError::UnknownFolder(id));
        }
        if self.roots.get(title).is_some_and(|other| *other != id) {
            return Err(TreeError::DuplicateRootTitle(title.to_string()));
        }

        self.roots.retain(|_, root| *root != id);
        self.roots.insert(title.to_string(), id);
        if let Some(folder) = self.folder_mut(id) {
            folder.title = title.to_string();
        }
        Ok(())
    }

    pub fn folder(&self, id: FolderId) -> Option<&Folder> {
        self.folders.get(id.0).and_then(Option::as_ref)
    }

    /// Mutable access to a folder. Do not change a root folder's title
    /// here; use `rename_root_folder` so the root map stays keyed correctly.
    pub fn folder_mut(&mut self, id: FolderId) -> Option<&mut Folder> {
        self.folders.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn phrase(&self, id: PhraseId) -> Option<&Phrase> {
        self.phrases.get(id.0).and_then(Option::as_ref)
    }

    pub fn phrase_mut(&mut self, id: PhraseId) -> Option<&mut Phrase> {
        self.phrases.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Root folders in title order.
    pub fn root_folders(&self) -> impl Iterator<Item = (FolderId, &Folder)> {
        self.roots
            .values()
            .filter_map(|id| self.folder(*id).map(|folder| (*id, folder)))
    }

    pub fn root(&self, title: &str) -> Option<FolderId> {
        self.roots.get(title).copied()
    }

    /// The folder directly containing `item`, or `None` for root folders
    /// and unknown items.
    pub fn parent_of(&self, item: impl Into<ItemId>) -> Option<FolderId> {
        let item = item.into();
        self.folders.iter().enumerate().find_map(|(index, slot)| {
            let folder = slot.as_ref()?;
            let contains = match item {
                ItemId::Folder(id) => folder.folders.contains(&id),
                ItemId::Phrase(id) => folder.phrases.contains(&id),
            };
            contains.then_some(FolderId(index))
        })
    }

    /// Number of live phrases.
    pub fn phrase_count(&self) -> usize {
        self.phrases.iter().flatten().count()
    }

    /// Number of live folders.
    pub fn folder_count(&self) -> usize {
        self.folders.iter().flatten().count()
    }

    fn insert_folder(&mut self, folder: Folder) -> FolderId {
        let id = FolderId(self.folders.len());
        self.folders.push(Some(folder));
        id
    }

    /// Sample configuration created on first run.
    pub fn seed() -> Result<Self, TreeError> {
        let mut tree = Self::new();
        tree.populate_seed()?;
        Ok(tree)
    }

    /// Checks the parent relation: links point at live entities, nothing
    /// has two parents (a root's parent is the root map) and no folder is
    /// its own ancestor.
    fn validate(&self) -> Result<(), TreeError> {
        let mut is_root = vec![false; self.folders.len()];
        let mut folder_parent: Vec<Option<FolderId>> = vec![None; self.folders.len()];
        let mut phrase_owned = vec![false; self.phrases.len()];

        for id in self.roots.values() {
            if self.folder(*id).is_none() {
                return Err(TreeError::UnknownFolder(*id));
            }
            if std::mem::replace(&mut is_root[id.0], true) {
                return Err(TreeError::MultipleParents(ItemId::Folder(*id)));
            }
        }

        for (index, slot) in self.folders.iter().enumerate() {
            let Some(folder) = slot else {
                continue;
            };
            let parent = FolderId(index);

            for child in &folder.folders {
                if self.folder(*child).is_none() {
                    return Err(TreeError::UnknownFolder(*child));
                }
                if is_root[child.0] || folder_parent[child.0].replace(parent).is_some() {
                    return Err(TreeError::MultipleParents(ItemId::Folder(*child)));
                }
            }

            for phrase in &folder.phrases {
                if self.phrase(*phrase).is_none() {
                    return Err(TreeError::UnknownPhrase(*phrase));
                }
                if std::mem::replace(&mut phrase_owned[phrase.0], true) {
                    return Err(TreeError::MultipleParents(ItemId::Phrase(*phrase)));
                }
            }
        }

        // Single parents make every ancestor chain a path; one longer than
        // the arena must loop.
        for start in 0..self.folders.len() {
            let mut current = folder_parent[start];
            let mut steps = 0;
            while let Some(parent) = current {
                if parent.0 == start || steps > self.folders.len() {
                    return Err(TreeError::Cycle(FolderId(start)));
                }
                current = folder_parent[parent.0];
                steps += 1;
            }
        }

        Ok(())
    }

    fn populate_seed(&mut self) -> Result<(), TreeError> {
        let mut my_phrases = Folder::new("My Phrases");
        my_phrases.hotkey = Some(Hotkey::new(vec![Modifier::Ctrl], "<f7>"));
        my_phrases.set_modes(&[PhraseMode::Hotkey]);
        let my_phrases = self.add_root_folder(my_phrases)?;

        let addresses = self.add_subfolder(my_phrases, Folder::new("Addresses"))?;
        let mut adr = Phrase::new("Home Address", "22 Avenue Street\nBrisbane\nQLD\n4000");
        adr.set_modes(&[PhraseMode::Abbreviation]);
        adr.abbreviation = Some("adr".to_string());
        self.add_phrase(addresses, adr)?;

        let mut first = Phrase::new("First phrase", "Test phrase number one!");
        first.set_modes(&[PhraseMode::Predictive]);
        first.window_filter = Pattern::new(".* - gedit").ok();
        self.add_phrase(my_phrases, first)?;

        let mut positioning = Phrase::new("Positioning Phrase", "[udc]$(cursor )[/udc]\nBlah");
        positioning.set_modes(&[PhraseMode::Abbreviation, PhraseMode::Hotkey]);
        positioning.hotkey = Some(Hotkey::new(vec![Modifier::Ctrl], "j"));
        positioning.abbreviation = Some("udc".to_string());
        positioning.show_in_tray_menu = true;
        positioning.immediate = true;
        self.add_phrase(my_phrases, positioning)?;

        self.add_phrase(my_phrases, Phrase::new("Second phrase", "Test phrase number two!"))?;
        self.add_phrase(my_phrases, Phrase::new("Third phrase", "Test phrase number three!"))?;

        let tray = self.add_root_folder(Folder::in_tray_menu("Tray Phrases"))?;
        self.add_phrase(tray, Phrase::new("First phrase", "Test phrase number one!"))?;
        self.add_phrase(tray, Phrase::new("Second phrase", "Test phrase number two!"))?;
        self.add_phrase(tray, Phrase::new("Third phrase", "Test phrase number three!"))?;

        Ok(())
    }
}

fn ensure_empty(folder: &Folder) -> Result<(), TreeError> {
    if folder.folders.is_empty() && folder.phrases.is_empty() {
        Ok(())
    } else {
        Err(TreeError::FolderNotEmpty(folder.title.clone()))
    }
}

impl From<FolderId> for ItemId {
    fn from(id: FolderId) -> Self {
        ItemId::Folder(id)
    }
}

impl From<PhraseId> for ItemId {
    fn from(id: PhraseId) -> Self {
        ItemId::Phrase(id)
    }
}

/// Lists derived from a full traversal of a `ConfigTree`
///
/// Consumers: hotkey dispatch (`hotkey_folders`, `hotkey_phrases`),
/// abbreviation matching (`abbreviation_phrases`) and uniqueness scans
/// (`all_folders`, `all_phrases`).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Indexes {
    pub hotkey_folders: Vec<FolderId>,
    pub hotkey_phrases: Vec<PhraseId>,
    pub abbreviation_phrases: Vec<PhraseId>,
    pub all_folders: Vec<FolderId>,
    pub all_phrases: Vec<PhraseId>,
}

/// Computes every derived index from scratch.
///
/// Root folders are visited in title order. Within a folder, child folders
/// are visited (and recursed into) before the folder's own phrases.
pub fn compute_indexes(tree: &ConfigTree) -> Indexes {
    let mut indexes = Indexes::default();

    for (id, folder) in tree.root_folders() {
        visit_folder(tree, id, folder, &mut indexes);
    }

    indexes
}

fn visit_folder(tree: &ConfigTree, id: FolderId, folder: &Folder, indexes: &mut Indexes) {
    if folder.has_mode(PhraseMode::Hotkey) {
        indexes.hotkey_folders.push(id);
    }
    indexes.all_folders.push(id);

    for child_id in &folder.folders {
        if let Some(child) = tree.folder(*child_id) {
            visit_folder(tree, *child_id, child, indexes);
        }
    }

    for phrase_id in &folder.phrases {
        let Some(phrase) = tree.phrase(*phrase_id) else {
            continue;
        };
        if phrase.has_mode(PhraseMode::Hotkey) {
            indexes.hotkey_phrases.push(*phrase_id);
        }
        if phrase.has_mode(PhraseMode::Abbreviation) {
            indexes.abbreviation_phrases.push(*phrase_id);
        }
        indexes.all_phrases.push(*phrase_id);
    }
}
