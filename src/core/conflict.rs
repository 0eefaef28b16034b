//! Abbreviation and hotkey uniqueness
//!
//! Two kinds of check live here:
//!
//! - `check_abbreviation_unique` / `check_hotkey_unique` answer "may this
//!   entity use this trigger?" for the editor and the legacy importer.
//!   They scan the flattened index lists (folders first, then phrases) and
//!   the first match decides.
//! - `ConflictDetector` groups every trigger in the tree with a HashMap and
//!   reports the ones claimed more than once, for whole-config checks.
//!
//! Neither reports errors: a conflict is an answer, not a failure.

use std::collections::HashMap;
use std::fmt;

use crate::core::tree::{ConfigTree, Indexes, ItemId};
use crate::core::types::{GlobalAction, GlobalHotkeys, Hotkey, PhraseMode};

/// Returns true if `abbreviation` is free for `candidate` to use.
///
/// The first abbreviation-mode folder or phrase using `abbreviation`
/// decides the answer: it is only acceptable if that entity *is* the
/// candidate. Pass `None` for an entity that is not yet in the tree, in
/// which case any match is a conflict.
pub fn check_abbreviation_unique(
    tree: &ConfigTree,
    indexes: &Indexes,
    abbreviation: &str,
    candidate: Option<ItemId>,
) -> bool {
    let folders = indexes.all_folders.iter().filter_map(|id| {
        let folder = tree.folder(*id)?;
        folder
            .matches_abbreviation(abbreviation)
            .then_some(ItemId::Folder(*id))
    });
    let phrases = indexes.all_phrases.iter().filter_map(|id| {
        let phrase = tree.phrase(*id)?;
        phrase
            .matches_abbreviation(abbreviation)
            .then_some(ItemId::Phrase(*id))
    });

    match folders.chain(phrases).next() {
        Some(found) => Some(found) == candidate,
        None => true,
    }
}

/// Returns true if `hotkey` is free for `candidate` to use.
///
/// Enabled global hotkeys are checked first and can never be shadowed: a
/// match there is always a conflict, whoever the candidate is. Otherwise
/// this is the same scan as `check_abbreviation_unique` over hotkey-mode
/// entities.
pub fn check_hotkey_unique(
    tree: &ConfigTree,
    indexes: &Indexes,
    global_hotkeys: &GlobalHotkeys,
    hotkey: &Hotkey,
    candidate: Option<ItemId>,
) -> bool {
    if global_hotkeys.iter().any(|global| global.matches(hotkey)) {
        return false;
    }

    let folders = indexes.all_folders.iter().filter_map(|id| {
        let folder = tree.folder(*id)?;
        folder.matches_hotkey(hotkey).then_some(ItemId::Folder(*id))
    });
    let phrases = indexes.all_phrases.iter().filter_map(|id| {
        let phrase = tree.phrase(*id)?;
        phrase.matches_hotkey(hotkey).then_some(ItemId::Phrase(*id))
    });

    match folders.chain(phrases).next() {
        Some(found) => Some(found) == candidate,
        None => true,
    }
}

/// A trigger that can be claimed by a tree entity or a global action
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Trigger {
    Abbreviation(String),
    Hotkey(Hotkey),
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Abbreviation(abbreviation) => write!(f, "abbreviation '{}'", abbreviation),
            Trigger::Hotkey(hotkey) => write!(f, "hotkey {}", hotkey),
        }
    }
}

/// Something holding a trigger
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TriggerOwner {
    Item(ItemId),
    Global(GlobalAction),
}

/// A trigger claimed by two or more owners
#[derive(Clone, Debug, PartialEq)]
pub struct Conflict {
    pub trigger: Trigger,

    /// All owners using this trigger (always 2 or more), in scan order
    pub owners: Vec<TriggerOwner>,
}

/// Groups triggers by value to find every duplicate in one pass.
#[derive(Debug, Default)]
pub struct ConflictDetector {
    claims: HashMap<Trigger, Vec<TriggerOwner>>,
}

impl ConflictDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a detector holding every active trigger of the tree plus the
    /// enabled global hotkeys.
    pub fn from_tree(tree: &ConfigTree, indexes: &Indexes, global_hotkeys: &GlobalHotkeys) -> Self {
        let mut detector = Self::new();

        for id in &indexes.all_folders {
            let Some(folder) = tree.folder(*id) else {
                continue;
            };
            let owner = TriggerOwner::Item(ItemId::Folder(*id));
            if folder.has_mode(PhraseMode::Abbreviation) {
                if let Some(abbreviation) = &folder.abbreviation {
                    detector.add(Trigger::Abbreviation(abbreviation.clone()), owner);
                }
            }
            if folder.has_mode(PhraseMode::Hotkey) {
                if let Some(hotkey) = &folder.hotkey {
                    detector.add(Trigger::Hotkey(hotkey.clone()), owner);
                }
            }
        }

        for id in &indexes.all_phrases {
            let Some(phrase) = tree.phrase(*id) else {
                continue;
            };
            let owner = TriggerOwner::Item(ItemId::Phrase(*id));
            if phrase.has_mode(PhraseMode::Abbreviation) {
                if let Some(abbreviation) = &phrase.abbreviation {
                    detector.add(Trigger::Abbreviation(abbreviation.clone()), owner);
                }
            }
            if phrase.has_mode(PhraseMode::Hotkey) {
                if let Some(hotkey) = &phrase.hotkey {
                    detector.add(Trigger::Hotkey(hotkey.clone()), owner);
                }
            }
        }

        for global in global_hotkeys.iter().filter(|global| global.enabled) {
            detector.add(Trigger::Hotkey(global.hotkey.clone()), TriggerOwner::Global(global.action));
        }

        detector
    }

    pub fn add(&mut self, trigger: Trigger, owner: TriggerOwner) {
        self.claims.entry(trigger).or_default().push(owner);
    }

    /// Finds all triggers with 2 or more owners, ordered by trigger.
    pub fn find_conflicts(&self) -> Vec<Conflict> {
        let mut conflicts = self
            .claims
            .iter()
            .filter(|(_, owners)| owners.len() > 1)
            .map(|(trigger, owners)| Conflict {
                trigger: trigger.clone(),
                owners: owners.clone(),
            })
            .collect::<Vec<_>>();

        conflicts.sort_by(|a, b| a.trigger.cmp(&b.trigger));
        conflicts
    }

    pub fn has_conflict(&self, trigger: &Trigger) -> bool {
        self.claims
            .get(trigger)
            .map(|owners| owners.len() > 1)
            .unwrap_or(false)
    }

    /// Total number of claims tracked.
    pub fn total_claims(&self) -> usize {
        self.claims.values().map(|v| v.len()).sum()
    }
}
