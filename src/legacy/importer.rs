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

//! Conversion of legacy abbreviation definitions into phrases
//!
//! The `[abbr]` section mixes two kinds of key with no grouping syntax:
//!
//! ```text
//! adr = 22 Avenue Street        # a definition
//! adr.immediate = True          # an option override for `adr`
//! ```
//!
//! Grouping relies on lexicographic order: after sorting, every
//! `name.option` key sits directly behind `name` (or behind other options
//! of `name`). This breaks if one abbreviation is a prefix of another in a
//! way that interleaves their dotted keys; legacy files already assume it
//! does not happen, so it is not re-validated here.
//!
//! Option keys with no preceding definition are dropped ("orphans").

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::core::types::{Pattern, Phrase, PhraseMode};
use crate::legacy::parser::{parse_legacy, LegacyDocument, Section};
use crate::legacy::ImportError;

/// Section holding abbreviation definitions and overrides
pub const ABBR_SECTION: &str = "abbr";

/// Section holding the option defaults
pub const DEFAULTS_SECTION: &str = "defaults";

/// Options an abbreviation can override, by legacy name
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LegacyOption {
    WordChars,
    Immediate,
    IgnoreCase,
    MatchCase,
    Backspace,
    OmitTrigger,
    TriggerInside,
}

impl LegacyOption {
    pub const ALL: [LegacyOption; 7] = [
        LegacyOption::WordChars,
        LegacyOption::Immediate,
        LegacyOption::IgnoreCase,
        LegacyOption::MatchCase,
        LegacyOption::Backspace,
        LegacyOption::OmitTrigger,
        LegacyOption::TriggerInside,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LegacyOption::WordChars => "wordchars",
            LegacyOption::Immediate => "immediate",
            LegacyOption::IgnoreCase => "ignorecase",
            LegacyOption::MatchCase => "matchcase",
            LegacyOption::Backspace => "backspace",
            LegacyOption::OmitTrigger => "omittrigger",
            LegacyOption::TriggerInside => "triggerinside",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|option| option.name() == name)
    }
}

/// Legacy boolean: true when the lowercased value starts with `t`.
pub fn parse_bool(value: &str) -> bool {
    value.to_lowercase().starts_with('t')
}

/// Option values resolved from a set of raw strings
///
/// Any option may be absent. Unrecognised names are ignored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OptionSet {
    pub word_chars: Option<Pattern>,
    flags: HashMap<LegacyOption, bool>,
}

impl OptionSet {
    /// Coerces raw option values: booleans from text, word chars compiled
    /// to a pattern. `owner` names the abbreviation (or defaults) in errors.
    pub fn from_raw<'a>(
        owner: &str,
        raw: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, ImportError> {
        let mut options = Self::default();

        for (name, value) in raw {
            match LegacyOption::from_name(name) {
                Some(LegacyOption::WordChars) => {
                    let pattern = Pattern::new(value).map_err(|source| ImportError::InvalidPattern {
                        owner: owner.to_string(),
                        source,
                    })?;
                    options.word_chars = Some(pattern);
                }
                Some(option) => {
                    options.flags.insert(option, parse_bool(value));
                }
                None => debug!(owner, option = name, "Ignoring unknown legacy option"),
            }
        }

        Ok(options)
    }

    pub fn flag(&self, option: LegacyOption) -> Option<bool> {
        self.flags.get(&option).copied()
    }
}

/// Defaults for every option; all seven must be present.
#[derive(Clone, Debug, PartialEq)]
pub struct LegacyDefaults {
    word_chars: Pattern,
    flags: HashMap<LegacyOption, bool>,
}

impl LegacyDefaults {
    pub fn from_section(section: &Section) -> Result<Self, ImportError> {
        let options = OptionSet::from_raw(DEFAULTS_SECTION, section.iter())?;

        let word_chars = options
            .word_chars
            .clone()
            .ok_or_else(|| ImportError::MissingDefault(LegacyOption::WordChars.name().to_string()))?;

        let mut flags = HashMap::new();
        for option in LegacyOption::ALL.into_iter().filter(|o| *o != LegacyOption::WordChars) {
            let value = options
                .flag(option)
                .ok_or_else(|| ImportError::MissingDefault(option.name().to_string()))?;
            flags.insert(option, value);
        }

        Ok(Self { word_chars, flags })
    }

    fn flag(&self, option: LegacyOption) -> bool {
        self.flags.get(&option).copied().unwrap_or_default()
    }
}

/// One abbreviation definition with the keys of its own options
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyGroup {
    pub definition: String,

    /// Full keys (`definition.option`) in sorted order
    pub option_keys: Vec<String>,
}

impl KeyGroup {
    /// Option names with the `definition.` prefix stripped.
    pub fn option_names(&self) -> impl Iterator<Item = (&str, &str)> {
        let offset = self.definition.len() + 1;
        self.option_keys
            .iter()
            .map(move |key| (&key[offset..], key.as_str()))
    }
}

/// A dotted key ending in a recognised option name.
fn is_option_key(key: &str) -> bool {
    key.contains('.')
        && LegacyOption::ALL
            .iter()
            .any(|option| key.ends_with(option.name()))
}

/// Groups `abbr` keys into definitions and their option overrides.
///
/// Keys are sorted, then consumed from the front:
/// 1. Leading option keys with no owner are dropped.
/// 2. The next key is a definition.
/// 3. Following keys starting with `definition.` are its options.
///
/// A dotted key that is not a recognised option is treated as a
/// definition.
pub fn group_keys(mut keys: Vec<String>) -> Vec<KeyGroup> {
    keys.sort();
    let mut queue = VecDeque::from(keys);
    let mut groups = Vec::new();

    loop {
        while queue.front().is_some_and(|key| is_option_key(key)) {
            if let Some(orphan) = queue.pop_front() {
                debug!(key = %orphan, "Dropping option with no abbreviation definition");
            }
        }

        let Some(definition) = queue.pop_front() else {
            break;
        };

        let prefix = format!("{}.", definition);
        let mut option_keys = Vec::new();
        while queue.front().is_some_and(|key| key.starts_with(&prefix)) {
            option_keys.extend(queue.pop_front());
        }

        groups.push(KeyGroup {
            definition,
            option_keys,
        });
    }

    groups
}

/// Reads legacy abbreviation files into phrases
#[derive(Debug, Default)]
pub struct LegacyImporter;

impl LegacyImporter {
    pub fn new() -> Self {
        Self
    }

    /// Loads and converts the legacy file at `path`.
    ///
    /// # Errors
    ///
    /// Fails without returning any phrases if the file cannot be read or
    /// parsed, a required section or default is missing, or a word chars
    /// pattern does not compile.
    pub fn load(&self, path: &Path) -> Result<Vec<Phrase>, ImportError> {
        info!(path = %path.display(), "Importing legacy abbreviations");

        let content = fs::read_to_string(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let phrases = self.import_str(&content)?;
        info!(count = phrases.len(), "Legacy import produced phrases");
        Ok(phrases)
    }

    /// Converts legacy file content into phrases.
    pub fn import_str(&self, content: &str) -> Result<Vec<Phrase>, ImportError> {
        let document = parse_legacy(content)?;
        self.import_document(&document)
    }

    pub fn import_document(&self, document: &LegacyDocument) -> Result<Vec<Phrase>, ImportError> {
        let abbreviations = document
            .section(ABBR_SECTION)
            .ok_or_else(|| ImportError::MissingSection(ABBR_SECTION.to_string()))?;
        let defaults = document
            .section(DEFAULTS_SECTION)
            .ok_or_else(|| ImportError::MissingSection(DEFAULTS_SECTION.to_string()))?;

        let defaults = LegacyDefaults::from_section(defaults)?;
        let keys = abbreviations.keys().map(str::to_string).collect();

        group_keys(keys)
            .iter()
            .map(|group| build_phrase(group, abbreviations, &defaults))
            .collect()
    }
}

/// Creates the phrase for one definition, taking each option from the
/// definition's own overrides, falling back to the defaults.
fn build_phrase(group: &KeyGroup, abbreviations: &Section, defaults: &LegacyDefaults) -> Result<Phrase, ImportError> {
    let text = abbreviations.get(&group.definition).unwrap_or_default();

    let own = OptionSet::from_raw(
        &group.definition,
        group
            .option_names()
            .filter_map(|(name, key)| Some((name, abbreviations.get(key)?))),
    )?;

    let resolve = |option: LegacyOption| own.flag(option).unwrap_or_else(|| defaults.flag(option));

    let mut phrase = Phrase::new(&Phrase::description(text), text);
    phrase.abbreviation = Some(group.definition.clone());
    phrase.set_modes(&[PhraseMode::Abbreviation]);
    phrase.word_chars = own.word_chars.clone().unwrap_or_else(|| defaults.word_chars.clone());
    phrase.immediate = resolve(LegacyOption::Immediate);
    phrase.ignore_case = resolve(LegacyOption::IgnoreCase);
    phrase.match_case = resolve(LegacyOption::MatchCase);
    phrase.backspace = resolve(LegacyOption::Backspace);
    phrase.omit_trigger = resolve(LegacyOption::OmitTrigger);
    phrase.trigger_inside = resolve(LegacyOption::TriggerInside);

    debug!(abbreviation = %group.definition, overrides = group.option_keys.len(), "Built phrase from legacy definition");
    Ok(phrase)
}
