//! src/core/types.rs
//!
//! Core type definitions for phrase management
//!
//! This module defines the entities stored in the configuration tree:
//! - `Modifier`: Keyboard modifier keys (CTRL, ALT, SHIFT, SUPER, HYPER, META)
//! - `Hotkey`: A combination of modifiers and a key
//! - `PhraseMode`: The ways a phrase or folder can be triggered
//! - `Pattern`: A compiled regex that persists as its source text
//! - `Phrase` / `Folder`: The leaf and container entities of the tree
//! - `GlobalHotkey`: Application hotkeys bound to a fixed `GlobalAction`
//!
//! All types implement serialization so a whole tree can be snapshotted.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::core::tree::{FolderId, PhraseId};

/// Word characters used when a phrase does not configure its own.
pub const DEFAULT_WORD_CHARS: &str = r"[\w]";

/// Number of body characters used for a generated phrase title.
const DESCRIPTION_LENGTH: usize = 20;

/// Keyboard modifier keys
///
/// Parsed from the textual forms used in configuration files
/// (`<ctrl>`, `<shift>`, ...). Angle brackets are optional.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Modifier {
    /// Control key
    Ctrl,
    /// Alt key
    Alt,
    /// Shift key
    Shift,
    /// Super/Windows key
    Super,
    /// Hyper key
    Hyper,
    /// Meta key
    Meta,
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::Ctrl => write!(f, "<ctrl>"),
            Modifier::Alt => write!(f, "<alt>"),
            Modifier::Shift => write!(f, "<shift>"),
            Modifier::Super => write!(f, "<super>"),
            Modifier::Hyper => write!(f, "<hyper>"),
            Modifier::Meta => write!(f, "<meta>"),
        }
    }
}

impl FromStr for Modifier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().trim_start_matches('<').trim_end_matches('>');
        match name.to_lowercase().as_str() {
            "ctrl" | "control" => Ok(Modifier::Ctrl),
            "alt" => Ok(Modifier::Alt),
            "shift" => Ok(Modifier::Shift),
            "super" => Ok(Modifier::Super),
            "hyper" => Ok(Modifier::Hyper),
            "meta" => Ok(Modifier::Meta),
            _ => Err(format!("Unknown modifier '{}'", s)),
        }
    }
}

/// A combination of modifier keys and a base key
///
/// Modifiers are sorted and deduplicated on construction, so
/// `<shift>+<ctrl>` and `<ctrl>+<shift>` compare equal. The key is kept
/// verbatim: `"k"`, `"K"`, `" "` and `"<f7>"` are all distinct keys.
///
/// # Example
/// ```
/// use phrasebook::core::{Hotkey, Modifier};
///
/// let a = Hotkey::new(vec![Modifier::Shift, Modifier::Ctrl], "k");
/// let b = Hotkey::new(vec![Modifier::Ctrl, Modifier::Shift], "k");
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "<ctrl>+<shift>+k");
/// ```
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(from = "HotkeyParts")]
pub struct Hotkey {
    /// Modifier keys, sorted and without duplicates
    modifiers: Vec<Modifier>,

    /// Base key name (e.g., "k", "<f7>", " ")
    pub key: String,
}

/// Hotkey as stored, before modifier normalization
#[derive(Deserialize)]
struct HotkeyParts {
    modifiers: Vec<Modifier>,
    key: String,
}

impl From<HotkeyParts> for Hotkey {
    fn from(parts: HotkeyParts) -> Self {
        Hotkey::new(parts.modifiers, &parts.key)
    }
}

impl Hotkey {
    /// Create a new Hotkey with normalized modifiers
    pub fn new(mut modifiers: Vec<Modifier>, key: &str) -> Self {
        modifiers.sort();
        modifiers.dedup();

        Self {
            modifiers,
            key: key.to_string(),
        }
    }

    /// Modifier keys, sorted and without duplicates.
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    /// Parse modifier names such as `["<ctrl>", "<shift>"]` into a Hotkey.
    pub fn from_names(names: &[&str], key: &str) -> Result<Self, String> {
        let modifiers = names
            .iter()
            .map(|name| name.parse::<Modifier>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(modifiers, key))
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier)?;
        }
        write!(f, "{}", self.key)
    }
}

/// Ways in which a phrase or folder can be activated
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum PhraseMode {
    /// Triggered by typing its abbreviation
    Abbreviation,
    /// Triggered by its hotkey
    Hotkey,
    /// Offered by the predictive popup
    Predictive,
}

impl fmt::Display for PhraseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhraseMode::Abbreviation => write!(f, "abbreviation"),
            PhraseMode::Hotkey => write!(f, "hotkey"),
            PhraseMode::Predictive => write!(f, "predictive"),
        }
    }
}

/// A compiled regular expression that persists as its source text.
///
/// Compilation uses the regex crate, which matches with full Unicode
/// semantics by default (`\w` covers non-ASCII letters). Two patterns are
/// equal when their sources are equal.
#[derive(Clone, Debug)]
pub struct Pattern(Regex);

impl Pattern {
    /// Compiles `source` into a pattern.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Self)
    }

    /// The source text the pattern was compiled from.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.0.is_match(haystack)
    }
}

/// Compiled once; `DEFAULT_WORD_CHARS` is a constant character class, so
/// compilation cannot fail (covered by `test_default_word_chars_compiles`).
static DEFAULT_WORD_CHARS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(DEFAULT_WORD_CHARS).expect("default word chars pattern should be valid regex")
});

impl Default for Pattern {
    fn default() -> Self {
        Self(DEFAULT_WORD_CHARS_PATTERN.clone())
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Pattern {}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::new(&source).map_err(serde::de::Error::custom)
    }
}

/// A single text-expansion entry
///
/// A phrase is owned by exactly one folder in the tree. Its behaviour
/// flags control how the abbreviation is matched and how the expansion
/// is performed.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Phrase {
    /// Display title
    pub title: String,

    /// Body text inserted on expansion
    pub text: String,

    pub abbreviation: Option<String>,

    pub hotkey: Option<Hotkey>,

    /// Activation modes (abbreviation, hotkey, predictive)
    pub modes: Vec<PhraseMode>,

    /// Match the abbreviation regardless of case
    pub ignore_case: bool,

    /// Adapt the expansion's case to the typed abbreviation
    pub match_case: bool,

    /// Expand without waiting for a trigger character
    pub immediate: bool,

    /// Remove the typed abbreviation before expanding
    pub backspace: bool,

    /// Do not re-emit the trigger character after expanding
    pub omit_trigger: bool,

    /// Allow the abbreviation to trigger inside other words
    pub trigger_inside: bool,

    /// Characters that count as part of a word when finding boundaries
    pub word_chars: Pattern,

    pub show_in_tray_menu: bool,

    /// Restricts the phrase to windows whose title matches
    pub window_filter: Option<Pattern>,

    /// Times the phrase has been expanded
    pub usage_count: u32,
}

impl Phrase {
    /// Creates a phrase with no triggers and default matching behaviour.
    pub fn new(title: &str, text: &str) -> Self {
        Self {
            title: title.to_string(),
            text: text.to_string(),
            abbreviation: None,
            hotkey: None,
            modes: Vec::new(),
            ignore_case: false,
            match_case: false,
            immediate: false,
            backspace: true,
            omit_trigger: false,
            trigger_inside: false,
            word_chars: Pattern::default(),
            show_in_tray_menu: false,
            window_filter: None,
            usage_count: 0,
        }
    }

    /// Short title derived from body text: the first 20 characters with
    /// newlines replaced by spaces.
    pub fn description(text: &str) -> String {
        text.chars()
            .take(DESCRIPTION_LENGTH)
            .map(|c| if c == '\n' { ' ' } else { c })
            .collect()
    }

    pub fn set_modes(&mut self, modes: &[PhraseMode]) {
        self.modes = modes.to_vec();
    }

    pub fn has_mode(&self, mode: PhraseMode) -> bool {
        self.modes.contains(&mode)
    }

    /// True when the phrase is abbreviation-triggered by `abbreviation`.
    pub fn matches_abbreviation(&self, abbreviation: &str) -> bool {
        self.has_mode(PhraseMode::Abbreviation)
            && self.abbreviation.as_deref() == Some(abbreviation)
    }

    /// True when the phrase is hotkey-triggered by `hotkey`.
    pub fn matches_hotkey(&self, hotkey: &Hotkey) -> bool {
        self.has_mode(PhraseMode::Hotkey) && self.hotkey.as_ref() == Some(hotkey)
    }
}

impl fmt::Display for Phrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;

        if let Some(abbreviation) = &self.abbreviation {
            write!(f, " [{}]", abbreviation)?;
        }
        if let Some(hotkey) = &self.hotkey {
            write!(f, " ({})", hotkey)?;
        }

        Ok(())
    }
}

/// A named grouping of phrases and subfolders, itself triggerable
///
/// Children are referenced by arena id; the `ConfigTree` owns the
/// entities themselves.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Folder {
    pub title: String,

    pub modes: Vec<PhraseMode>,

    pub abbreviation: Option<String>,

    pub hotkey: Option<Hotkey>,

    pub show_in_tray_menu: bool,

    /// Child folders, in insertion order
    pub(crate) folders: Vec<FolderId>,

    /// Child phrases, in insertion order
    pub(crate) phrases: Vec<PhraseId>,
}

impl Folder {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            modes: Vec::new(),
            abbreviation: None,
            hotkey: None,
            show_in_tray_menu: false,
            folders: Vec::new(),
            phrases: Vec::new(),
        }
    }

    /// Creates a folder listed in the tray menu.
    pub fn in_tray_menu(title: &str) -> Self {
        Self {
            show_in_tray_menu: true,
            ..Self::new(title)
        }
    }

    /// Child folders, in insertion order. Children are added through
    /// `ConfigTree`.
    pub fn folders(&self) -> &[FolderId] {
        &self.folders
    }

    /// Child phrases, in insertion order.
    pub fn phrases(&self) -> &[PhraseId] {
        &self.phrases
    }

    pub fn set_modes(&mut self, modes: &[PhraseMode]) {
        self.modes = modes.to_vec();
    }

    pub fn has_mode(&self, mode: PhraseMode) -> bool {
        self.modes.contains(&mode)
    }

    pub fn matches_abbreviation(&self, abbreviation: &str) -> bool {
        self.has_mode(PhraseMode::Abbreviation)
            && self.abbreviation.as_deref() == Some(abbreviation)
    }

    pub fn matches_hotkey(&self, hotkey: &Hotkey) -> bool {
        self.has_mode(PhraseMode::Hotkey) && self.hotkey.as_ref() == Some(hotkey)
    }
}

/// Application-level actions that can be bound to a global hotkey
///
/// The application resolves these identifiers to behaviour at dispatch
/// time (see `app::ActionRegistry`), so nothing callable is stored in the
/// configuration snapshot.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum GlobalAction {
    /// Open the configuration window
    OpenConfiguration,
    /// Toggle the expansion service on and off
    ToggleService,
    /// Show the phrase popup menu
    ShowPopup,
}

impl fmt::Display for GlobalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlobalAction::OpenConfiguration => write!(f, "open configuration"),
            GlobalAction::ToggleService => write!(f, "toggle service"),
            GlobalAction::ShowPopup => write!(f, "show popup"),
        }
    }
}

/// A hotkey bound to an application action rather than a phrase
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GlobalHotkey {
    pub action: GlobalAction,
    pub hotkey: Hotkey,
    pub enabled: bool,
}

impl GlobalHotkey {
    pub fn new(action: GlobalAction, hotkey: Hotkey) -> Self {
        Self {
            action,
            hotkey,
            enabled: true,
        }
    }

    /// True when enabled and bound to `hotkey`.
    pub fn matches(&self, hotkey: &Hotkey) -> bool {
        self.enabled && self.hotkey == *hotkey
    }

    fn default_config() -> Self {
        Self::new(
            GlobalAction::OpenConfiguration,
            Hotkey::new(vec![Modifier::Ctrl], "k"),
        )
    }

    fn default_toggle_service() -> Self {
        Self::new(
            GlobalAction::ToggleService,
            Hotkey::new(vec![Modifier::Ctrl, Modifier::Shift], "k"),
        )
    }

    fn default_show_popup() -> Self {
        Self::new(
            GlobalAction::ShowPopup,
            Hotkey::new(vec![Modifier::Ctrl, Modifier::Shift], " "),
        )
    }
}

impl fmt::Display for GlobalHotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.hotkey, self.action)?;
        if !self.enabled {
            write!(f, " (disabled)")?;
        }
        Ok(())
    }
}

/// The three fixed global hotkeys
///
/// Snapshots written before the show-popup hotkey existed deserialize
/// with its default binding.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GlobalHotkeys {
    pub config: GlobalHotkey,
    pub toggle_service: GlobalHotkey,
    #[serde(default = "GlobalHotkey::default_show_popup")]
    pub show_popup: GlobalHotkey,
}

impl GlobalHotkeys {
    /// Iterates in a fixed order: config, toggle service, show popup.
    pub fn iter(&self) -> impl Iterator<Item = &GlobalHotkey> {
        [&self.config, &self.toggle_service, &self.show_popup].into_iter()
    }
}

impl Default for GlobalHotkeys {
    fn default() -> Self {
        Self {
            config: GlobalHotkey::default_config(),
            toggle_service: GlobalHotkey::default_toggle_service(),
            show_popup: GlobalHotkey::default_show_popup(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_display() {
        assert_eq!(format!("{}", Modifier::Ctrl), "<ctrl>");
        assert_eq!(format!("{}", Modifier::Super), "<super>");
    }

    #[test]
    fn test_modifier_parse() {
        assert_eq!("<ctrl>".parse::<Modifier>(), Ok(Modifier::Ctrl));
        assert_eq!("SHIFT".parse::<Modifier>(), Ok(Modifier::Shift));
        assert!("<capslock>".parse::<Modifier>().is_err());
    }

    #[test]
    fn test_hotkey_normalization() {
        let a = Hotkey::new(vec![Modifier::Shift, Modifier::Ctrl, Modifier::Shift], "k");
        let b = Hotkey::new(vec![Modifier::Ctrl, Modifier::Shift], "k");

        assert_eq!(a, b);
        assert_eq!(a.modifiers.len(), 2);
    }

    #[test]
    fn test_hotkey_deserialize_normalizes_modifiers() {
        let stored = r#"{"modifiers":["Shift","Ctrl","Shift"],"key":"k"}"#;
        let hotkey: Hotkey = serde_json::from_str(stored).unwrap();

        assert_eq!(hotkey, Hotkey::new(vec![Modifier::Ctrl, Modifier::Shift], "k"));
        assert_eq!(hotkey.modifiers(), &[Modifier::Ctrl, Modifier::Shift]);

        let json = serde_json::to_string(&hotkey).unwrap();
        assert_eq!(json, r#"{"modifiers":["Ctrl","Shift"],"key":"k"}"#);
    }

    #[test]
    fn test_hotkey_key_is_case_sensitive() {
        let lower = Hotkey::new(vec![Modifier::Ctrl], "k");
        let upper = Hotkey::new(vec![Modifier::Ctrl], "K");

        assert_ne!(lower, upper);
    }

    #[test]
    fn test_hotkey_from_names() {
        let hotkey = Hotkey::from_names(&["<ctrl>", "<shift>"], " ").unwrap();
        assert_eq!(hotkey, Hotkey::new(vec![Modifier::Shift, Modifier::Ctrl], " "));

        assert!(Hotkey::from_names(&["<bogus>"], "k").is_err());
    }

    #[test]
    fn test_description_truncates_and_flattens_newlines() {
        assert_eq!(
            Phrase::description("22 Avenue Street\nBrisbane\nQLD"),
            "22 Avenue Street Bri"
        );
        assert_eq!(Phrase::description("short"), "short");
    }

    #[test]
    fn test_description_counts_characters_not_bytes() {
        let text = "äöüäöüäöüäöüäöüäöüäöüäöü";
        assert_eq!(Phrase::description(text).chars().count(), 20);
    }

    #[test]
    fn test_phrase_matches_abbreviation_requires_mode() {
        let mut phrase = Phrase::new("Address", "22 Avenue Street");
        phrase.abbreviation = Some("adr".to_string());

        assert!(!phrase.matches_abbreviation("adr"));

        phrase.set_modes(&[PhraseMode::Abbreviation]);
        assert!(phrase.matches_abbreviation("adr"));
        assert!(!phrase.matches_abbreviation("ad"));
    }

    #[test]
    fn test_folder_matches_hotkey_requires_mode() {
        let mut folder = Folder::new("My Phrases");
        let hotkey = Hotkey::new(vec![Modifier::Ctrl], "<f7>");
        folder.hotkey = Some(hotkey.clone());

        assert!(!folder.matches_hotkey(&hotkey));

        folder.set_modes(&[PhraseMode::Hotkey]);
        assert!(folder.matches_hotkey(&hotkey));
    }

    #[test]
    fn test_pattern_serializes_as_source() {
        let pattern = Pattern::new(r"[\w\-]").unwrap();
        let json = serde_json::to_string(&pattern).unwrap();
        assert_eq!(json, r#""[\\w\\-]""#);

        let back: Pattern = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pattern);
    }

    #[test]
    fn test_pattern_rejects_invalid_source_on_deserialize() {
        let result: Result<Pattern, _> = serde_json::from_str(r#""[unclosed""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_word_chars_compiles() {
        assert!(Regex::new(DEFAULT_WORD_CHARS).is_ok());
        assert_eq!(Pattern::default().as_str(), DEFAULT_WORD_CHARS);
    }

    #[test]
    fn test_pattern_is_unicode_aware() {
        let pattern = Pattern::default();
        assert!(pattern.is_match("é"));
        assert!(!pattern.is_match(" "));
    }

    #[test]
    fn test_disabled_global_hotkey_never_matches() {
        let mut global = GlobalHotkeys::default();
        let hotkey = Hotkey::new(vec![Modifier::Ctrl], "k");

        assert!(global.config.matches(&hotkey));
        global.config.enabled = false;
        assert!(!global.config.matches(&hotkey));
    }

    #[test]
    fn test_global_hotkeys_upgrade_adds_show_popup() {
        let old = r#"{
            "config": {"action": "OpenConfiguration", "hotkey": {"modifiers": ["Ctrl"], "key": "k"}, "enabled": true},
            "toggle_service": {"action": "ToggleService", "hotkey": {"modifiers": ["Ctrl", "Shift"], "key": "k"}, "enabled": true}
        }"#;

        let hotkeys: GlobalHotkeys = serde_json::from_str(old).unwrap();
        assert_eq!(hotkeys.show_popup, GlobalHotkey::default_show_popup());
        assert_eq!(hotkeys.iter().count(), 3);
    }
}
