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

use std::fs;
use tempfile::TempDir;

use crate::core::types::PhraseMode;
use crate::legacy::importer::{group_keys, parse_bool, LegacyImporter};
use crate::legacy::ImportError;

const DEFAULTS: &str = r"[defaults]
wordchars = [\w]
immediate = false
ignorecase = False
matchcase = FALSE
backspace = true
omittrigger = f
triggerinside = no
";

/// Helper: builds a legacy file from the standard defaults and `abbr` lines.
fn legacy_file(abbr_lines: &str) -> String {
    format!("[config]\nversion = 0.40\n\n{}\n[abbr]\n{}", DEFAULTS, abbr_lines)
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|k| k.to_string()).collect()
}

// ============================================================================
// Boolean coercion
// ============================================================================

#[test]
fn test_parse_bool_uses_first_character() {
    assert!(parse_bool("True"));
    assert!(parse_bool("t"));
    assert!(parse_bool("TRUE"));
    assert!(parse_bool("totally"));
    assert!(!parse_bool("False"));
    assert!(!parse_bool("yes"));
    assert!(!parse_bool(""));
}

// ============================================================================
// Key grouping
// ============================================================================

#[test]
fn test_group_keys_collects_own_options() {
    let groups = group_keys(keys(&["adr.immediate", "sig", "adr", "adr.backspace"]));

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].definition, "adr");
    assert_eq!(groups[0].option_keys, keys(&["adr.backspace", "adr.immediate"]));
    assert_eq!(groups[1].definition, "sig");
    assert!(groups[1].option_keys.is_empty());
}

#[test]
fn test_group_keys_strips_definition_prefix() {
    let groups = group_keys(keys(&["adr", "adr.wordchars"]));
    let names: Vec<&str> = groups[0].option_names().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["wordchars"]);
}

#[test]
fn test_group_keys_flushes_orphan_options() {
    // Sorted: bar, foo.immediate. `foo` is never defined.
    let groups = group_keys(keys(&["foo.immediate", "bar"]));

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].definition, "bar");
    assert!(groups[0].option_keys.is_empty());
}

#[test]
fn test_group_keys_flushes_leading_orphans() {
    // Sorted: a.backspace, a.immediate, b
    let groups = group_keys(keys(&["b", "a.immediate", "a.backspace"]));

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].definition, "b");
}

#[test]
fn test_group_keys_dotted_non_option_is_definition() {
    let groups = group_keys(keys(&["e.g", "zz"]));

    let definitions: Vec<&str> = groups.iter().map(|g| g.definition.as_str()).collect();
    assert_eq!(definitions, vec!["e.g", "zz"]);
}

#[test]
fn test_group_keys_only_orphans() {
    assert!(group_keys(keys(&["x.immediate", "y.matchcase"])).is_empty());
    assert!(group_keys(Vec::new()).is_empty());
}

#[test]
fn test_group_keys_shared_prefix() {
    // '.' sorts before letters, so `a.immediate` lands between `a` and `ab`.
    let groups = group_keys(keys(&["ab", "a", "a.immediate"]));

    assert_eq!(groups[0].definition, "a");
    assert_eq!(groups[0].option_keys, keys(&["a.immediate"]));
    assert_eq!(groups[1].definition, "ab");
}

// ============================================================================
// Phrase construction
// ============================================================================

#[test]
fn test_own_override_wins_and_defaults_fill_in() {
    let content = legacy_file("adr = 22 Avenue Street\nadr.immediate = true\n");
    let phrases = LegacyImporter::new().import_str(&content).unwrap();

    assert_eq!(phrases.len(), 1);
    let phrase = &phrases[0];
    assert_eq!(phrase.abbreviation.as_deref(), Some("adr"));
    assert_eq!(phrase.text, "22 Avenue Street");
    assert!(phrase.immediate, "Own override should win");
    assert!(phrase.backspace, "Default should be inherited");
    assert!(!phrase.ignore_case);
    assert!(!phrase.trigger_inside);
    assert_eq!(phrase.word_chars.as_str(), r"[\w]");
    assert_eq!(phrase.modes, vec![PhraseMode::Abbreviation]);
}

#[test]
fn test_orphan_option_does_not_create_phrase() {
    let content = legacy_file("foo.immediate = true\nbar = text\n");
    let phrases = LegacyImporter::new().import_str(&content).unwrap();

    assert_eq!(phrases.len(), 1);
    assert_eq!(phrases[0].abbreviation.as_deref(), Some("bar"));
    assert!(!phrases[0].immediate, "Orphan option must not leak onto bar");
}

#[test]
fn test_title_is_first_twenty_characters() {
    let content = legacy_file("adr = '''22 Avenue Street\nBrisbane\nQLD'''\n");
    let phrases = LegacyImporter::new().import_str(&content).unwrap();

    assert_eq!(phrases[0].title, "22 Avenue Street Bri");
    assert_eq!(phrases[0].text, "22 Avenue Street\nBrisbane\nQLD");
}

#[test]
fn test_phrases_in_sorted_order() {
    let content = legacy_file("zz = last\nmm = middle\naa = first\n");
    let phrases = LegacyImporter::new().import_str(&content).unwrap();

    let abbreviations: Vec<&str> = phrases
        .iter()
        .filter_map(|p| p.abbreviation.as_deref())
        .collect();
    assert_eq!(abbreviations, vec!["aa", "mm", "zz"]);
}

#[test]
fn test_own_word_chars_override() {
    let content = legacy_file("adr = x\nadr.wordchars = [\\w\\-]\n");
    let phrases = LegacyImporter::new().import_str(&content).unwrap();

    assert_eq!(phrases[0].word_chars.as_str(), r"[\w\-]");
}

#[test]
fn test_invalid_word_chars_fails_import() {
    let content = legacy_file("adr = x\nadr.wordchars = [unclosed\n");
    let result = LegacyImporter::new().import_str(&content);

    match result {
        Err(ImportError::InvalidPattern { owner, .. }) => assert_eq!(owner, "adr"),
        other => panic!("Expected InvalidPattern, got: {:?}", other),
    }
}

#[test]
fn test_missing_abbr_section() {
    let result = LegacyImporter::new().import_str(DEFAULTS);
    assert!(matches!(result, Err(ImportError::MissingSection(name)) if name == "abbr"));
}

#[test]
fn test_missing_defaults_section() {
    let result = LegacyImporter::new().import_str("[abbr]\nadr = x\n");
    assert!(matches!(result, Err(ImportError::MissingSection(name)) if name == "defaults"));
}

#[test]
fn test_missing_default_option() {
    let content = "[defaults]\nwordchars = [\\w]\nimmediate = false\n[abbr]\nadr = x\n";
    let result = LegacyImporter::new().import_str(content);
    assert!(matches!(result, Err(ImportError::MissingDefault(_))));
}

#[test]
fn test_parse_error_is_import_error() {
    let result = LegacyImporter::new().import_str("[abbr]\nbroken line\n");
    assert!(matches!(result, Err(ImportError::Parse(_))));
}

#[test]
fn test_load_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("abbr.ini");
    fs::write(&path, legacy_file("sig = Kind regards\n")).unwrap();

    let phrases = LegacyImporter::new().load(&path).unwrap();
    assert_eq!(phrases.len(), 1);
    assert_eq!(phrases[0].title, "Kind regards");
}

#[test]
fn test_load_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing.ini");

    let result = LegacyImporter::new().load(&path);
    assert!(matches!(result, Err(ImportError::Io { .. })));
}
