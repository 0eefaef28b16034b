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

//! src/legacy/parser.rs
//!
//! Legacy abbreviations file parser
//!
//! The legacy format is a sectioned `key = value` file:
//!
//! ```text
//! [config]
//! # ignored by the importer
//!
//! [defaults]
//! wordchars = [\w]
//! immediate = False
//!
//! [abbr]
//! adr = 22 Avenue Street
//! adr.immediate = True
//! sig = '''Kind regards,
//! Chris'''
//! ```
//!
//! It handles:
//! - `[section]` headers
//! - Comments and blank lines
//! - Quoted keys
//! - Single-line values, kept literally (quotes are not stripped)
//! - Triple-quoted values spanning several lines
//! - Line numbers for error reporting
//!
//! # Architecture
//! Lines are walked one at a time; each line is recognised with nom
//! combinators. A triple-quoted value that does not close on its own line
//! pulls following lines in until the closing delimiter.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while1},
    character::complete::{char, space0},
    sequence::delimited,
    IResult, Parser,
};
use thiserror::Error;

/// Parse errors with line number context
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Parse error on line {line}: {message}")]
    InvalidSyntax { line: usize, message: String },

    #[error("Duplicate key '{key}' on line {line}")]
    DuplicateKey { key: String, line: usize },

    #[error("Duplicate section '[{section}]' on line {line}")]
    DuplicateSection { section: String, line: usize },

    #[error("Unterminated multi-line value starting on line {line}")]
    UnterminatedValue { line: usize },
}

/// An ordered list of key/value entries
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Section {
    entries: Vec<(String, String)>,
}

impl Section {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys in file order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Key/value pairs in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, key: String, value: String, line: usize) -> Result<(), ParseError> {
        if self.contains_key(&key) {
            return Err(ParseError::DuplicateKey { key, line });
        }
        self.entries.push((key, value));
        Ok(())
    }
}

/// A parsed legacy file
///
/// Entries appearing before the first section header belong to `root`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LegacyDocument {
    pub root: Section,
    sections: Vec<(String, Section)>,
}

impl LegacyDocument {
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, section)| section)
    }

    /// Section names in file order.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(n, _)| n.as_str())
    }

    fn current_section(&mut self) -> &mut Section {
        match self.sections.last_mut() {
            Some((_, section)) => section,
            None => &mut self.root,
        }
    }
}

/// Parse a complete legacy file
///
/// # Example
/// ```
/// use phrasebook::legacy::parser::parse_legacy;
///
/// let doc = parse_legacy("[abbr]\nadr = 22 Avenue Street\n")?;
/// assert_eq!(doc.section("abbr").and_then(|s| s.get("adr")), Some("22 Avenue Street"));
/// # Ok::<(), phrasebook::legacy::parser::ParseError>(())
/// ```
pub fn parse_legacy(content: &str) -> Result<LegacyDocument, ParseError> {
    let mut document = LegacyDocument::default();
    let mut lines = content.lines().enumerate();

    while let Some((index, line)) = lines.next() {
        let line_num = index + 1; // Human-readable numbers start at 1
        let line_trimmed = line.trim();

        // Skip empty lines and comments
        if line_trimmed.is_empty() || line_trimmed.starts_with('#') {
            continue;
        }

        if line_trimmed.starts_with('[') {
            let name = parse_header_line(line_trimmed).map_err(|message| ParseError::InvalidSyntax {
                line: line_num,
                message,
            })?;
            if document.section(&name).is_some() {
                return Err(ParseError::DuplicateSection {
                    section: name,
                    line: line_num,
                });
            }
            document.sections.push((name, Section::default()));
            continue;
        }

        let (raw_value, key) = parse_key(line_trimmed).map_err(|e| ParseError::InvalidSyntax {
            line: line_num,
            message: format!("expected 'key = value' ({:?})", e),
        })?;

        let value = match triple_quote(raw_value) {
            Some(delimiter) => {
                let body = &raw_value[delimiter.len()..];
                match body.find(delimiter) {
                    Some(end) => {
                        ensure_only_comment(&body[end + delimiter.len()..], line_num)?;
                        body[..end].to_string()
                    }
                    None => read_multiline(body, delimiter, &mut lines, line_num)?,
                }
            }
            None => parse_single_value(raw_value, line_num)?,
        };

        document.current_section().insert(key, value, line_num)?;
    }

    Ok(document)
}

/// Parse `[name]`, optionally followed by a comment.
fn parse_header_line(line: &str) -> Result<String, String> {
    if line.starts_with("[[") {
        return Err("nested sections are not supported".to_string());
    }

    let parsed: IResult<&str, &str> =
        delimited(char('['), take_while1(|c: char| c != ']' && c != '['), char(']')).parse(line);

    match parsed {
        Ok((remaining, name)) => {
            let remaining = remaining.trim();
            if remaining.is_empty() || remaining.starts_with('#') {
                Ok(name.trim().to_string())
            } else {
                Err(format!("unexpected text after section header: '{}'", remaining))
            }
        }
        Err(e) => Err(format!("malformed section header ({:?})", e)),
    }
}

/// Parse a key and the `=` after it.
///
/// Keys may be bare or quoted. The remaining input (trimmed) is the raw
/// value text.
pub fn parse_key(input: &str) -> IResult<&str, String> {
    let (input, key) = alt((
        delimited(char('"'), take_until("\""), char('"')),
        delimited(char('\''), take_until("'"), char('\'')),
        take_while1(|c: char| c != '='),
    ))
    .parse(input)?;

    let (input, _) = (space0, char('='), space0).parse(input)?;

    Ok((input.trim(), key.trim().to_string()))
}

/// Opening delimiter if `value` is triple-quoted.
fn triple_quote(value: &str) -> Option<&'static str> {
    let parsed: IResult<&str, &str> = alt((tag("'''"), tag("\"\"\""))).parse(value);
    match parsed {
        Ok((_, "'''")) => Some("'''"),
        Ok(_) => Some("\"\"\""),
        Err(_) => None,
    }
}

/// Single-line values are kept literally. A quoted value keeps its quotes;
/// an unquoted value ends at the first `#`.
fn parse_single_value(raw: &str, line: usize) -> Result<String, ParseError> {
    let quote = match raw.chars().next() {
        Some(q @ ('"' | '\'')) => q,
        _ => {
            let value = raw.split('#').next().unwrap_or_default();
            return Ok(value.trim_end().to_string());
        }
    };

    let closing = raw[1..].find(quote).ok_or_else(|| ParseError::InvalidSyntax {
        line,
        message: format!("unterminated quoted value: {}", raw),
    })?;
    let end = closing + 2;
    ensure_only_comment(&raw[end..], line)?;

    Ok(raw[..end].to_string())
}

fn ensure_only_comment(trailing: &str, line: usize) -> Result<(), ParseError> {
    let trailing = trailing.trim();
    if trailing.is_empty() || trailing.starts_with('#') {
        Ok(())
    } else {
        Err(ParseError::InvalidSyntax {
            line,
            message: format!("unexpected text after value: '{}'", trailing),
        })
    }
}

/// Collect lines until `delimiter` closes the value started with `first`.
fn read_multiline<'a>(
    first: &str,
    delimiter: &str,
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
    start_line: usize,
) -> Result<String, ParseError> {
    let mut value = first.to_string();

    for (index, line) in lines {
        value.push('\n');
        match line.find(delimiter) {
            Some(end) => {
                value.push_str(&line[..end]);
                ensure_only_comment(&line[end + delimiter.len()..], index + 1)?;
                return Ok(value);
            }
            None => value.push_str(line),
        }
    }

    Err(ParseError::UnterminatedValue { line: start_line })
}
