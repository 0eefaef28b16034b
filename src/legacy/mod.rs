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

//! Legacy abbreviations import
//!
//! Reads the older flat abbreviations file (`[config]`, `[defaults]` and
//! `[abbr]` sections) and turns every abbreviation definition into a
//! `Phrase`. The result is a candidate list only; validating it against a
//! live tree and attaching it is the job of `ConfigurationManager`.
//!
//! # Example
//!
//! ```
//! use phrasebook::legacy::LegacyImporter;
//!
//! let content = "\
//! [defaults]
//! wordchars = [\\w]
//! immediate = False
//! ignorecase = False
//! matchcase = False
//! backspace = True
//! omittrigger = False
//! triggerinside = False
//!
//! [abbr]
//! adr = 22 Avenue Street
//! adr.immediate = True
//! ";
//!
//! let phrases = LegacyImporter::new().import_str(content)?;
//! assert_eq!(phrases.len(), 1);
//! assert!(phrases[0].immediate);
//! # Ok::<(), phrasebook::legacy::ImportError>(())
//! ```

pub mod importer;
pub mod parser;

pub use importer::{group_keys, KeyGroup, LegacyImporter, LegacyOption};
pub use parser::{parse_legacy, LegacyDocument, ParseError};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a legacy import
///
/// An import either produces every phrase or none.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Legacy file could not be read.
    #[error("Failed to read legacy file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Legacy file is malformed.
    #[error("Malformed legacy file: {0}")]
    Parse(#[from] ParseError),

    /// A required section is absent.
    #[error("Legacy file has no [{0}] section")]
    MissingSection(String),

    /// The defaults section does not define a recognised option.
    #[error("Legacy defaults do not define '{0}'")]
    MissingDefault(String),

    /// A word characters pattern does not compile.
    #[error("Invalid word characters pattern for '{owner}': {source}")]
    InvalidPattern {
        owner: String,
        #[source]
        source: regex::Error,
    },

    /// A legacy abbreviation collides with one already in the tree.
    #[error("The abbreviation '{0}' is already in use.")]
    AbbreviationInUse(String),
}

#[cfg(test)]
mod tests;
