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

//! Process-wide application settings
//!
//! Settings are persisted next to the tree in every snapshot. Loading is
//! additive: a key missing from an older snapshot takes its built-in
//! default, so new settings can be introduced without discarding a user's
//! saved configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Keyboard/mouse interface used to capture and send input
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum InterfaceType {
    /// X evdev interface
    #[default]
    XEvdev,
    /// X record extension, for older X servers
    XRecord,
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterfaceType::XEvdev => write!(f, "XEvdev"),
            InterfaceType::XRecord => write!(f, "XRecord"),
        }
    }
}

/// Global application settings
///
/// Field names are serialised under the keys earlier releases used.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub is_first_run: bool,
    pub service_running: bool,
    pub menu_takes_focus: bool,
    pub show_tray_icon: bool,
    pub sort_by_usage_count: bool,
    #[serde(rename = "detectUnwanted")]
    pub detect_unwanted_abbr: bool,
    pub prompt_to_save: bool,
    /// Characters typed before the predictive popup appears
    pub predictive_length: u32,
    /// Running count of keystrokes saved by expansions
    pub input_savings: u64,
    #[serde(rename = "enableQT4Workaround")]
    pub enable_qt4_workaround: bool,
    pub interface_type: InterfaceType,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            is_first_run: true,
            service_running: true,
            menu_takes_focus: false,
            show_tray_icon: true,
            sort_by_usage_count: true,
            detect_unwanted_abbr: false,
            prompt_to_save: true,
            predictive_length: 5,
            input_savings: 0,
            enable_qt4_workaround: false,
            interface_type: InterfaceType::default(),
        }
    }
}

impl Settings {
    /// Overlays the known keys of a loose JSON object onto these settings.
    ///
    /// Keys absent from `saved` keep their current value; keys these
    /// settings do not know are ignored. A non-object `saved` changes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if a known key holds a value of the wrong type;
    /// the settings are left untouched in that case.
    pub fn merge_from(&mut self, saved: &Value) -> Result<(), serde_json::Error> {
        let (Value::Object(current), Some(saved)) = (serde_json::to_value(&*self)?, saved.as_object())
        else {
            return Ok(());
        };

        let mut merged = current;
        for (key, value) in saved {
            if let Some(slot) = merged.get_mut(key) {
                *slot = value.clone();
            }
        }

        *self = serde_json::from_value(Value::Object(merged))?;
        Ok(())
    }

    /// Key/value pairs in serialised form, for display.
    pub fn entries(&self) -> Vec<(String, String)> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map
                .into_iter()
                .map(|(key, value)| match value {
                    Value::String(text) => (key, text),
                    other => (key, other.to_string()),
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}
