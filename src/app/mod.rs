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

//! Application layer seams
//!
//! The configuration core never calls into a GUI or a keyboard grabber
//! directly. After every rebuild it hands the three global hotkeys to a
//! `HotkeyRegistrar`; when a global hotkey fires, the application looks up
//! the bound `GlobalAction` in an `ActionRegistry`.
//!
//! # Example
//! ```
//! use phrasebook::app::ActionRegistry;
//! use phrasebook::core::GlobalAction;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let opened = Rc::new(Cell::new(false));
//! let flag = Rc::clone(&opened);
//!
//! let mut registry = ActionRegistry::new();
//! registry.register(GlobalAction::OpenConfiguration, move || flag.set(true));
//!
//! assert!(registry.invoke(GlobalAction::OpenConfiguration));
//! assert!(opened.get());
//! assert!(!registry.invoke(GlobalAction::ShowPopup));
//! ```

use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

use crate::core::types::{GlobalAction, GlobalHotkey};

/// Receives the global hotkeys whenever the configuration is rebuilt.
pub trait HotkeyRegistrar {
    /// Replaces any previously registered global hotkeys.
    fn register_global_hotkeys(
        &mut self,
        config: &GlobalHotkey,
        toggle_service: &GlobalHotkey,
        show_popup: &GlobalHotkey,
    );
}

/// Registrar that ignores registrations.
#[derive(Debug, Default)]
pub struct NullRegistrar;

impl HotkeyRegistrar for NullRegistrar {
    fn register_global_hotkeys(&mut self, _: &GlobalHotkey, _: &GlobalHotkey, _: &GlobalHotkey) {}
}

/// Registrar that remembers what it was given.
///
/// Clones share their state, so a caller can keep one handle while the
/// manager owns another.
#[derive(Clone, Debug, Default)]
pub struct RecordingRegistrar {
    state: std::rc::Rc<std::cell::RefCell<RecordedHotkeys>>,
}

#[derive(Debug, Default)]
struct RecordedHotkeys {
    last: Option<[GlobalHotkey; 3]>,
    count: usize,
}

impl RecordingRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hotkeys from the most recent registration, in order
    /// config, toggle service, show popup.
    pub fn last_registered(&self) -> Option<[GlobalHotkey; 3]> {
        self.state.borrow().last.clone()
    }

    /// Number of registrations received so far.
    pub fn registration_count(&self) -> usize {
        self.state.borrow().count
    }
}

impl HotkeyRegistrar for RecordingRegistrar {
    fn register_global_hotkeys(
        &mut self,
        config: &GlobalHotkey,
        toggle_service: &GlobalHotkey,
        show_popup: &GlobalHotkey,
    ) {
        let mut state = self.state.borrow_mut();
        state.last = Some([config.clone(), toggle_service.clone(), show_popup.clone()]);
        state.count += 1;
        debug!(count = state.count, "Recorded global hotkey registration");
    }
}

/// Maps global actions to the handlers that perform them
#[derive(Default)]
pub struct ActionRegistry {
    handlers: HashMap<GlobalAction, Box<dyn FnMut()>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handler` to `action`, replacing any earlier handler.
    pub fn register(&mut self, action: GlobalAction, handler: impl FnMut() + 'static) {
        self.handlers.insert(action, Box::new(handler));
    }

    pub fn is_registered(&self, action: GlobalAction) -> bool {
        self.handlers.contains_key(&action)
    }

    /// Runs the handler for `action`. Returns false if none is registered.
    pub fn invoke(&mut self, action: GlobalAction) -> bool {
        match self.handlers.get_mut(&action) {
            Some(handler) => {
                debug!(%action, "Invoking global action");
                handler();
                true
            }
            None => {
                warn!(%action, "No handler registered for global action");
                false
            }
        }
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
