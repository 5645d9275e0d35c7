// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Keyboard shortcut tables.
//!
//! A table maps key combinations such as `ctrl+shift+z` to action names.
//! Tables are plain data: the viewer ships a default one, and hosts can
//! override or extend it from configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::input::Modifiers;

/// When a shortcut is allowed to fire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortcutScope {
    #[default]
    Global,
    /// Only while at least one overlay is selected.
    Selection,
}

/// A key plus modifiers. Keys are stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    /// Parse `"ctrl+shift+z"`, `"Escape"`, `"?"`. Returns `None` for an empty key
    /// or an unknown modifier.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split('+').map(str::trim).collect();
        // a bare "+" key splits into two empty strings
        let (key, mods) = match parts.as_slice() {
            [.., "", ""] => ("+", &parts[..parts.len() - 2]),
            [mods @ .., key] => (*key, mods),
            [] => return None,
        };
        if key.is_empty() {
            return None;
        }
        let mut modifiers = Modifiers::NONE;
        for m in mods {
            match m.to_ascii_lowercase().as_str() {
                "shift" => modifiers.shift = true,
                "ctrl" | "control" => modifiers.ctrl = true,
                "alt" | "option" => modifiers.alt = true,
                "meta" | "cmd" | "super" => modifiers.meta = true,
                _ => return None,
            }
        }
        Some(Self {
            key: normalize_key(key),
            modifiers,
        })
    }

    pub fn matches(&self, key: &str, modifiers: Modifiers) -> bool {
        self.key == normalize_key(key) && self.modifiers == modifiers
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.modifiers;
        for (held, name) in [(m.ctrl, "ctrl"), (m.alt, "alt"), (m.meta, "meta"), (m.shift, "shift")] {
            if held {
                write!(f, "{}+", name)?;
            }
        }
        write!(f, "{}", self.key)
    }
}

fn normalize_key(key: &str) -> String {
    match key.to_ascii_lowercase().as_str() {
        "esc" => "escape".to_string(),
        "spacebar" | " " => "space".to_string(),
        "arrowleft" => "left".to_string(),
        "arrowright" => "right".to_string(),
        "arrowup" => "up".to_string(),
        "arrowdown" => "down".to_string(),
        other => other.to_string(),
    }
}

/// One binding as it appears in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortcutBinding {
    pub keys: String,
    pub action: String,
    #[serde(default)]
    pub scope: ShortcutScope,
    #[serde(default)]
    pub description: String,
}

/// A resolved shortcut.
#[derive(Debug, Clone, PartialEq)]
pub struct Shortcut {
    pub combo: KeyCombo,
    pub action: String,
    pub scope: ShortcutScope,
    pub description: String,
}

/// Ordered list of shortcuts. Later bindings for the same combo replace
/// earlier ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShortcutTable {
    shortcuts: Vec<Shortcut>,
}

impl ShortcutTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `keys` to `action`. Returns false if `keys` does not parse.
    pub fn bind(&mut self, keys: &str, action: &str, scope: ShortcutScope, description: &str) -> bool {
        let Some(combo) = KeyCombo::parse(keys) else {
            log::warn!("Ignoring shortcut with unparseable keys {:?}", keys);
            return false;
        };
        self.shortcuts.retain(|s| s.combo != combo);
        self.shortcuts.push(Shortcut {
            combo,
            action: action.to_string(),
            scope,
            description: description.to_string(),
        });
        true
    }

    /// Remove the binding for `keys`, if any.
    pub fn unbind(&mut self, keys: &str) {
        if let Some(combo) = KeyCombo::parse(keys) {
            self.shortcuts.retain(|s| s.combo != combo);
        }
    }

    pub fn extend(&mut self, bindings: &[ShortcutBinding]) {
        for b in bindings {
            self.bind(&b.keys, &b.action, b.scope, &b.description);
        }
    }

    /// Apply a simple `{"keys": "action"}` map; an empty action unbinds.
    pub fn apply_map(&mut self, map: &BTreeMap<String, String>) {
        for (keys, action) in map {
            if action.is_empty() {
                self.unbind(keys);
            } else {
                self.bind(keys, action, ShortcutScope::Global, "");
            }
        }
    }

    pub fn lookup(&self, key: &str, modifiers: Modifiers) -> Option<&Shortcut> {
        self.shortcuts.iter().find(|s| s.combo.matches(key, modifiers))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shortcut> {
        self.shortcuts.iter()
    }

    pub fn len(&self) -> usize {
        self.shortcuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shortcuts.is_empty()
    }
}

/// Names of the actions the viewer handles itself.
pub mod actions {
    pub const TOGGLE_HELP: &str = "toggle-help";
    pub const TOGGLE_JSON: &str = "toggle-json";
    pub const TOGGLE_THUMBNAILS: &str = "toggle-thumbnails";
    pub const TOGGLE_FULLSCREEN: &str = "toggle-fullscreen";
    pub const CLOSE_PANELS: &str = "close-panels";
    pub const PLAY_PAUSE: &str = "play-pause";
    pub const SEEK_FORWARD: &str = "seek-forward";
    pub const SEEK_BACK: &str = "seek-back";
    pub const STEP_FORWARD: &str = "step-forward";
    pub const STEP_BACK: &str = "step-back";
    pub const ZOOM_IN: &str = "zoom-in";
    pub const ZOOM_OUT: &str = "zoom-out";
    pub const RESET_ZOOM: &str = "reset-zoom";
    pub const ZOOM_TO_SELECTION: &str = "zoom-to-selection";
    pub const CLEAR_SELECTION: &str = "clear-selection";
    pub const TOGGLE_LABELS: &str = "toggle-labels";
}

impl ShortcutTable {
    /// The built-in bindings.
    pub fn default_table() -> Self {
        use actions::*;
        let mut table = Self::new();
        let global = ShortcutScope::Global;
        let selection = ShortcutScope::Selection;
        table.bind("?", TOGGLE_HELP, global, "Show or hide this help");
        table.bind("shift+?", TOGGLE_HELP, global, "Show or hide this help");
        table.bind("j", TOGGLE_JSON, global, "Show or hide the label JSON");
        table.bind("g", TOGGLE_THUMBNAILS, global, "Show or hide the thumbnail grid");
        table.bind("f", TOGGLE_FULLSCREEN, global, "Toggle fullscreen");
        table.bind("escape", CLOSE_PANELS, global, "Close panels, then clear selection");
        table.bind("space", PLAY_PAUSE, global, "Play or pause video");
        table.bind("right", SEEK_FORWARD, global, "Seek forward");
        table.bind("left", SEEK_BACK, global, "Seek backward");
        table.bind(".", STEP_FORWARD, global, "Next frame (paused)");
        table.bind(",", STEP_BACK, global, "Previous frame (paused)");
        table.bind("=", ZOOM_IN, global, "Zoom in");
        table.bind("shift+=", ZOOM_IN, global, "Zoom in");
        table.bind("-", ZOOM_OUT, global, "Zoom out");
        table.bind("r", RESET_ZOOM, global, "Reset zoom");
        table.bind("z", ZOOM_TO_SELECTION, selection, "Zoom to the selected labels");
        table.bind("x", CLEAR_SELECTION, selection, "Clear selection");
        table.bind("l", TOGGLE_LABELS, global, "Show or hide label captions");
        table
    }
}
