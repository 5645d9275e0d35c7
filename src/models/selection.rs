// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Hover/selection state and panel visibility.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::overlay::OverlayId;

/// Hovered overlay and the selected set.
///
/// Selected ids are kept in the order they were selected; the overlay set
/// uses that order to raise the most recently selected overlay to the top.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    hovered: Option<OverlayId>,
    selected: Vec<OverlayId>,
}

impl SelectionState {
    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Returns true if the hovered id changed.
    pub fn set_hovered(&mut self, id: Option<OverlayId>) -> bool {
        if self.hovered == id {
            return false;
        }
        self.hovered = id;
        true
    }

    pub fn selected(&self) -> &[OverlayId] {
        &self.selected
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    /// Add `id` as the most recent selection, moving it to the end if present.
    pub fn add(&mut self, id: OverlayId) {
        self.selected.retain(|s| *s != id);
        self.selected.push(id);
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.selected.len();
        self.selected.retain(|s| s != id);
        before != self.selected.len()
    }

    /// Toggle membership. Returns true if `id` is selected afterwards.
    pub fn toggle(&mut self, id: OverlayId) -> bool {
        if self.remove(&id) {
            false
        } else {
            self.add(id);
            true
        }
    }

    /// Returns true if anything was selected.
    pub fn clear(&mut self) -> bool {
        let had = !self.selected.is_empty();
        self.selected.clear();
        had
    }

    /// Replace the selection wholesale. Returns true if it changed.
    pub fn set(&mut self, ids: Vec<OverlayId>) -> bool {
        let mut unique = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        if unique == self.selected {
            return false;
        }
        self.selected = unique;
        true
    }

    /// Drop ids not in `valid`. Returns true if the selection changed.
    pub fn retain_existing(&mut self, valid: &HashSet<&str>) -> bool {
        if self.hovered.as_deref().is_some_and(|h| !valid.contains(h)) {
            self.hovered = None;
        }
        let before = self.selected.len();
        self.selected.retain(|s| valid.contains(s.as_str()));
        before != self.selected.len()
    }

    /// Clear hover and selection. Returns true if the selection changed.
    pub fn reset(&mut self) -> bool {
        self.hovered = None;
        self.clear()
    }
}

/// Leaf panels managed by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    Help,
    Json,
    Thumbnails,
}

/// Independent panel toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelVisibility {
    pub help: bool,
    pub json: bool,
    pub thumbnails: bool,
}

impl PanelVisibility {
    pub fn get(&self, panel: Panel) -> bool {
        match panel {
            Panel::Help => self.help,
            Panel::Json => self.json,
            Panel::Thumbnails => self.thumbnails,
        }
    }

    /// Returns true if the value changed.
    pub fn set(&mut self, panel: Panel, visible: bool) -> bool {
        let slot = match panel {
            Panel::Help => &mut self.help,
            Panel::Json => &mut self.json,
            Panel::Thumbnails => &mut self.thumbnails,
        };
        let changed = *slot != visible;
        *slot = visible;
        changed
    }

    pub fn any(&self) -> bool {
        self.help || self.json || self.thumbnails
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_moves_to_most_recent() {
        let mut s = SelectionState::default();
        s.add("a".into());
        s.add("b".into());
        s.add("a".into());
        assert_eq!(s.selected(), &["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn toggle_and_clear() {
        let mut s = SelectionState::default();
        assert!(s.toggle("a".into()));
        assert!(!s.toggle("a".into()));
        assert!(!s.clear());
        s.add("x".into());
        assert!(s.clear());
    }

    #[test]
    fn set_dedupes_and_reports_changes() {
        let mut s = SelectionState::default();
        assert!(s.set(vec!["a".into(), "b".into(), "a".into()]));
        assert_eq!(s.selected().len(), 2);
        assert!(!s.set(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn retain_existing_purges_stale_ids() {
        let mut s = SelectionState::default();
        s.add("a".into());
        s.add("b".into());
        s.set_hovered(Some("b".into()));
        let valid: HashSet<&str> = ["a"].into_iter().collect();
        assert!(s.retain_existing(&valid));
        assert_eq!(s.selected(), &["a".to_string()]);
        assert_eq!(s.hovered(), None);
    }

    #[test]
    fn hover_reports_changes_only() {
        let mut s = SelectionState::default();
        assert!(s.set_hovered(Some("a".into())));
        assert!(!s.set_hovered(Some("a".into())));
        assert!(s.set_hovered(None));
    }

    #[test]
    fn panels_toggle_independently() {
        let mut p = PanelVisibility::default();
        assert!(p.set(Panel::Json, true));
        assert!(!p.set(Panel::Json, true));
        assert!(p.set(Panel::Help, true));
        assert!(p.get(Panel::Json) && p.get(Panel::Help) && !p.get(Panel::Thumbnails));
        assert!(p.any());
    }
}
