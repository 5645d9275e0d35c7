// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Contracts for the leaf panels: the JSON inspector, the shortcut help
//! overlay and the thumbnail selector.
//!
//! Panels get read-only props from the viewer and answer with
//! [`PanelIntent`]s. They hold no state of their own.

use serde_json::Value;

use crate::interaction::shortcuts::ShortcutTable;
use crate::models::media::ThumbnailItem;
use crate::models::overlay::OverlayRecord;
use crate::models::selection::Panel;

/// Something a panel asks the viewer to do.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelIntent {
    Close(Panel),
    /// Thumbnail selector picked an item.
    Select(String),
}

/// Props for the JSON inspector.
#[derive(Debug, Clone)]
pub struct JsonPanelProps<'a> {
    pub visible: bool,
    /// Selected records in selection order, or every record when nothing
    /// is selected.
    pub records: Vec<&'a OverlayRecord>,
    pub selection_only: bool,
}

impl JsonPanelProps<'_> {
    /// Label metadata of the shown records as one JSON document.
    pub fn document(&self) -> Value {
        let items: Vec<Value> = self
            .records
            .iter()
            .map(|r| serde_json::to_value(r).unwrap_or(Value::Null))
            .collect();
        match items.len() {
            1 if self.selection_only => items.into_iter().next().unwrap_or(Value::Null),
            _ => Value::Array(items),
        }
    }

    pub fn pretty(&self) -> String {
        serde_json::to_string_pretty(&self.document()).unwrap_or_default()
    }
}

/// One row of the help overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct HelpRow {
    pub keys: String,
    pub action: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy)]
pub struct HelpPanelProps<'a> {
    pub visible: bool,
    pub shortcuts: &'a ShortcutTable,
}

impl HelpPanelProps<'_> {
    /// Rows grouped by action, in table order. Combos bound to the same
    /// action share a row.
    pub fn rows(&self) -> Vec<HelpRow> {
        let mut rows: Vec<HelpRow> = Vec::new();
        for s in self.shortcuts.iter() {
            let keys = s.combo.to_string();
            if let Some(row) = rows.iter_mut().find(|r| r.action == s.action) {
                row.keys.push_str(" / ");
                row.keys.push_str(&keys);
                continue;
            }
            let description = if s.description.is_empty() {
                s.action.clone()
            } else {
                s.description.clone()
            };
            rows.push(HelpRow {
                keys,
                action: s.action.clone(),
                description,
            });
        }
        rows
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ThumbnailProps<'a> {
    pub visible: bool,
    pub items: &'a [ThumbnailItem],
    pub current: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::bbox;

    #[test]
    fn single_selection_is_an_object() {
        let record = bbox("a", 1.0, 2.0, 3.0, 4.0).with_label("cat");
        let props = JsonPanelProps {
            visible: true,
            records: vec![&record],
            selection_only: true,
        };
        let doc = props.document();
        assert_eq!(doc["id"], "a");
        assert_eq!(doc["label"], "cat");
        assert_eq!(doc["kind"], "box");
        assert!(props.pretty().contains("\"cat\""));

        let all = JsonPanelProps {
            selection_only: false,
            ..props.clone()
        };
        assert!(all.document().is_array());
    }

    #[test]
    fn help_rows_merge_aliases() {
        let table = ShortcutTable::default_table();
        let props = HelpPanelProps {
            visible: true,
            shortcuts: &table,
        };
        let rows = props.rows();
        let help = rows.iter().find(|r| r.action == "toggle-help").unwrap();
        assert_eq!(help.keys, "? / shift+?");
        assert_eq!(rows.iter().filter(|r| r.action == "zoom-in").count(), 1);
    }
}
