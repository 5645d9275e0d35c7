// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The overlay set: an ordered collection of overlay records.
//!
//! Draw order is insertion order, except that selected records are drawn
//! last, in the order they were selected. Hit testing walks the same order
//! backwards, so whatever was drawn last (and is therefore visually on top)
//! wins when shapes overlap.

pub mod hit;
pub mod paint;

use std::collections::{HashMap, HashSet};

use crate::error::ViewerError;
use crate::models::options::Options;
use crate::models::overlay::{OverlayId, OverlayRecord};
use crate::models::selection::SelectionState;
use crate::render::surface::Surface;
use crate::util::geometry::{Point, Rect};
use crate::view::transform::Transform;

use hit::{geometry_contains, viewport_bounds, HitTolerance};
use paint::paint_overlay;

/// Result of swapping in a new record list.
#[derive(Debug, Default)]
pub struct ReplaceOutcome {
    /// Records rejected during validation; the rest of the set is kept.
    pub dropped: Vec<ViewerError>,
    /// True if stale ids were purged from the selection.
    pub selection_changed: bool,
}

#[derive(Debug, Default)]
pub struct OverlaySet {
    records: Vec<OverlayRecord>,
    index: HashMap<OverlayId, usize>,
    /// Indices into `records` in draw order.
    draw_order: Vec<usize>,
}

impl OverlaySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace every record.
    ///
    /// Invalid and duplicate records are dropped individually. Selection and
    /// hover ids that no longer exist are purged from `selection`.
    pub fn replace(&mut self, records: Vec<OverlayRecord>, selection: &mut SelectionState) -> ReplaceOutcome {
        let mut outcome = ReplaceOutcome::default();
        let mut kept = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());

        for mut record in records {
            if let Err(err) = record.validate() {
                log::warn!("{}", err);
                outcome.dropped.push(err);
                continue;
            }
            if index.contains_key(&record.id) {
                let err = ViewerError::InvalidOverlayGeometry {
                    id: record.id.clone(),
                    reason: "duplicate id".to_string(),
                };
                log::warn!("{}", err);
                outcome.dropped.push(err);
                continue;
            }
            record.style.selected = false;
            index.insert(record.id.clone(), kept.len());
            kept.push(record);
        }

        self.records = kept;
        self.index = index;

        let valid: HashSet<&str> = self.records.iter().map(|r| r.id.as_str()).collect();
        outcome.selection_changed = selection.retain_existing(&valid);
        self.apply_selection(selection);

        log::debug!(
            "Overlay set replaced: {} kept, {} dropped",
            self.records.len(),
            outcome.dropped.len()
        );
        outcome
    }

    /// Remove every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.index.clear();
        self.draw_order.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&OverlayRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &OverlayRecord> {
        self.records.iter()
    }

    /// Records in draw order (bottom first).
    pub fn draw_order(&self) -> impl DoubleEndedIterator<Item = &OverlayRecord> {
        self.draw_order.iter().map(move |&i| &self.records[i])
    }

    /// Sync `selected` flags and draw order with `selection`.
    pub fn apply_selection(&mut self, selection: &SelectionState) {
        for record in &mut self.records {
            record.style.selected = false;
        }
        let mut raised = Vec::with_capacity(selection.selected().len());
        for id in selection.selected() {
            if let Some(&i) = self.index.get(id) {
                self.records[i].style.selected = true;
                raised.push(i);
            }
        }
        self.draw_order = (0..self.records.len())
            .filter(|i| !self.records[*i].style.selected)
            .chain(raised)
            .collect();
    }

    /// Set the hidden flag. Returns true if it changed.
    pub fn set_hidden(&mut self, id: &str, hidden: bool) -> bool {
        match self.index.get(id) {
            Some(&i) if self.records[i].style.hidden != hidden => {
                self.records[i].style.hidden = hidden;
                true
            }
            _ => false,
        }
    }

    fn is_visible(record: &OverlayRecord, options: &Options) -> bool {
        !record.style.hidden && options.is_field_active(&record.field)
    }

    /// Paint every visible record in draw order.
    pub fn draw(&self, surface: &mut dyn Surface, transform: &Transform, options: &Options, hovered: Option<&str>) {
        let mut caption_slot = 0;
        for record in self.draw_order() {
            if !Self::is_visible(record, options) {
                continue;
            }
            let is_hovered = hovered == Some(record.id.as_str());
            paint_overlay(surface, record, transform, options, is_hovered, caption_slot);
            if record.geometry.bounds().is_none() {
                caption_slot += 1;
            }
        }
    }

    /// The topmost visible record under the viewport point, last drawn first.
    pub fn hit_test(&self, point: Point, transform: &Transform, options: &Options) -> Option<&OverlayRecord> {
        let tol = HitTolerance {
            line: options.hit_tolerance + options.stroke_width / 2.0,
            keypoint_radius: options.keypoint_radius,
        };
        self.draw_order()
            .rev()
            .filter(|r| Self::is_visible(r, options))
            .find(|r| geometry_contains(&r.geometry, transform, point, tol))
    }

    /// Ids of visible records whose viewport bounds intersect `rect`, in draw order.
    pub fn intersecting(&self, rect: &Rect, transform: &Transform, options: &Options) -> Vec<OverlayId> {
        self.draw_order()
            .filter(|r| Self::is_visible(r, options))
            .filter(|r| viewport_bounds(&r.geometry, transform).is_some_and(|b| b.intersects(rect)))
            .map(|r| r.id.clone())
            .collect()
    }

    /// Union of the media-space bounds of `ids`.
    pub fn bounds_of(&self, ids: &[OverlayId]) -> Option<Rect> {
        ids.iter()
            .filter_map(|id| self.get(id))
            .filter_map(|r| r.geometry.bounds())
            .reduce(|a, b| a.union(&b))
    }
}
