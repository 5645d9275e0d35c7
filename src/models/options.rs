// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Rendering and interaction options.
//!
//! Options arrive as partial JSON objects with camelCase keys. Each key is
//! merged on its own: unknown keys are ignored, values of the wrong type are
//! skipped, and out-of-range numbers are clamped to the nearest valid value
//! with an [`ViewerError::UnsupportedOptionValue`] warning.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ViewerError;
use crate::util::color::{default_color_pool, Color};
use crate::view::transform::{TransformLimits, DEFAULT_ELASTIC_SLACK, DEFAULT_MAX_SCALE, DEFAULT_MIN_SCALE};

/// Keyboard modifier used by click and drag policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Shift,
    Ctrl,
    Alt,
    Meta,
    /// Disables the policy that uses it.
    None,
}

/// The full option set. Defaults match a typical image viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    pub show_label: bool,
    pub show_confidence: bool,
    pub show_index: bool,
    /// `field`, `label`, `id`, or a metadata key.
    pub color_by_field: String,
    pub show_controls: bool,
    pub show_crosshair: bool,
    #[serde(rename = "loop")]
    pub loop_playback: bool,
    pub autoplay: bool,
    /// Padding around the selection for zoom-to-selection, as a fraction.
    pub zoom_pad: f64,
    pub alpha: f64,
    pub stroke_width: f64,
    pub keypoint_radius: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    pub elastic_slack: f64,
    /// Zoom exponent per wheel pixel: `factor = exp(-delta * sensitivity)`.
    pub wheel_sensitivity: f64,
    /// Viewport pixels a press must travel before it becomes a pan.
    pub drag_threshold: f64,
    /// Viewport pixels of slack for line and keypoint hit tests.
    pub hit_tolerance: f64,
    pub frame_rate: f64,
    pub seek_step: f64,
    pub multi_select_modifier: Modifier,
    pub box_select_modifier: Modifier,
    /// Label fields to show. Empty shows everything.
    pub active_fields: Vec<String>,
    pub fit_to_viewport: bool,
    pub color_pool: Vec<Color>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            show_label: true,
            show_confidence: true,
            show_index: false,
            color_by_field: "field".to_string(),
            show_controls: true,
            show_crosshair: false,
            loop_playback: false,
            autoplay: false,
            zoom_pad: 0.2,
            alpha: 0.7,
            stroke_width: 2.0,
            keypoint_radius: 3.0,
            min_scale: DEFAULT_MIN_SCALE,
            max_scale: DEFAULT_MAX_SCALE,
            elastic_slack: DEFAULT_ELASTIC_SLACK,
            wheel_sensitivity: 0.0015,
            drag_threshold: 3.0,
            hit_tolerance: 4.0,
            frame_rate: 30.0,
            seek_step: 5.0,
            multi_select_modifier: Modifier::Shift,
            box_select_modifier: Modifier::Alt,
            active_fields: Vec::new(),
            fit_to_viewport: true,
            color_pool: default_color_pool(),
        }
    }
}

/// Outcome of merging a partial options object.
#[derive(Debug, Default)]
pub struct OptionsUpdate {
    /// Recognized keys whose value was applied.
    pub applied: Vec<String>,
    pub warnings: Vec<ViewerError>,
}

impl OptionsUpdate {
    pub fn touched(&self, key: &str) -> bool {
        self.applied.iter().any(|k| k == key)
    }
}

impl Options {
    pub fn transform_limits(&self) -> TransformLimits {
        TransformLimits {
            min_scale: self.min_scale,
            max_scale: self.max_scale,
            elastic_slack: self.elastic_slack,
        }
    }

    /// True when `field` passes the `activeFields` filter.
    pub fn is_field_active(&self, field: &str) -> bool {
        self.active_fields.is_empty() || self.active_fields.iter().any(|f| f == field)
    }

    /// Merge a partial options object. Non-object input is ignored.
    pub fn merge(&mut self, patch: &Value) -> OptionsUpdate {
        let mut update = OptionsUpdate::default();
        let Some(map) = patch.as_object() else {
            log::warn!("Ignoring options update that is not an object");
            return update;
        };

        for (key, value) in map {
            let applied = match key.as_str() {
                "showLabel" => set_bool(&mut self.show_label, key, value),
                "showConfidence" => set_bool(&mut self.show_confidence, key, value),
                "showIndex" => set_bool(&mut self.show_index, key, value),
                "showControls" => set_bool(&mut self.show_controls, key, value),
                "showCrosshair" => set_bool(&mut self.show_crosshair, key, value),
                "loop" => set_bool(&mut self.loop_playback, key, value),
                "autoplay" => set_bool(&mut self.autoplay, key, value),
                "fitToViewport" => set_bool(&mut self.fit_to_viewport, key, value),
                "colorByField" => match value.as_str() {
                    Some(s) if !s.is_empty() => {
                        self.color_by_field = s.to_string();
                        true
                    }
                    _ => wrong_type(key, value),
                },
                "zoomPad" => set_number(&mut self.zoom_pad, key, value, 0.0, 10.0, &mut update),
                "alpha" => set_number(&mut self.alpha, key, value, 0.0, 1.0, &mut update),
                "strokeWidth" => set_number(&mut self.stroke_width, key, value, 0.5, 20.0, &mut update),
                "keypointRadius" => set_number(&mut self.keypoint_radius, key, value, 0.5, 50.0, &mut update),
                "minScale" => set_number(&mut self.min_scale, key, value, 1e-4, 1e3, &mut update),
                "maxScale" => set_number(&mut self.max_scale, key, value, 1e-4, 1e4, &mut update),
                "elasticSlack" => set_number(&mut self.elastic_slack, key, value, 0.0, 1e4, &mut update),
                "wheelSensitivity" => set_number(&mut self.wheel_sensitivity, key, value, 0.0, 1.0, &mut update),
                "dragThreshold" => set_number(&mut self.drag_threshold, key, value, 0.0, 100.0, &mut update),
                "hitTolerance" => set_number(&mut self.hit_tolerance, key, value, 0.0, 100.0, &mut update),
                "frameRate" => set_number(&mut self.frame_rate, key, value, 1.0, 1000.0, &mut update),
                "seekStep" => set_number(&mut self.seek_step, key, value, 0.01, 3600.0, &mut update),
                "multiSelectModifier" => set_modifier(&mut self.multi_select_modifier, key, value),
                "boxSelectModifier" => set_modifier(&mut self.box_select_modifier, key, value),
                "activeFields" => match serde_json::from_value::<Vec<String>>(value.clone()) {
                    Ok(fields) => {
                        self.active_fields = fields;
                        true
                    }
                    Err(_) => wrong_type(key, value),
                },
                "colorPool" => match serde_json::from_value::<Vec<Color>>(value.clone()) {
                    Ok(pool) if !pool.is_empty() => {
                        self.color_pool = pool;
                        true
                    }
                    _ => wrong_type(key, value),
                },
                // bindings live in the shortcut table, not here
                "shortcuts" => false,
                _ => {
                    log::debug!("Ignoring unknown option {:?}", key);
                    false
                }
            };
            if applied {
                update.applied.push(key.clone());
            }
        }

        if self.max_scale < self.min_scale {
            update.warnings.push(ViewerError::UnsupportedOptionValue {
                key: "maxScale".to_string(),
                value: self.max_scale.to_string(),
                clamped_to: self.min_scale.to_string(),
            });
            self.max_scale = self.min_scale;
        }

        for warning in &update.warnings {
            log::warn!("{}", warning);
        }
        update
    }
}

fn wrong_type(key: &str, value: &Value) -> bool {
    log::warn!("Ignoring option {:?}: unexpected value {}", key, value);
    false
}

fn set_bool(slot: &mut bool, key: &str, value: &Value) -> bool {
    match value.as_bool() {
        Some(b) => {
            *slot = b;
            true
        }
        None => wrong_type(key, value),
    }
}

fn set_modifier(slot: &mut Modifier, key: &str, value: &Value) -> bool {
    match serde_json::from_value::<Modifier>(value.clone()) {
        Ok(m) => {
            *slot = m;
            true
        }
        Err(_) => wrong_type(key, value),
    }
}

fn set_number(slot: &mut f64, key: &str, value: &Value, min: f64, max: f64, update: &mut OptionsUpdate) -> bool {
    let Some(n) = value.as_f64().filter(|n| n.is_finite()) else {
        return wrong_type(key, value);
    };
    let clamped = n.clamp(min, max);
    if clamped != n {
        update.warnings.push(ViewerError::UnsupportedOptionValue {
            key: key.to_string(),
            value: n.to_string(),
            clamped_to: clamped.to_string(),
        });
    }
    *slot = clamped;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merges_recognized_keys_only() {
        let mut options = Options::default();
        let update = options.merge(&json!({
            "showLabel": false,
            "colorByField": "label",
            "loop": true,
            "notAnOption": 42
        }));
        assert!(!options.show_label);
        assert_eq!(options.color_by_field, "label");
        assert!(options.loop_playback);
        assert_eq!(update.applied.len(), 3);
        assert!(!update.touched("notAnOption"));
        assert!(update.warnings.is_empty());
    }

    #[test]
    fn clamps_out_of_range_values() {
        let mut options = Options::default();
        let update = options.merge(&json!({"zoomPad": -1.0, "alpha": 3}));
        assert_eq!(options.zoom_pad, 0.0);
        assert_eq!(options.alpha, 1.0);
        assert_eq!(update.warnings.len(), 2);
        for name in ["zoomPad", "alpha"] {
            assert!(update
                .warnings
                .iter()
                .any(|w| matches!(w, ViewerError::UnsupportedOptionValue { key, .. } if key == name)));
        }
    }

    #[test]
    fn wrong_types_are_skipped() {
        let mut options = Options::default();
        let update = options.merge(&json!({"showLabel": "yes", "zoomPad": "big", "colorPool": []}));
        assert_eq!(options, Options::default());
        assert!(update.applied.is_empty());
    }

    #[test]
    fn max_scale_never_below_min_scale() {
        let mut options = Options::default();
        let update = options.merge(&json!({"minScale": 2.0, "maxScale": 1.0}));
        assert_eq!(options.max_scale, 2.0);
        assert_eq!(update.warnings.len(), 1);
    }

    #[test]
    fn modifiers_and_fields() {
        let mut options = Options::default();
        options.merge(&json!({
            "multiSelectModifier": "ctrl",
            "activeFields": ["predictions"],
            "colorPool": ["#ff0000"]
        }));
        assert_eq!(options.multi_select_modifier, Modifier::Ctrl);
        assert!(options.is_field_active("predictions"));
        assert!(!options.is_field_active("ground_truth"));
        assert_eq!(options.color_pool, vec![Color::rgb(255, 0, 0)]);
    }

    #[test]
    fn non_object_patch_is_ignored() {
        let mut options = Options::default();
        let update = options.merge(&json!([1, 2]));
        assert!(update.applied.is_empty());
        assert_eq!(options, Options::default());
    }
}
