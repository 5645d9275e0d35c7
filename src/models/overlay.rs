// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Overlay record data structures.
//!
//! An overlay is one drawable annotation (box, mask, polyline, keypoints or
//! classification) in media-space coordinates, with a style and arbitrary
//! label metadata. Geometry is fixed once the record is created; only the
//! style flags change afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ViewerError;
use crate::util::color::Color;
use crate::util::geometry::{denormalize_coordinates, Point, Rect, Size};

/// Unique identifier of an overlay within one media item.
pub type OverlayId = String;

/// Kind of overlay, mirroring the [`Geometry`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKind {
    Box,
    Mask,
    Polyline,
    Keypoints,
    Classification,
}

/// Row-major segmentation mask stretched over a bounding box.
///
/// Any non-zero byte is a set pixel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Mask {
    pub fn get(&self, col: u32, row: u32) -> bool {
        if col >= self.width || row >= self.height {
            return false;
        }
        self.data
            .get(row as usize * self.width as usize + col as usize)
            .is_some_and(|v| *v != 0)
    }

    /// Horizontal runs of set pixels as `(row, start_col, end_col_exclusive)`.
    pub fn runs(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        (0..self.height).flat_map(move |row| {
            let mut runs = Vec::new();
            let mut start = None;
            for col in 0..self.width {
                match (self.get(col, row), start) {
                    (true, None) => start = Some(col),
                    (false, Some(s)) => {
                        runs.push((row, s, col));
                        start = None;
                    }
                    _ => {}
                }
            }
            if let Some(s) = start {
                runs.push((row, s, self.width));
            }
            runs
        })
    }
}

/// Shape of an overlay in media space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Geometry {
    Box {
        bounds: Rect,
    },
    Mask {
        bounds: Rect,
        mask: Mask,
    },
    Polyline {
        points: Vec<Point>,
        #[serde(default)]
        closed: bool,
        #[serde(default)]
        filled: bool,
    },
    Keypoints {
        points: Vec<Point>,
    },
    /// Whole-media label without a spatial extent.
    Classification,
}

impl Geometry {
    pub fn kind(&self) -> OverlayKind {
        match self {
            Geometry::Box { .. } => OverlayKind::Box,
            Geometry::Mask { .. } => OverlayKind::Mask,
            Geometry::Polyline { .. } => OverlayKind::Polyline,
            Geometry::Keypoints { .. } => OverlayKind::Keypoints,
            Geometry::Classification => OverlayKind::Classification,
        }
    }

    /// Media-space bounds, or `None` for classifications.
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Geometry::Box { bounds } | Geometry::Mask { bounds, .. } => Some(*bounds),
            Geometry::Polyline { points, .. } | Geometry::Keypoints { points } => Rect::bounding(points),
            Geometry::Classification => None,
        }
    }

    /// Convert relative `[0, 1]` coordinates into media pixels.
    pub fn denormalize(&self, media: Size) -> Geometry {
        let scale_rect = |r: &Rect| {
            let min = denormalize_coordinates(&r.min(), media);
            let max = denormalize_coordinates(&r.max(), media);
            Rect::from_corners(min, max)
        };
        let scale_points = |pts: &[Point]| pts.iter().map(|p| denormalize_coordinates(p, media)).collect();
        match self {
            Geometry::Box { bounds } => Geometry::Box {
                bounds: scale_rect(bounds),
            },
            Geometry::Mask { bounds, mask } => Geometry::Mask {
                bounds: scale_rect(bounds),
                mask: mask.clone(),
            },
            Geometry::Polyline {
                points,
                closed,
                filled,
            } => Geometry::Polyline {
                points: scale_points(points),
                closed: *closed,
                filled: *filled,
            },
            Geometry::Keypoints { points } => Geometry::Keypoints {
                points: scale_points(points),
            },
            Geometry::Classification => Geometry::Classification,
        }
    }

    /// Check the geometry is drawable.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Geometry::Box { bounds } => check_rect(bounds),
            Geometry::Mask { bounds, mask } => {
                check_rect(bounds)?;
                if mask.width == 0 || mask.height == 0 {
                    return Err("mask has zero size".to_string());
                }
                let expected = mask.width as usize * mask.height as usize;
                if mask.data.len() != expected {
                    return Err(format!("mask data has {} bytes, expected {}", mask.data.len(), expected));
                }
                Ok(())
            }
            Geometry::Polyline { points, closed, .. } => {
                let min = if *closed { 3 } else { 2 };
                if points.len() < min {
                    return Err(format!("polyline needs at least {} points, got {}", min, points.len()));
                }
                check_points(points)
            }
            Geometry::Keypoints { points } => {
                if points.is_empty() {
                    return Err("keypoints list is empty".to_string());
                }
                check_points(points)
            }
            Geometry::Classification => Ok(()),
        }
    }
}

fn check_rect(r: &Rect) -> Result<(), String> {
    if !r.is_finite() {
        return Err("bounds are not finite".to_string());
    }
    if r.width <= 0.0 || r.height <= 0.0 {
        return Err(format!("bounds have non-positive size {}x{}", r.width, r.height));
    }
    Ok(())
}

fn check_points(points: &[Point]) -> Result<(), String> {
    match points.iter().position(|p| !p.is_finite()) {
        Some(i) => Err(format!("point {} is not finite", i)),
        None => Ok(()),
    }
}

/// Visual state of an overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    /// Fixed color; `None` means pick from the color pool.
    pub color: Option<Color>,
    pub opacity: f64,
    pub selected: bool,
    pub hidden: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: None,
            opacity: 1.0,
            selected: false,
            hidden: false,
        }
    }
}

/// One overlay annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayRecord {
    pub id: OverlayId,
    /// Label field the overlay belongs to (e.g. `ground_truth`).
    #[serde(default)]
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl OverlayRecord {
    /// Create a record with default style and no label data.
    pub fn new(id: impl Into<OverlayId>, geometry: Geometry) -> Self {
        Self {
            id: id.into(),
            field: String::new(),
            label: None,
            confidence: None,
            index: None,
            geometry,
            style: Style::default(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn kind(&self) -> OverlayKind {
        self.geometry.kind()
    }

    /// Validate geometry and id.
    pub fn validate(&self) -> Result<(), ViewerError> {
        if self.id.is_empty() {
            return Err(ViewerError::InvalidOverlayGeometry {
                id: self.id.clone(),
                reason: "empty id".to_string(),
            });
        }
        if let Some(c) = self.confidence {
            if !c.is_finite() {
                return Err(ViewerError::InvalidOverlayGeometry {
                    id: self.id.clone(),
                    reason: "confidence is not finite".to_string(),
                });
            }
        }
        self.geometry
            .validate()
            .map_err(|reason| ViewerError::InvalidOverlayGeometry {
                id: self.id.clone(),
                reason,
            })
    }

    /// Value used for color-by-field lookups: `field`, `label`, or a
    /// metadata key rendered as text.
    pub fn color_key(&self, color_by: &str) -> String {
        match color_by {
            "field" => self.field.clone(),
            "label" => self.label.clone().unwrap_or_default(),
            "id" => self.id.clone(),
            key => match self.metadata.get(key) {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(v) => v.to_string(),
                None => self.field.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_tagged_geometry() {
        let json = r#"{
            "id": "a1",
            "field": "ground_truth",
            "label": "cat",
            "confidence": 0.9,
            "kind": "box",
            "bounds": {"x": 1.0, "y": 2.0, "width": 3.0, "height": 4.0},
            "metadata": {"iscrowd": false}
        }"#;
        let record: OverlayRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind(), OverlayKind::Box);
        assert_eq!(record.geometry.bounds(), Some(Rect::new(1.0, 2.0, 3.0, 4.0)));
        assert_eq!(record.style, Style::default());
        assert_eq!(record.metadata["iscrowd"], serde_json::json!(false));
    }

    #[test]
    fn classification_has_no_bounds() {
        let record: OverlayRecord =
            serde_json::from_str(r#"{"id": "c", "kind": "classification", "label": "dog"}"#).unwrap();
        assert_eq!(record.kind(), OverlayKind::Classification);
        assert!(record.geometry.bounds().is_none());
        assert!(record.validate().is_ok());
    }

    #[test]
    fn rejects_bad_geometry() {
        let bad_box = OverlayRecord::new("b", Geometry::Box { bounds: Rect::new(0.0, 0.0, -1.0, 5.0) });
        assert!(bad_box.validate().is_err());

        let nan = OverlayRecord::new(
            "n",
            Geometry::Keypoints {
                points: vec![Point::new(f64::NAN, 1.0)],
            },
        );
        assert!(nan.validate().is_err());

        let open_line = OverlayRecord::new(
            "l",
            Geometry::Polyline {
                points: vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)],
                closed: true,
                filled: false,
            },
        );
        assert!(open_line.validate().is_err());

        let mask = OverlayRecord::new(
            "m",
            Geometry::Mask {
                bounds: Rect::new(0.0, 0.0, 2.0, 2.0),
                mask: Mask {
                    width: 2,
                    height: 2,
                    data: vec![1, 0, 1],
                },
            },
        );
        assert!(mask.validate().is_err());
        assert!(OverlayRecord::new("", Geometry::Classification).validate().is_err());
    }

    #[test]
    fn mask_runs() {
        let mask = Mask {
            width: 4,
            height: 2,
            data: vec![1, 1, 0, 1, 0, 0, 0, 0],
        };
        let runs: Vec<_> = mask.runs().collect();
        assert_eq!(runs, vec![(0, 0, 2), (0, 3, 4)]);
        assert!(mask.get(3, 0));
        assert!(!mask.get(9, 0));
    }

    #[test]
    fn denormalize_relative_box() {
        let geometry = Geometry::Box {
            bounds: Rect::new(0.25, 0.5, 0.5, 0.25),
        };
        let abs = geometry.denormalize(Size::new(400.0, 200.0));
        assert_eq!(abs.bounds(), Some(Rect::new(100.0, 100.0, 200.0, 50.0)));
    }

    #[test]
    fn color_key_sources() {
        let mut record = OverlayRecord::new("x", Geometry::Classification)
            .with_field("predictions")
            .with_label("cat");
        record.metadata.insert("group".into(), serde_json::json!(3));
        assert_eq!(record.color_key("field"), "predictions");
        assert_eq!(record.color_key("label"), "cat");
        assert_eq!(record.color_key("group"), "3");
        assert_eq!(record.color_key("missing"), "predictions");
    }
}
