// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Per-geometry hit testing in viewport space.
//!
//! Geometry is mapped through the transform first so tolerances are in
//! screen pixels regardless of zoom.

use crate::models::overlay::Geometry;
use crate::util::geometry::{distance_to_segment, polygon_contains, Point, Rect};
use crate::view::transform::Transform;

/// Tolerances for thin shapes, in viewport pixels.
#[derive(Debug, Clone, Copy)]
pub struct HitTolerance {
    pub line: f64,
    pub keypoint_radius: f64,
}

/// Does the viewport point `p` fall on `geometry`?
pub fn geometry_contains(geometry: &Geometry, transform: &Transform, p: Point, tol: HitTolerance) -> bool {
    match geometry {
        Geometry::Box { bounds } => transform.rect_to_viewport(bounds).contains(p),
        Geometry::Mask { bounds, mask } => {
            if !transform.rect_to_viewport(bounds).contains(p) {
                return false;
            }
            let m = transform.to_media(p);
            let col = ((m.x - bounds.x) / bounds.width * f64::from(mask.width)).floor();
            let row = ((m.y - bounds.y) / bounds.height * f64::from(mask.height)).floor();
            let col = col.clamp(0.0, f64::from(mask.width.saturating_sub(1))) as u32;
            let row = row.clamp(0.0, f64::from(mask.height.saturating_sub(1))) as u32;
            mask.get(col, row)
        }
        Geometry::Polyline {
            points,
            closed,
            filled,
        } => {
            let pts: Vec<Point> = points.iter().map(|q| transform.to_viewport(*q)).collect();
            if (*closed || *filled) && polygon_contains(&pts, p) {
                return true;
            }
            let near = |a: &Point, b: &Point| distance_to_segment(p, *a, *b) <= tol.line;
            if pts.windows(2).any(|w| near(&w[0], &w[1])) {
                return true;
            }
            *closed && pts.len() > 2 && near(&pts[pts.len() - 1], &pts[0])
        }
        Geometry::Keypoints { points } => points
            .iter()
            .any(|q| transform.to_viewport(*q).distance(p) <= tol.keypoint_radius + tol.line),
        Geometry::Classification => false,
    }
}

/// Viewport-space bounds of `geometry`, if it has a spatial extent.
pub fn viewport_bounds(geometry: &Geometry, transform: &Transform) -> Option<Rect> {
    geometry.bounds().map(|b| transform.rect_to_viewport(&b))
}
