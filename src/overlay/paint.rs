// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Painting a single overlay onto a surface.

use crate::models::options::Options;
use crate::models::overlay::{Geometry, OverlayRecord};
use crate::render::surface::{DrawCommand, Stroke, Surface};
use crate::util::color::{color_for_key, Color};
use crate::util::geometry::{Point, Rect};
use crate::view::transform::Transform;

/// Vertical spacing of stacked classification captions.
const CAPTION_LINE_HEIGHT: f64 = 18.0;
const CAPTION_MARGIN: f64 = 8.0;

/// Base color of a record before opacity is applied.
pub fn base_color(record: &OverlayRecord, options: &Options) -> Color {
    record
        .style
        .color
        .unwrap_or_else(|| color_for_key(&options.color_pool, &record.color_key(&options.color_by_field)))
}

/// Caption text according to the label options, or `None` if empty.
pub fn caption(record: &OverlayRecord, options: &Options) -> Option<String> {
    let mut parts = Vec::new();
    if options.show_index {
        if let Some(index) = record.index {
            parts.push(format!("#{}", index));
        }
    }
    if options.show_label {
        if let Some(label) = &record.label {
            parts.push(label.clone());
        }
    }
    if options.show_confidence {
        if let Some(confidence) = record.confidence {
            parts.push(format!("{:.2}", confidence));
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// Draw one overlay. `slot` is the caption row used by classifications.
pub fn paint_overlay(
    surface: &mut dyn Surface,
    record: &OverlayRecord,
    transform: &Transform,
    options: &Options,
    hovered: bool,
    slot: usize,
) {
    let color = base_color(record, options).with_opacity(options.alpha * record.style.opacity);
    let width = if record.style.selected {
        options.stroke_width * 2.0
    } else if hovered {
        options.stroke_width * 1.5
    } else {
        options.stroke_width
    };
    let stroke = Stroke::new(width, color);

    match &record.geometry {
        Geometry::Box { bounds } => {
            let rect = transform.rect_to_viewport(bounds);
            if record.style.selected || hovered {
                surface.draw(DrawCommand::FillRect {
                    rect,
                    color: color.with_opacity(0.2),
                });
            }
            surface.draw(DrawCommand::StrokeRect { rect, stroke });
            if record.style.selected {
                surface.draw(DrawCommand::StrokeRect {
                    rect,
                    stroke: Stroke::new(1.0, Color::WHITE),
                });
            }
        }
        Geometry::Mask { bounds, mask } => {
            let cell_w = bounds.width / f64::from(mask.width);
            let cell_h = bounds.height / f64::from(mask.height);
            let fill = color.with_opacity(if record.style.selected || hovered { 0.8 } else { 0.6 });
            for (row, start, end) in mask.runs() {
                let run = Rect::new(
                    bounds.x + f64::from(start) * cell_w,
                    bounds.y + f64::from(row) * cell_h,
                    f64::from(end - start) * cell_w,
                    cell_h,
                );
                surface.draw(DrawCommand::FillRect {
                    rect: transform.rect_to_viewport(&run),
                    color: fill,
                });
            }
            if record.style.selected {
                surface.draw(DrawCommand::StrokeRect {
                    rect: transform.rect_to_viewport(bounds),
                    stroke,
                });
            }
        }
        Geometry::Polyline {
            points,
            closed,
            filled,
        } => {
            let pts: Vec<Point> = points.iter().map(|p| transform.to_viewport(*p)).collect();
            if *filled {
                surface.draw(DrawCommand::FillPolygon {
                    points: pts.clone(),
                    color: color.with_opacity(0.4),
                });
            }
            surface.draw(DrawCommand::Polyline {
                points: pts,
                closed: *closed,
                stroke,
            });
        }
        Geometry::Keypoints { points } => {
            let radius = if record.style.selected || hovered {
                options.keypoint_radius * 1.5
            } else {
                options.keypoint_radius
            };
            let outline = record.style.selected.then(|| Stroke::new(1.0, Color::WHITE));
            for p in points {
                surface.draw(DrawCommand::Circle {
                    center: transform.to_viewport(*p),
                    radius,
                    fill: Some(color),
                    stroke: outline,
                });
            }
        }
        Geometry::Classification => {}
    }

    let Some(text) = caption(record, options) else {
        return;
    };
    let pos = match record.geometry.bounds() {
        Some(bounds) => transform.rect_to_viewport(&bounds).min(),
        None => Point::new(CAPTION_MARGIN, CAPTION_MARGIN + slot as f64 * CAPTION_LINE_HEIGHT),
    };
    surface.draw(DrawCommand::Text {
        pos,
        text,
        color: Color::WHITE,
        background: Some(base_color(record, options).with_opacity(0.8)),
    });
}
