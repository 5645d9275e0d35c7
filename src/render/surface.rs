// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing surface abstraction.
//!
//! The composite pass emits viewport-space [`DrawCommand`]s; a host adapter
//! (the egui painter in the desktop binary, a recorder in tests) turns them
//! into pixels. Media pixels stay on the host side: the pass only says
//! where the current frame goes.

use crate::util::color::Color;
use crate::util::geometry::{Point, Rect, Size};

/// Line stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f64,
    pub color: Color,
}

impl Stroke {
    pub fn new(width: f64, color: Color) -> Self {
        Self { width, color }
    }
}

/// A single viewport-space drawing primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear {
        color: Color,
    },
    /// Draw the current media frame into `dest`. `time` is the video
    /// timestamp to show, `None` for still images.
    Media {
        dest: Rect,
        time: Option<f64>,
    },
    StrokeRect {
        rect: Rect,
        stroke: Stroke,
    },
    FillRect {
        rect: Rect,
        color: Color,
    },
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
    },
    Polyline {
        points: Vec<Point>,
        closed: bool,
        stroke: Stroke,
    },
    FillPolygon {
        points: Vec<Point>,
        color: Color,
    },
    Circle {
        center: Point,
        radius: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    Text {
        pos: Point,
        text: String,
        color: Color,
        background: Option<Color>,
    },
}

/// Something the composite pass can draw on.
pub trait Surface {
    /// Size of the drawable area in viewport pixels.
    fn size(&self) -> Size;

    fn draw(&mut self, command: DrawCommand);
}
