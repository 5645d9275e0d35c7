// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Test helpers: float assertions, a recording surface, and mock host and
//! media element implementations so the viewer can run headless.

pub use approx::assert_abs_diff_eq;

use std::cell::RefCell;
use std::rc::Rc;

use crate::models::media::MediaDescriptor;
use crate::models::overlay::{Geometry, OverlayRecord};
use crate::render::surface::{DrawCommand, Surface};
use crate::util::color::Color;
use crate::util::geometry::{Point, Rect, Size};
use crate::viewer::{FrameToken, Host, ListenerId, ListenerKind, MediaCommand, MediaElement};

/// Epsilon for f64 values that should be exactly equal.
pub const F64_EPSILON: f64 = 1e-9;

/// Surface that records every draw call.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub size: Size,
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            size: Size::new(width, height),
            commands: Vec::new(),
        }
    }

    /// Labels drawn as captions, in draw order.
    pub fn texts(&self) -> Vec<String> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn draw(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}

/// Observable state of a [`MockHost`], shared with the test body.
#[derive(Debug, Default)]
pub struct HostLog {
    pub next_token: u64,
    pub requested: Vec<FrameToken>,
    pub cancelled: Vec<FrameToken>,
    pub listeners: Vec<(ListenerId, ListenerKind)>,
}

pub struct MockHost {
    pub size: Size,
    pub log: Rc<RefCell<HostLog>>,
}

impl MockHost {
    pub fn new(width: f64, height: f64) -> (Self, Rc<RefCell<HostLog>>) {
        let log = Rc::new(RefCell::new(HostLog::default()));
        (
            Self {
                size: Size::new(width, height),
                log: Rc::clone(&log),
            },
            log,
        )
    }
}

impl Host for MockHost {
    fn container_size(&self) -> Size {
        self.size
    }

    fn request_animation_frame(&mut self) -> FrameToken {
        let mut log = self.log.borrow_mut();
        log.next_token += 1;
        let token = FrameToken(log.next_token);
        log.requested.push(token);
        token
    }

    fn cancel_animation_frame(&mut self, token: FrameToken) {
        self.log.borrow_mut().cancelled.push(token);
    }

    fn listen(&mut self, kind: ListenerKind) -> ListenerId {
        let mut log = self.log.borrow_mut();
        let id = ListenerId(log.listeners.len() as u64 + 1);
        log.listeners.push((id, kind));
        id
    }

    fn unlisten(&mut self, id: ListenerId) {
        self.log.borrow_mut().listeners.retain(|(l, _)| *l != id);
    }
}

/// Media element that records the commands it receives.
#[derive(Default)]
pub struct MockMedia {
    pub commands: Rc<RefCell<Vec<MediaCommand>>>,
}

impl MockMedia {
    pub fn new() -> (Self, Rc<RefCell<Vec<MediaCommand>>>) {
        let commands = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                commands: Rc::clone(&commands),
            },
            commands,
        )
    }
}

impl MediaElement for MockMedia {
    fn execute(&mut self, command: MediaCommand) {
        self.commands.borrow_mut().push(command);
    }
}

pub fn image(width: f64, height: f64) -> MediaDescriptor {
    MediaDescriptor::image("test.png", Size::new(width, height))
}

pub fn video(width: f64, height: f64) -> MediaDescriptor {
    MediaDescriptor::video("test.mp4", Size::new(width, height), None)
}

pub fn bbox(id: &str, x: f64, y: f64, w: f64, h: f64) -> OverlayRecord {
    OverlayRecord::new(id, Geometry::Box { bounds: Rect::new(x, y, w, h) })
}

pub fn keypoints(id: &str, points: &[(f64, f64)]) -> OverlayRecord {
    OverlayRecord::new(
        id,
        Geometry::Keypoints {
            points: points.iter().map(|(x, y)| Point::new(*x, *y)).collect(),
        },
    )
}

pub fn is_color(command: &DrawCommand, color: Color) -> bool {
    match command {
        DrawCommand::StrokeRect { stroke, .. } => stroke.color == color,
        DrawCommand::FillRect { color: c, .. } => *c == color,
        _ => false,
    }
}
