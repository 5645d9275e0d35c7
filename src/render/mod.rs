// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Render loop: frame scheduling and the composite pass.
//!
//! At most one animation frame is requested at a time. Invalidations that
//! arrive while a frame is pending are folded into it. The pass itself
//! only reads a [`RenderSnapshot`]; all mutation happens in event handlers.

pub mod surface;

use crate::interaction::TransientUi;
use crate::models::options::Options;
use crate::overlay::OverlaySet;
use crate::util::color::Color;
use crate::util::geometry::Point;
use crate::view::transform::Transform;
use crate::viewer::{FrameToken, Host};

use surface::{DrawCommand, Stroke, Surface};

pub const BACKGROUND: Color = Color::rgb(17, 17, 17);
const SELECTION_RECT_COLOR: Color = Color::rgb(255, 109, 4);
const CROSSHAIR_COLOR: Color = Color::rgba(255, 255, 255, 160);

/// Tracks the single in-flight animation frame.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    pending: Option<FrameToken>,
    passes: u64,
    coalesced: u64,
}

impl FrameScheduler {
    pub fn pending(&self) -> Option<FrameToken> {
        self.pending
    }

    /// Completed composite passes.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Invalidations folded into an already pending frame.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }

    /// Ask for a frame unless one is already pending.
    pub fn invalidate(&mut self, host: &mut dyn Host) {
        if self.pending.is_some() {
            self.coalesced += 1;
            return;
        }
        self.pending = Some(host.request_animation_frame());
    }

    /// Called when the host fires a frame. Returns false for a frame that
    /// was cancelled or never requested.
    pub fn begin_pass(&mut self, token: FrameToken) -> bool {
        if self.pending != Some(token) {
            log::trace!("Dropping stale frame {:?}", token);
            return false;
        }
        self.pending = None;
        self.passes += 1;
        true
    }

    pub fn cancel(&mut self, host: &mut dyn Host) {
        if let Some(token) = self.pending.take() {
            host.cancel_animation_frame(token);
        }
    }
}

/// Read-only view of everything a composite pass draws.
#[derive(Clone, Copy)]
pub struct RenderSnapshot<'a> {
    pub transform: &'a Transform,
    pub overlays: &'a OverlaySet,
    pub options: &'a Options,
    pub hovered: Option<&'a str>,
    /// `None` when there is no media; `Some(None)` for a still image,
    /// `Some(Some(t))` for a video frame at `t` seconds.
    pub media: Option<Option<f64>>,
    pub transient: TransientUi,
}

/// Clear, draw the media frame, the overlays, then transient UI.
pub fn composite(surface: &mut dyn Surface, snapshot: &RenderSnapshot<'_>) {
    surface.draw(DrawCommand::Clear { color: BACKGROUND });

    let Some(time) = snapshot.media else {
        return;
    };
    surface.draw(DrawCommand::Media {
        dest: snapshot.transform.media_rect(),
        time,
    });

    snapshot
        .overlays
        .draw(surface, snapshot.transform, snapshot.options, snapshot.hovered);

    if let Some(rect) = snapshot.transient.selection_rect {
        surface.draw(DrawCommand::FillRect {
            rect,
            color: SELECTION_RECT_COLOR.with_opacity(0.15),
        });
        surface.draw(DrawCommand::StrokeRect {
            rect,
            stroke: Stroke::new(1.0, SELECTION_RECT_COLOR),
        });
    }

    if let Some(p) = snapshot.transient.crosshair {
        let size = surface.size();
        let stroke = Stroke::new(1.0, CROSSHAIR_COLOR);
        surface.draw(DrawCommand::Line {
            from: Point::new(0.0, p.y),
            to: Point::new(size.width, p.y),
            stroke,
        });
        surface.draw(DrawCommand::Line {
            from: Point::new(p.x, 0.0),
            to: Point::new(p.x, size.height),
            stroke,
        });
    }
}
