// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media-space ↔ viewport-space transform.
//!
//! A viewport point is `media * scale + pan`. The transform also remembers
//! the viewport and media sizes so it can re-clamp itself after every
//! mutation: scale stays within `[min_scale, max_scale]` and the media box
//! may not move further past the viewport edges than `elastic_slack` pixels.

use crate::util::geometry::{Point, Rect, Size};

pub const DEFAULT_MIN_SCALE: f64 = 0.01;
pub const DEFAULT_MAX_SCALE: f64 = 64.0;
pub const DEFAULT_ELASTIC_SLACK: f64 = 64.0;

/// Clamping configuration for a transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformLimits {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Viewport pixels the media box may overshoot the viewport edges by.
    pub elastic_slack: f64,
}

impl Default for TransformLimits {
    fn default() -> Self {
        Self {
            min_scale: DEFAULT_MIN_SCALE,
            max_scale: DEFAULT_MAX_SCALE,
            elastic_slack: DEFAULT_ELASTIC_SLACK,
        }
    }
}

/// Zoom and pan state for one media item in one viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    scale: f64,
    pan_x: f64,
    pan_y: f64,
    viewport: Size,
    media: Size,
    limits: TransformLimits,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Size::default(), Size::default(), TransformLimits::default())
    }
}

impl TransformLimits {
    /// Limits safe to clamp with: positive finite scales with
    /// `max_scale >= min_scale` and a finite, non-negative slack.
    pub fn sanitized(self) -> Self {
        let positive = |v: f64, fallback: f64| if v.is_finite() && v > 0.0 { v } else { fallback };
        let min_scale = positive(self.min_scale, DEFAULT_MIN_SCALE);
        let max_scale = positive(self.max_scale, DEFAULT_MAX_SCALE).max(min_scale);
        let elastic_slack = if self.elastic_slack.is_finite() {
            self.elastic_slack.max(0.0)
        } else {
            DEFAULT_ELASTIC_SLACK
        };
        if (min_scale, max_scale, elastic_slack) != (self.min_scale, self.max_scale, self.elastic_slack) {
            log::warn!("Repaired transform limits {:?}", self);
        }
        Self {
            min_scale,
            max_scale,
            elastic_slack,
        }
    }
}

impl Transform {
    /// Create a transform fitted to the viewport.
    pub fn new(viewport: Size, media: Size, limits: TransformLimits) -> Self {
        let mut transform = Self {
            scale: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            viewport,
            media,
            limits: limits.sanitized(),
        };
        transform.reset();
        transform
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn pan(&self) -> Point {
        Point::new(self.pan_x, self.pan_y)
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn media(&self) -> Size {
        self.media
    }

    pub fn limits(&self) -> TransformLimits {
        self.limits
    }

    /// Map a media-space point to viewport space.
    pub fn to_viewport(&self, p: Point) -> Point {
        Point::new(p.x * self.scale + self.pan_x, p.y * self.scale + self.pan_y)
    }

    /// Map a viewport-space point to media space.
    pub fn to_media(&self, p: Point) -> Point {
        Point::new((p.x - self.pan_x) / self.scale, (p.y - self.pan_y) / self.scale)
    }

    pub fn rect_to_viewport(&self, r: &Rect) -> Rect {
        Rect::from_corners(self.to_viewport(r.min()), self.to_viewport(r.max()))
    }

    /// The media bounds in viewport space.
    pub fn media_rect(&self) -> Rect {
        self.rect_to_viewport(&Rect::new(0.0, 0.0, self.media.width, self.media.height))
    }

    /// The scale that fits the whole media in the viewport, before clamping.
    pub fn fit_scale(&self) -> f64 {
        if !self.media.is_positive() || !self.viewport.is_positive() {
            return 1.0;
        }
        (self.viewport.width / self.media.width).min(self.viewport.height / self.media.height)
    }

    /// Scale about `anchor` so that it maps to the same media point afterwards.
    ///
    /// The pan clamp still applies, so the anchor is only exact while the
    /// zoomed media stays within the allowed bounds.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let media_point = self.to_media(anchor);
        self.scale = self.clamp_scale(self.scale * factor);
        self.pan_x = anchor.x - media_point.x * self.scale;
        self.pan_y = anchor.y - media_point.y * self.scale;
        self.clamp_pan();
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
        self.clamp_pan();
    }

    /// Fit the media to the viewport preserving aspect ratio, centered.
    pub fn reset(&mut self) {
        self.scale = self.clamp_scale(self.fit_scale());
        self.center_on(Point::new(self.media.width / 2.0, self.media.height / 2.0));
    }

    /// Fit a media-space region in the viewport with `pad` (fraction of the
    /// region size) added on every side.
    pub fn fit_rect(&mut self, region: &Rect, pad: f64) {
        if !self.viewport.is_positive() {
            return;
        }
        let pad = pad.max(0.0);
        let width = (region.width * (1.0 + 2.0 * pad)).max(f64::EPSILON);
        let height = (region.height * (1.0 + 2.0 * pad)).max(f64::EPSILON);
        let scale = (self.viewport.width / width).min(self.viewport.height / height);
        self.scale = self.clamp_scale(scale);
        self.center_on(region.center());
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
        self.clamp();
    }

    pub fn set_limits(&mut self, limits: TransformLimits) {
        self.limits = limits.sanitized();
        self.clamp();
    }

    /// Re-apply both clamps. Idempotent.
    pub fn clamp(&mut self) {
        self.scale = self.clamp_scale(self.scale);
        self.clamp_pan();
    }

    fn center_on(&mut self, media_point: Point) {
        self.pan_x = self.viewport.width / 2.0 - media_point.x * self.scale;
        self.pan_y = self.viewport.height / 2.0 - media_point.y * self.scale;
        self.clamp_pan();
    }

    fn clamp_scale(&self, scale: f64) -> f64 {
        let TransformLimits {
            min_scale,
            max_scale,
            ..
        } = self.limits;
        if !scale.is_finite() {
            return min_scale;
        }
        scale.clamp(min_scale, max_scale)
    }

    fn clamp_pan(&mut self) {
        let slack = self.limits.elastic_slack.max(0.0);
        self.pan_x = clamp_axis(self.pan_x, self.viewport.width, self.media.width * self.scale, slack);
        self.pan_y = clamp_axis(self.pan_y, self.viewport.height, self.media.height * self.scale, slack);
    }
}

// Content smaller than the viewport stays inside it; larger content keeps
// covering it. Either way the edges may overshoot by `slack`.
fn clamp_axis(pan: f64, viewport: f64, content: f64, slack: f64) -> f64 {
    let free = viewport - content;
    let lo = free.min(0.0) - slack;
    let hi = free.max(0.0) + slack;
    if pan.is_finite() {
        pan.clamp(lo, hi)
    } else {
        free / 2.0
    }
}
