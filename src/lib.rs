// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! annoview - an interactive viewer for annotated images and videos.
//!
//! The engine renders one media item with its overlays (boxes, masks,
//! polylines, keypoints and classifications) and lets the user pan, zoom,
//! select, scrub video and inspect label data. It is toolkit independent:
//! a host supplies a [`viewer::Host`], a [`render::surface::Surface`] and,
//! for video, a [`viewer::MediaElement`].
//!
//! The public surface groups the pieces a host embeds:
//!
//! - [`Viewer`]: the root element that owns all viewer state.
//! - [`Surface`] and [`DrawCommand`]: the pixel-rendering surface.
//! - [`InputEvent`] and [`ShortcutTable`]: pointer and keyboard controls.
//! - [`JsonPanelProps`], [`HelpPanelProps`] and [`ThumbnailProps`]: the
//!   inspection panels and thumbnail selector.
//! - [`Options`]: the rendering options model.

pub mod error;
pub mod interaction;
pub mod io;
pub mod models;
pub mod overlay;
pub mod panels;
pub mod playback;
pub mod render;
pub mod util;
pub mod view;
pub mod viewer;

#[cfg(test)]
mod test_utils;

pub use error::{ErrorKind, ViewerError};
pub use interaction::input::{InputEvent, Modifiers, PointerButton};
pub use interaction::shortcuts::{ShortcutBinding, ShortcutScope, ShortcutTable};
pub use models::media::{MediaDescriptor, MediaKind, ThumbnailItem};
pub use models::options::{Modifier, Options};
pub use models::overlay::{Geometry, OverlayRecord, Style};
pub use models::selection::Panel;
pub use panels::{HelpPanelProps, JsonPanelProps, PanelIntent, ThumbnailProps};
pub use playback::{MediaCommand, MediaEvent, PlaybackState};
pub use render::surface::{DrawCommand, Stroke, Surface};
pub use util::color::Color;
pub use util::geometry::{Point, Rect, Size};
pub use view::transform::Transform;
pub use viewer::{FrameToken, Host, ListenerId, ListenerKind, MediaElement, Viewer, ViewerEvent};
