// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The root coordinator.
//!
//! [`Viewer`] owns the transform, overlay set, selection, panel visibility,
//! options and playback state. Every mutation happens inside one of its
//! event entry points (`handle_input`, `on_media_event`, `update_options`,
//! ...). Drawing only happens in `on_animation_frame`, which reads a
//! snapshot and never mutates engine state apart from flushing coalesced
//! input first.
//!
//! The host (a window, a browser element, a test) is reached through the
//! [`Host`] and [`MediaElement`] traits. Collaborators observe the viewer by
//! draining [`ViewerEvent`]s.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{ErrorKind, ViewerError};
use crate::interaction::input::InputEvent;
use crate::interaction::shortcuts::{actions, ShortcutTable};
use crate::interaction::{InteractionContext, InteractionController, Intent};
use crate::models::media::{MediaDescriptor, ThumbnailItem};
use crate::models::options::Options;
use crate::models::overlay::{OverlayId, OverlayRecord};
use crate::models::selection::{Panel, PanelVisibility, SelectionState};
use crate::overlay::OverlaySet;
use crate::panels::{HelpPanelProps, JsonPanelProps, PanelIntent, ThumbnailProps};
use crate::playback::{PlaybackController, PlaybackEffect, PlaybackState};
use crate::render::surface::Surface;
use crate::render::{composite, FrameScheduler, RenderSnapshot};
use crate::util::geometry::{Point, Size};
use crate::view::transform::Transform;

pub use crate::playback::{MediaCommand, MediaEvent};

/// Zoom factor for the zoom-in and zoom-out actions.
const ZOOM_STEP: f64 = 1.25;

/// Handle for a requested animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

/// Handle for a registered host listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    Pointer,
    Wheel,
    Keyboard,
    Resize,
}

/// The container the viewer is attached to.
pub trait Host {
    fn container_size(&self) -> Size;
    /// Schedule a call to [`Viewer::on_animation_frame`] with the returned token.
    fn request_animation_frame(&mut self) -> FrameToken;
    fn cancel_animation_frame(&mut self, token: FrameToken);
    /// Start routing events of `kind` to the viewer.
    fn listen(&mut self, kind: ListenerKind) -> ListenerId;
    fn unlisten(&mut self, id: ListenerId);
}

/// The host-side element that decodes and plays time-based media.
pub trait MediaElement {
    fn execute(&mut self, command: MediaCommand);
}

/// Events for collaborators, serialized as `{"type": "...", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ViewerEvent {
    SelectionChanged {
        #[serde(rename = "selectedIds")]
        selected_ids: Vec<OverlayId>,
    },
    HoverChanged {
        #[serde(rename = "hoveredId")]
        hovered_id: Option<OverlayId>,
    },
    PlaybackStateChanged {
        state: PlaybackState,
        #[serde(rename = "currentTime")]
        current_time: f64,
        duration: Option<f64>,
    },
    PanelToggled {
        panel: Panel,
        visible: bool,
    },
    FullscreenChanged {
        fullscreen: bool,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
    Warning {
        kind: ErrorKind,
        message: String,
    },
    /// A shortcut fired whose action the viewer does not handle itself.
    Shortcut {
        action: String,
    },
    ItemSelected {
        id: String,
    },
}

pub struct Viewer {
    host: Option<Box<dyn Host>>,
    listeners: Vec<ListenerId>,
    element: Option<Box<dyn MediaElement>>,
    media: Option<MediaDescriptor>,
    transform: Transform,
    /// True while the transform is the untouched fit-to-viewport one.
    fitted: bool,
    overlays: OverlaySet,
    selection: SelectionState,
    panels: PanelVisibility,
    fullscreen: bool,
    options: Options,
    interaction: InteractionController,
    playback: PlaybackController,
    scheduler: FrameScheduler,
    pending_move: Option<InputEvent>,
    in_frame: bool,
    thumbnails: Vec<ThumbnailItem>,
    current_item: Option<String>,
    events: Vec<ViewerEvent>,
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl Viewer {
    pub fn new(options: Options) -> Self {
        let mut playback = PlaybackController::new();
        playback.configure(options.loop_playback, options.autoplay, options.frame_rate);
        Self {
            host: None,
            listeners: Vec::new(),
            element: None,
            media: None,
            transform: Transform::new(Size::default(), Size::default(), options.transform_limits()),
            fitted: true,
            overlays: OverlaySet::new(),
            selection: SelectionState::default(),
            panels: PanelVisibility::default(),
            fullscreen: false,
            interaction: InteractionController::new(ShortcutTable::default_table()),
            playback,
            options,
            scheduler: FrameScheduler::default(),
            pending_move: None,
            in_frame: false,
            thumbnails: Vec::new(),
            current_item: None,
            events: Vec::new(),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.host.is_some()
    }

    pub fn media(&self) -> Option<&MediaDescriptor> {
        self.media.as_ref()
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn overlays(&self) -> &OverlaySet {
        &self.overlays
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn panels(&self) -> PanelVisibility {
        self.panels
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn shortcuts(&self) -> &ShortcutTable {
        self.interaction.shortcuts()
    }

    pub fn set_shortcuts(&mut self, table: ShortcutTable) {
        *self.interaction.shortcuts_mut() = table;
    }

    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.scheduler.pending()
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    /// Take every event emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<ViewerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Attach to a container. Re-attaching detaches from the previous one.
    pub fn attach(&mut self, host: Box<dyn Host>) {
        self.detach();
        let mut host = host;
        self.listeners = [
            ListenerKind::Pointer,
            ListenerKind::Wheel,
            ListenerKind::Keyboard,
            ListenerKind::Resize,
        ]
        .into_iter()
        .map(|kind| host.listen(kind))
        .collect();
        let size = host.container_size();
        self.host = Some(host);
        log::info!("Viewer attached ({}x{})", size.width, size.height);
        self.resize(size.width, size.height);
        self.invalidate();
    }

    fn detach(&mut self) {
        self.interaction.cancel();
        self.pending_move = None;
        if let Some(host) = self.host.as_deref_mut() {
            self.scheduler.cancel(host);
            for id in self.listeners.drain(..) {
                host.unlisten(id);
            }
        }
        self.host = None;
    }

    /// Tear everything down. Safe to call mid-gesture and more than once.
    pub fn destroy(&mut self) {
        let attached = self.host.is_some();
        self.detach();
        let effect = self.playback.unload();
        if let Some(element) = self.element.as_deref_mut() {
            for command in effect.commands {
                element.execute(command);
            }
        }
        self.element = None;
        if attached {
            log::info!("Viewer destroyed");
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        if !(width.is_finite() && height.is_finite()) || width < 0.0 || height < 0.0 {
            log::warn!("Ignoring resize to {}x{}", width, height);
            return;
        }
        let size = Size::new(width, height);
        if size == self.transform.viewport() {
            return;
        }
        self.transform.set_viewport(size);
        if self.options.fit_to_viewport && self.fitted {
            self.transform.reset();
        }
        self.invalidate();
    }

    /// Merge a partial options object. A `shortcuts` map of
    /// `{"keys": "action"}` rebinds keys; an empty action unbinds.
    pub fn update_options(&mut self, patch: &Value) {
        let mut update = self.options.merge(patch);
        for warning in update.warnings.drain(..) {
            self.warn(warning);
        }

        if let Some(map) = patch.get("shortcuts").and_then(Value::as_object) {
            let bindings: BTreeMap<String, String> = map
                .iter()
                .filter_map(|(keys, action)| match action.as_str() {
                    Some(a) => Some((keys.clone(), a.to_string())),
                    None => {
                        log::warn!("Ignoring shortcut {:?}: action is not a string", keys);
                        None
                    }
                })
                .collect();
            self.interaction.shortcuts_mut().apply_map(&bindings);
        }

        if ["minScale", "maxScale", "elasticSlack"].iter().any(|k| update.touched(k)) {
            self.transform.set_limits(self.options.transform_limits());
        }
        self.playback
            .configure(self.options.loop_playback, self.options.autoplay, self.options.frame_rate);
        if update.touched("fitToViewport") && self.options.fit_to_viewport {
            self.transform.reset();
            self.fitted = true;
        }
        if !update.applied.is_empty() {
            log::debug!("Options updated: {}", update.applied.join(", "));
        }
        self.invalidate();
    }

    /// Swap in a new media item and its overlays.
    ///
    /// Cancels any gesture, coalesced input and pending frame, clears the
    /// selection and restarts playback. Invalid overlays are dropped one by
    /// one with a warning.
    pub fn load_media(
        &mut self,
        descriptor: MediaDescriptor,
        overlays: Vec<OverlayRecord>,
        element: Option<Box<dyn MediaElement>>,
    ) {
        self.interaction.cancel();
        self.pending_move = None;
        if let Some(host) = self.host.as_deref_mut() {
            self.scheduler.cancel(host);
        }

        let had_selection = !self.selection.selected().is_empty();
        let had_hover = self.selection.hovered().is_some();
        self.selection.reset();
        if had_selection {
            self.emit_selection();
        }
        if had_hover {
            self.events.push(ViewerEvent::HoverChanged { hovered_id: None });
        }

        let released = self.playback.unload();
        self.apply_playback(released);
        self.element = element;

        if !descriptor.size().is_positive() {
            let error = ViewerError::MediaLoad {
                source_ref: descriptor.source.clone(),
                message: format!("invalid media size {}x{}", descriptor.width, descriptor.height),
            };
            self.report(error);
            self.media = None;
            self.overlays.clear();
            self.invalidate();
            return;
        }

        let outcome = self.overlays.replace(overlays, &mut self.selection);
        for dropped in outcome.dropped {
            self.warn(dropped);
        }

        self.transform = Transform::new(
            self.transform.viewport(),
            descriptor.size(),
            self.options.transform_limits(),
        );
        self.fitted = true;

        log::info!(
            "Loaded {} ({}x{}, {} overlays)",
            descriptor.source,
            descriptor.width,
            descriptor.height,
            self.overlays.len()
        );
        if descriptor.is_video() {
            if self.element.is_none() {
                log::warn!("Video {} has no media element", descriptor.source);
            }
            let effect = self.playback.load(&descriptor.source, descriptor.duration);
            self.media = Some(descriptor);
            self.apply_playback(effect);
        } else {
            self.media = Some(descriptor);
        }
        self.invalidate();
    }

    /// Route one host input event.
    ///
    /// Pointer moves are coalesced: only the latest one is processed, at the
    /// next animation frame or before the next non-move event. While the
    /// help overlay is open it swallows pointer input.
    pub fn handle_input(&mut self, event: InputEvent) {
        if event.is_pointer() {
            if self.media.is_none() || self.panels.help {
                return;
            }
            if let InputEvent::PointerMove { pointer_id, .. } = event {
                if self.interaction.gesture().pointer_id().is_some_and(|active| active != pointer_id) {
                    log::trace!("{}", ViewerError::GestureConflict { pointer_id });
                    return;
                }
                // The slot holds one pointer; another pointer's move goes first.
                if matches!(self.pending_move, Some(InputEvent::PointerMove { pointer_id: p, .. }) if p != pointer_id) {
                    self.flush_pointer_move();
                }
                self.pending_move = Some(event);
                self.invalidate();
                return;
            }
        }
        self.flush_pointer_move();
        let wheel = matches!(event, InputEvent::Wheel { .. });
        let intents = self.dispatch(&event);
        self.apply_intents(intents);
        if wheel {
            self.invalidate();
        }
    }

    fn dispatch(&mut self, event: &InputEvent) -> Vec<Intent> {
        let mut ctx = InteractionContext {
            transform: &mut self.transform,
            overlays: &self.overlays,
            selection: &mut self.selection,
            options: &self.options,
        };
        self.interaction.handle(event, &mut ctx)
    }

    fn flush_pointer_move(&mut self) {
        if let Some(event) = self.pending_move.take() {
            let intents = self.dispatch(&event);
            self.apply_intents(intents);
        }
    }

    fn flush_wheel(&mut self) {
        let mut ctx = InteractionContext {
            transform: &mut self.transform,
            overlays: &self.overlays,
            selection: &mut self.selection,
            options: &self.options,
        };
        let intents = self.interaction.flush_wheel(&mut ctx);
        self.apply_intents(intents);
    }

    fn apply_intents(&mut self, intents: Vec<Intent>) {
        for intent in intents {
            match intent {
                Intent::HoverChanged(hovered_id) => {
                    self.events.push(ViewerEvent::HoverChanged { hovered_id });
                    self.invalidate();
                }
                Intent::SelectionChanged => {
                    self.overlays.apply_selection(&self.selection);
                    self.emit_selection();
                    self.invalidate();
                }
                Intent::TransformChanged => {
                    self.fitted = false;
                    self.invalidate();
                }
                Intent::Redraw => self.invalidate(),
                Intent::Action(action) => self.perform(&action),
            }
        }
    }

    /// Run a named action, as if its shortcut had fired. Actions the viewer
    /// does not know are forwarded as [`ViewerEvent::Shortcut`].
    pub fn perform(&mut self, action: &str) {
        log::debug!("Action {}", action);
        match action {
            actions::TOGGLE_HELP => self.toggle_panel(Panel::Help),
            actions::TOGGLE_JSON => self.toggle_panel(Panel::Json),
            actions::TOGGLE_THUMBNAILS => self.toggle_panel(Panel::Thumbnails),
            actions::TOGGLE_FULLSCREEN => self.set_fullscreen(!self.fullscreen),
            actions::CLOSE_PANELS => {
                if self.panels.any() {
                    for panel in [Panel::Help, Panel::Json, Panel::Thumbnails] {
                        self.set_panel(panel, false);
                    }
                } else {
                    self.clear_selection();
                }
            }
            actions::PLAY_PAUSE => self.toggle_playback(),
            actions::SEEK_FORWARD => self.seek_by(self.options.seek_step),
            actions::SEEK_BACK => self.seek_by(-self.options.seek_step),
            actions::STEP_FORWARD => self.step(1),
            actions::STEP_BACK => self.step(-1),
            actions::ZOOM_IN => self.zoom_centered(ZOOM_STEP),
            actions::ZOOM_OUT => self.zoom_centered(1.0 / ZOOM_STEP),
            actions::RESET_ZOOM => self.reset_zoom(),
            actions::ZOOM_TO_SELECTION => self.zoom_to_selection(),
            actions::CLEAR_SELECTION => self.clear_selection(),
            actions::TOGGLE_LABELS => {
                self.options.show_label = !self.options.show_label;
                self.invalidate();
            }
            other => self.events.push(ViewerEvent::Shortcut {
                action: other.to_string(),
            }),
        }
    }

    fn zoom_centered(&mut self, factor: f64) {
        if self.media.is_none() {
            return;
        }
        let viewport = self.transform.viewport();
        self.transform
            .zoom_at(Point::new(viewport.width / 2.0, viewport.height / 2.0), factor);
        self.fitted = false;
        self.invalidate();
    }

    pub fn zoom_in(&mut self) {
        self.zoom_centered(ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_centered(1.0 / ZOOM_STEP);
    }

    pub fn reset_zoom(&mut self) {
        self.transform.reset();
        self.fitted = true;
        self.invalidate();
    }

    /// Fit the union of the selected overlays' bounds, padded by `zoomPad`.
    pub fn zoom_to_selection(&mut self) {
        let Some(bounds) = self.overlays.bounds_of(self.selection.selected()) else {
            return;
        };
        self.transform.fit_rect(&bounds, self.options.zoom_pad);
        self.fitted = false;
        self.invalidate();
    }

    /// Replace the selection programmatically. Unknown ids are skipped.
    pub fn select(&mut self, ids: Vec<OverlayId>) {
        let ids = ids.into_iter().filter(|id| self.overlays.contains(id)).collect();
        if self.selection.set(ids) {
            self.apply_intents(vec![Intent::SelectionChanged]);
        }
    }

    pub fn clear_selection(&mut self) {
        if self.selection.clear() {
            self.apply_intents(vec![Intent::SelectionChanged]);
        }
    }

    /// Hide or show one overlay.
    pub fn set_overlay_hidden(&mut self, id: &str, hidden: bool) {
        if self.overlays.set_hidden(id, hidden) {
            self.invalidate();
        }
    }

    fn emit_selection(&mut self) {
        self.events.push(ViewerEvent::SelectionChanged {
            selected_ids: self.selection.selected().to_vec(),
        });
    }

    pub fn set_panel(&mut self, panel: Panel, visible: bool) {
        if !self.panels.set(panel, visible) {
            return;
        }
        if panel == Panel::Help && visible {
            self.interaction.cancel();
            self.pending_move = None;
        }
        log::debug!("Panel {:?} visible={}", panel, visible);
        self.events.push(ViewerEvent::PanelToggled { panel, visible });
        self.invalidate();
    }

    pub fn toggle_panel(&mut self, panel: Panel) {
        self.set_panel(panel, !self.panels.get(panel));
    }

    /// Entering fullscreen closes the JSON and thumbnail panels.
    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        if self.fullscreen == fullscreen {
            return;
        }
        self.fullscreen = fullscreen;
        if fullscreen {
            self.set_panel(Panel::Json, false);
            self.set_panel(Panel::Thumbnails, false);
        }
        self.events.push(ViewerEvent::FullscreenChanged { fullscreen });
        self.invalidate();
    }

    pub fn set_thumbnails(&mut self, items: Vec<ThumbnailItem>) {
        self.thumbnails = items;
    }

    pub fn handle_panel_intent(&mut self, intent: PanelIntent) {
        match intent {
            PanelIntent::Close(panel) => self.set_panel(panel, false),
            PanelIntent::Select(id) => {
                if !self.thumbnails.iter().any(|t| t.id == id) {
                    log::warn!("Ignoring selection of unknown item {:?}", id);
                    return;
                }
                self.current_item = Some(id.clone());
                self.events.push(ViewerEvent::ItemSelected { id });
            }
        }
    }

    pub fn json_props(&self) -> JsonPanelProps<'_> {
        let selected: Vec<&OverlayRecord> = self
            .selection
            .selected()
            .iter()
            .filter_map(|id| self.overlays.get(id))
            .collect();
        let selection_only = !selected.is_empty();
        let records = if selection_only {
            selected
        } else {
            self.overlays.iter().collect()
        };
        JsonPanelProps {
            visible: self.panels.json,
            records,
            selection_only,
        }
    }

    pub fn help_props(&self) -> HelpPanelProps<'_> {
        HelpPanelProps {
            visible: self.panels.help,
            shortcuts: self.interaction.shortcuts(),
        }
    }

    pub fn thumbnail_props(&self) -> ThumbnailProps<'_> {
        ThumbnailProps {
            visible: self.panels.thumbnails,
            items: &self.thumbnails,
            current: self.current_item.as_deref(),
        }
    }

    pub fn play(&mut self) {
        let effect = self.playback.play();
        self.apply_playback(effect);
    }

    pub fn pause(&mut self) {
        let effect = self.playback.pause();
        self.apply_playback(effect);
    }

    pub fn toggle_playback(&mut self) {
        let effect = self.playback.toggle();
        self.apply_playback(effect);
    }

    pub fn seek(&mut self, time: f64) {
        let effect = self.playback.seek(time);
        self.apply_playback(effect);
    }

    pub fn seek_by(&mut self, delta: f64) {
        let effect = self.playback.seek_by(delta);
        self.apply_playback(effect);
    }

    pub fn step(&mut self, frames: i64) {
        let effect = self.playback.step(frames);
        self.apply_playback(effect);
    }

    /// Feed an event from the media element.
    pub fn on_media_event(&mut self, event: MediaEvent) {
        let effect = self.playback.on_event(event);
        self.apply_playback(effect);
    }

    fn apply_playback(&mut self, effect: PlaybackEffect) {
        if let Some(element) = self.element.as_deref_mut() {
            for command in effect.commands {
                element.execute(command);
            }
        }
        if effect.ended {
            self.events.push(ViewerEvent::PlaybackStateChanged {
                state: PlaybackState::Ended,
                current_time: self.playback.current_time(),
                duration: self.playback.duration(),
            });
        }
        if effect.state_changed {
            self.events.push(ViewerEvent::PlaybackStateChanged {
                state: self.playback.state(),
                current_time: self.playback.current_time(),
                duration: self.playback.duration(),
            });
        }
        if let Some(error) = effect.error {
            self.report(error);
        }
        if effect.state_changed || effect.time_changed {
            self.invalidate();
        }
    }

    fn invalidate(&mut self) {
        if self.in_frame {
            return;
        }
        if let Some(host) = self.host.as_deref_mut() {
            self.scheduler.invalidate(host);
        }
    }

    /// Run the composite pass for `token`. Returns false if the frame was
    /// stale or cancelled.
    pub fn on_animation_frame(&mut self, token: FrameToken, surface: &mut dyn Surface) -> bool {
        if !self.scheduler.begin_pass(token) {
            return false;
        }
        self.in_frame = true;
        self.flush_pointer_move();
        self.flush_wheel();
        self.in_frame = false;

        let media = self.media.as_ref().map(|m| {
            if m.is_video() {
                Some(self.playback.current_time())
            } else {
                None
            }
        });
        let snapshot = RenderSnapshot {
            transform: &self.transform,
            overlays: &self.overlays,
            options: &self.options,
            hovered: self.selection.hovered(),
            media,
            transient: self.interaction.transient(&self.options),
        };
        composite(surface, &snapshot);
        true
    }

    fn report(&mut self, error: ViewerError) {
        log::error!("{}", error);
        self.events.push(ViewerEvent::Error {
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    fn warn(&mut self, warning: ViewerError) {
        self.events.push(ViewerEvent::Warning {
            kind: warning.kind(),
            message: warning.to_string(),
        });
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::input::{Modifiers, PointerButton};
    use crate::models::media::ThumbnailItem;
    use crate::render::surface::DrawCommand;
    use crate::test_utils::{assert_abs_diff_eq, bbox, image, video, MockHost, MockMedia, RecordingSurface};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::test_utils::HostLog;

    fn attached() -> (Viewer, Rc<RefCell<HostLog>>) {
        let (host, log) = MockHost::new(800.0, 600.0);
        let mut viewer = Viewer::default();
        viewer.attach(Box::new(host));
        viewer.load_media(
            image(400.0, 300.0),
            vec![
                bbox("A", 0.0, 0.0, 100.0, 100.0),
                bbox("B", 50.0, 50.0, 100.0, 100.0),
                bbox("C", 80.0, 80.0, 100.0, 100.0),
            ],
            None,
        );
        viewer.drain_events();
        (viewer, log)
    }

    fn frame(viewer: &mut Viewer) -> RecordingSurface {
        let mut surface = RecordingSurface::new(800.0, 600.0);
        if let Some(token) = viewer.pending_frame() {
            viewer.on_animation_frame(token, &mut surface);
        }
        surface
    }

    fn down(x: f64, y: f64) -> InputEvent {
        InputEvent::PointerDown {
            pointer_id: 1,
            pos: Point::new(x, y),
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
        }
    }

    fn mv(x: f64, y: f64) -> InputEvent {
        InputEvent::PointerMove {
            pointer_id: 1,
            pos: Point::new(x, y),
            modifiers: Modifiers::NONE,
        }
    }

    fn up(x: f64, y: f64) -> InputEvent {
        InputEvent::PointerUp {
            pointer_id: 1,
            pos: Point::new(x, y),
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
        }
    }

    fn key(k: &str) -> InputEvent {
        InputEvent::KeyDown {
            key: k.to_string(),
            modifiers: Modifiers::NONE,
        }
    }

    #[test]
    fn attach_fits_media_and_listens() {
        let (viewer, log) = attached();
        assert_abs_diff_eq!(viewer.transform().scale(), 2.0);
        assert_eq!(log.borrow().listeners.len(), 4);
        assert!(viewer.pending_frame().is_some());
    }

    #[test]
    fn click_selects_and_emits_event() {
        let (mut viewer, _) = attached();
        // media (120,120) is inside B and C; C is on top
        viewer.handle_input(down(240.0, 240.0));
        viewer.handle_input(up(240.0, 240.0));
        assert_eq!(viewer.selection().selected(), &["C".to_string()]);
        assert_eq!(
            viewer.drain_events(),
            vec![ViewerEvent::SelectionChanged {
                selected_ids: vec!["C".into()]
            }]
        );
    }

    #[test]
    fn load_media_mid_drag_cancels_gesture_and_selection() {
        let (mut viewer, _) = attached();
        viewer.handle_input(down(10.0, 10.0));
        viewer.handle_input(up(10.0, 10.0));
        assert_eq!(viewer.selection().selected().len(), 1);
        viewer.zoom_in();

        viewer.handle_input(down(400.0, 300.0));
        viewer.handle_input(mv(450.0, 300.0));
        viewer.handle_input(mv(500.0, 320.0));
        viewer.drain_events();

        viewer.load_media(image(400.0, 300.0), vec![bbox("A", 0.0, 0.0, 10.0, 10.0)], None);
        let fitted = *viewer.transform();
        assert!(!viewer.interaction().is_gesture_active());
        assert!(viewer.selection().selected().is_empty());
        assert_eq!(
            viewer.drain_events(),
            vec![ViewerEvent::SelectionChanged { selected_ids: vec![] }]
        );

        // the rest of the old gesture arrives after the swap
        viewer.handle_input(mv(600.0, 400.0));
        viewer.handle_input(up(600.0, 400.0));
        frame(&mut viewer);
        assert_eq!(*viewer.transform(), fitted);
    }

    #[test]
    fn pointer_moves_coalesce_into_one_pass() {
        let (mut viewer, log) = attached();
        frame(&mut viewer);
        let requested = log.borrow().requested.len();

        for i in 0..50 {
            viewer.handle_input(mv(700.0 - i as f64, 10.0 + i as f64));
        }
        assert_eq!(log.borrow().requested.len(), requested + 1);

        let token = viewer.pending_frame().unwrap();
        let mut surface = RecordingSurface::new(800.0, 600.0);
        let passes = viewer.scheduler().passes();
        assert!(viewer.on_animation_frame(token, &mut surface));
        assert_eq!(viewer.scheduler().passes(), passes + 1);
        assert_eq!(viewer.interaction().pointer(), Some(Point::new(651.0, 59.0)));
        // hover was resolved once from the last position: media (325.5, 29.5) is empty
        assert_eq!(viewer.selection().hovered(), None);
        let clears = surface
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Clear { .. }))
            .count();
        assert_eq!(clears, 1);
        assert!(viewer.pending_frame().is_none());
    }

    #[test]
    fn hover_resolves_from_last_move_only() {
        let (mut viewer, _) = attached();
        viewer.handle_input(mv(20.0, 20.0));
        viewer.handle_input(mv(700.0, 500.0));
        viewer.handle_input(mv(240.0, 240.0));
        frame(&mut viewer);
        assert_eq!(viewer.selection().hovered(), Some("C"));
        assert_eq!(
            viewer.drain_events(),
            vec![ViewerEvent::HoverChanged {
                hovered_id: Some("C".into())
            }]
        );
    }

    #[test]
    fn second_pointer_does_not_erase_pending_pan() {
        let (mut viewer, _) = attached();
        viewer.zoom_in();
        viewer.zoom_in();
        frame(&mut viewer);
        let before = viewer.transform().pan();

        viewer.handle_input(down(400.0, 300.0));
        viewer.handle_input(mv(450.0, 300.0));
        viewer.handle_input(InputEvent::PointerMove {
            pointer_id: 2,
            pos: Point::new(10.0, 10.0),
            modifiers: Modifiers::NONE,
        });
        viewer.handle_input(up(450.0, 300.0));

        let after = viewer.transform().pan();
        assert_abs_diff_eq!(after.x - before.x, 50.0);
        assert_abs_diff_eq!(after.y, before.y);
        assert!(!viewer.interaction().is_gesture_active());
    }

    #[test]
    fn idle_moves_from_two_pointers_are_both_seen() {
        let (mut viewer, _) = attached();
        viewer.handle_input(InputEvent::PointerMove {
            pointer_id: 2,
            pos: Point::new(240.0, 240.0),
            modifiers: Modifiers::NONE,
        });
        viewer.handle_input(mv(700.0, 500.0));
        frame(&mut viewer);
        assert_eq!(viewer.selection().hovered(), None);
        assert_eq!(
            viewer.drain_events(),
            vec![
                ViewerEvent::HoverChanged {
                    hovered_id: Some("C".into())
                },
                ViewerEvent::HoverChanged { hovered_id: None },
            ]
        );
    }

    #[test]
    fn load_media_clears_hover_with_event() {
        let (mut viewer, _) = attached();
        viewer.handle_input(mv(240.0, 240.0));
        frame(&mut viewer);
        assert_eq!(viewer.selection().hovered(), Some("C"));
        viewer.drain_events();

        viewer.load_media(image(400.0, 300.0), vec![bbox("A", 0.0, 0.0, 10.0, 10.0)], None);
        assert_eq!(viewer.selection().hovered(), None);
        assert_eq!(
            viewer.drain_events(),
            vec![ViewerEvent::HoverChanged { hovered_id: None }]
        );
    }

    #[test]
    fn destroy_mid_gesture_releases_everything() {
        let (host, log) = MockHost::new(640.0, 480.0);
        let (media, commands) = MockMedia::new();
        let mut viewer = Viewer::default();
        viewer.attach(Box::new(host));
        viewer.load_media(video(320.0, 240.0), vec![], Some(Box::new(media)));
        viewer.handle_input(down(100.0, 100.0));
        viewer.handle_input(mv(150.0, 100.0));
        let token = viewer.pending_frame().unwrap();

        viewer.destroy();
        assert!(log.borrow().listeners.is_empty());
        assert!(log.borrow().cancelled.contains(&token));
        assert_eq!(commands.borrow().last(), Some(&MediaCommand::Release));
        assert!(!viewer.is_attached());

        let count = commands.borrow().len();
        viewer.destroy();
        assert_eq!(commands.borrow().len(), count);
    }

    #[test]
    fn video_playback_flows_through_element() {
        let (host, _) = MockHost::new(640.0, 480.0);
        let (media, commands) = MockMedia::new();
        let mut viewer = Viewer::default();
        viewer.attach(Box::new(host));
        viewer.load_media(video(320.0, 240.0), vec![], Some(Box::new(media)));
        viewer.on_media_event(MediaEvent::MetadataLoaded { duration: 8.0 });
        viewer.handle_input(key("space"));
        assert_eq!(viewer.playback().state(), PlaybackState::Playing);
        viewer.on_media_event(MediaEvent::TimeUpdate { time: 2.0 });
        viewer.handle_input(key("right"));
        assert_eq!(viewer.playback().seek_target(), Some(7.0));
        assert_eq!(
            commands.borrow().as_slice(),
            &[
                MediaCommand::Load {
                    source: "test.mp4".into()
                },
                MediaCommand::Play,
                MediaCommand::Seek { id: 1, time: 7.0 },
            ]
        );

        let mut surface = RecordingSurface::new(640.0, 480.0);
        let token = viewer.pending_frame().unwrap();
        viewer.on_animation_frame(token, &mut surface);
        // mid-seek the last stable time is drawn
        assert!(surface
            .commands
            .iter()
            .any(|c| matches!(c, DrawCommand::Media { time: Some(t), .. } if *t == 2.0)));

        let states: Vec<PlaybackState> = viewer
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                ViewerEvent::PlaybackStateChanged { state, .. } => Some(state),
                _ => None,
            })
            .collect();
        assert_eq!(
            states,
            vec![
                PlaybackState::Loading,
                PlaybackState::Ready,
                PlaybackState::Playing,
                PlaybackState::Seeking
            ]
        );
    }

    #[test]
    fn looping_reports_the_end_before_restarting() {
        let (host, _) = MockHost::new(640.0, 480.0);
        let (media, commands) = MockMedia::new();
        let mut viewer = Viewer::default();
        viewer.attach(Box::new(host));
        viewer.update_options(&json!({ "loop": true }));
        viewer.load_media(video(320.0, 240.0), vec![], Some(Box::new(media)));
        viewer.on_media_event(MediaEvent::MetadataLoaded { duration: 8.0 });
        viewer.handle_input(key("space"));
        viewer.drain_events();

        viewer.on_media_event(MediaEvent::Ended);
        let events = viewer.drain_events();
        assert_eq!(
            events,
            vec![
                ViewerEvent::PlaybackStateChanged {
                    state: PlaybackState::Ended,
                    current_time: 8.0,
                    duration: Some(8.0),
                },
                ViewerEvent::PlaybackStateChanged {
                    state: PlaybackState::Seeking,
                    current_time: 8.0,
                    duration: Some(8.0),
                },
            ]
        );
        assert_eq!(
            commands.borrow().last(),
            Some(&MediaCommand::Seek { id: 1, time: 0.0 })
        );
    }

    #[test]
    fn media_error_surfaces_event() {
        let (host, _) = MockHost::new(640.0, 480.0);
        let (media, _) = MockMedia::new();
        let mut viewer = Viewer::default();
        viewer.attach(Box::new(host));
        viewer.load_media(video(320.0, 240.0), vec![], Some(Box::new(media)));
        viewer.drain_events();
        viewer.on_media_event(MediaEvent::Error {
            message: "decode failed".into(),
        });
        let events = viewer.drain_events();
        assert!(events.contains(&ViewerEvent::PlaybackStateChanged {
            state: PlaybackState::Errored,
            current_time: 0.0,
            duration: None
        }));
        assert!(events
            .iter()
            .any(|e| matches!(e, ViewerEvent::Error { kind: ErrorKind::MediaLoad, .. })));
    }

    #[test]
    fn invalid_overlays_warn_without_aborting() {
        let (mut viewer, _) = attached();
        viewer.load_media(
            image(100.0, 100.0),
            vec![bbox("ok", 0.0, 0.0, 5.0, 5.0), bbox("bad", 0.0, 0.0, -1.0, 5.0)],
            None,
        );
        assert_eq!(viewer.overlays().len(), 1);
        let events = viewer.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            ViewerEvent::Warning {
                kind: ErrorKind::InvalidOverlayGeometry,
                ..
            }
        )));
    }

    #[test]
    fn options_clamp_with_warning_and_rebind_shortcuts() {
        let (mut viewer, _) = attached();
        viewer.update_options(&json!({
            "zoomPad": -1.0,
            "showLabel": false,
            "unknown": 1,
            "shortcuts": {"j": "", "ctrl+e": "export-view"}
        }));
        assert_eq!(viewer.options().zoom_pad, 0.0);
        assert!(!viewer.options().show_label);
        let events = viewer.drain_events();
        assert!(matches!(
            events.as_slice(),
            [ViewerEvent::Warning {
                kind: ErrorKind::UnsupportedOptionValue,
                ..
            }]
        ));

        viewer.handle_input(key("j"));
        assert!(!viewer.panels().json);
        viewer.handle_input(InputEvent::KeyDown {
            key: "e".into(),
            modifiers: Modifiers {
                ctrl: true,
                ..Modifiers::NONE
            },
        });
        assert_eq!(
            viewer.drain_events(),
            vec![ViewerEvent::Shortcut {
                action: "export-view".into()
            }]
        );
    }

    #[test]
    fn resize_refits_until_user_zooms() {
        let (mut viewer, _) = attached();
        viewer.resize(400.0, 300.0);
        assert_abs_diff_eq!(viewer.transform().scale(), 1.0);
        viewer.zoom_in();
        let scale = viewer.transform().scale();
        viewer.resize(1600.0, 1200.0);
        assert_abs_diff_eq!(viewer.transform().scale(), scale);
        viewer.perform(actions::RESET_ZOOM);
        viewer.resize(800.0, 600.0);
        assert_abs_diff_eq!(viewer.transform().scale(), 2.0);
    }

    #[test]
    fn zoom_to_selection_fits_padded_bounds() {
        let (mut viewer, _) = attached();
        viewer.select(vec!["C".into()]);
        viewer.handle_input(key("z"));
        // 100x100 region padded by 0.2 on each side is 140 wide; 600/140
        assert_abs_diff_eq!(viewer.transform().scale(), 600.0 / 140.0, epsilon = 1e-9);
        let center = viewer.transform().to_viewport(Point::new(130.0, 130.0));
        assert_abs_diff_eq!(center.x, 400.0, epsilon = 1e-9);
        assert_abs_diff_eq!(center.y, 300.0, epsilon = 1e-9);
    }

    #[test]
    fn panels_toggle_and_fullscreen_closes_side_panels() {
        let (mut viewer, _) = attached();
        viewer.handle_input(key("j"));
        viewer.handle_input(key("g"));
        assert!(viewer.panels().json && viewer.panels().thumbnails);
        viewer.handle_input(key("f"));
        assert!(viewer.is_fullscreen());
        assert!(!viewer.panels().json && !viewer.panels().thumbnails);
        let events = viewer.drain_events();
        assert_eq!(
            events[..2],
            [
                ViewerEvent::PanelToggled {
                    panel: Panel::Json,
                    visible: true
                },
                ViewerEvent::PanelToggled {
                    panel: Panel::Thumbnails,
                    visible: true
                },
            ]
        );
        assert_eq!(events.last(), Some(&ViewerEvent::FullscreenChanged { fullscreen: true }));
    }

    #[test]
    fn help_swallows_pointer_input_and_escape_closes_it() {
        let (mut viewer, _) = attached();
        viewer.handle_input(key("?"));
        assert!(viewer.panels().help);
        viewer.handle_input(down(10.0, 10.0));
        viewer.handle_input(up(10.0, 10.0));
        assert!(viewer.selection().selected().is_empty());
        viewer.handle_input(key("escape"));
        assert!(!viewer.panels().help);
    }

    #[test]
    fn escape_clears_selection_when_no_panel_is_open() {
        let (mut viewer, _) = attached();
        viewer.select(vec!["A".into(), "missing".into()]);
        assert_eq!(viewer.selection().selected(), &["A".to_string()]);
        viewer.handle_input(key("escape"));
        assert!(viewer.selection().selected().is_empty());
    }

    #[test]
    fn thumbnail_select_emits_item_selected() {
        let (mut viewer, _) = attached();
        viewer.set_thumbnails(vec![ThumbnailItem {
            id: "s1".into(),
            thumbnail_source: "s1.jpg".into(),
        }]);
        viewer.handle_panel_intent(PanelIntent::Select("nope".into()));
        viewer.handle_panel_intent(PanelIntent::Select("s1".into()));
        assert_eq!(viewer.drain_events(), vec![ViewerEvent::ItemSelected { id: "s1".into() }]);
        assert_eq!(viewer.thumbnail_props().current, Some("s1"));
    }

    #[test]
    fn json_props_follow_selection() {
        let (mut viewer, _) = attached();
        assert_eq!(viewer.json_props().records.len(), 3);
        viewer.select(vec!["B".into()]);
        let props = viewer.json_props();
        assert!(props.selection_only);
        assert_eq!(props.document()["id"], "B");
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = ViewerEvent::PlaybackStateChanged {
            state: PlaybackState::Paused,
            current_time: 1.5,
            duration: Some(3.0),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "playback-state-changed", "state": "paused", "currentTime": 1.5, "duration": 3.0})
        );
    }
}
