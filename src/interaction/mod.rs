// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Interaction controller.
//!
//! Turns raw pointer, wheel and keyboard events into gestures: pan,
//! zoom-at-point, hover, click-select, drag-select and shortcut dispatch.
//! Only one pointer is tracked at a time; events from any other pointer are
//! ignored until the active gesture ends.

pub mod input;
pub mod shortcuts;

use crate::error::ViewerError;
use crate::models::options::Options;
use crate::models::overlay::OverlayId;
use crate::models::selection::SelectionState;
use crate::overlay::OverlaySet;
use crate::util::geometry::{Point, Rect};
use crate::view::transform::Transform;

use input::{InputEvent, Modifiers, PointerButton};
use shortcuts::{ShortcutScope, ShortcutTable};

/// Largest zoom exponent applied in one tick, so a burst of wheel events
/// can change the scale by at most 2x per frame.
const MAX_WHEEL_EXPONENT: f64 = std::f64::consts::LN_2;

/// Current gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// Button down, not yet past the drag threshold.
    Pressed {
        pointer_id: i64,
        origin: Point,
        modifiers: Modifiers,
    },
    Panning {
        pointer_id: i64,
        last: Point,
    },
    BoxSelecting {
        pointer_id: i64,
        origin: Point,
        current: Point,
        additive: bool,
    },
}

impl Gesture {
    /// The pointer driving the gesture, if one is active.
    pub fn pointer_id(&self) -> Option<i64> {
        match *self {
            Gesture::Idle => None,
            Gesture::Pressed { pointer_id, .. }
            | Gesture::Panning { pointer_id, .. }
            | Gesture::BoxSelecting { pointer_id, .. } => Some(pointer_id),
        }
    }
}

/// What the root coordinator has to react to after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    HoverChanged(Option<OverlayId>),
    SelectionChanged,
    TransformChanged,
    /// Transient UI (selection rectangle, crosshair) changed.
    Redraw,
    /// A shortcut fired.
    Action(String),
}

/// Mutable state the controller operates on for one event.
pub struct InteractionContext<'a> {
    pub transform: &'a mut Transform,
    pub overlays: &'a OverlaySet,
    pub selection: &'a mut SelectionState,
    pub options: &'a Options,
}

/// Transient UI drawn on top of overlays.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransientUi {
    pub selection_rect: Option<Rect>,
    pub crosshair: Option<Point>,
}

#[derive(Debug, Clone, Copy)]
struct PendingWheel {
    pos: Point,
    delta: f64,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    gesture: Gesture,
    pointer: Option<Point>,
    pending_wheel: Option<PendingWheel>,
    shortcuts: ShortcutTable,
}

impl InteractionController {
    pub fn new(shortcuts: ShortcutTable) -> Self {
        Self {
            shortcuts,
            ..Self::default()
        }
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn pointer(&self) -> Option<Point> {
        self.pointer
    }

    pub fn shortcuts(&self) -> &ShortcutTable {
        &self.shortcuts
    }

    pub fn shortcuts_mut(&mut self) -> &mut ShortcutTable {
        &mut self.shortcuts
    }

    pub fn is_gesture_active(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    pub fn has_pending_wheel(&self) -> bool {
        self.pending_wheel.is_some()
    }

    /// Abort the current gesture and drop coalesced wheel input.
    pub fn cancel(&mut self) {
        if self.gesture != Gesture::Idle {
            log::debug!("Cancelled gesture {:?}", self.gesture);
        }
        self.gesture = Gesture::Idle;
        self.pending_wheel = None;
    }

    pub fn transient(&self, options: &Options) -> TransientUi {
        let selection_rect = match self.gesture {
            Gesture::BoxSelecting { origin, current, .. } => Some(Rect::from_corners(origin, current)),
            _ => None,
        };
        TransientUi {
            selection_rect,
            crosshair: self.pointer.filter(|_| options.show_crosshair),
        }
    }

    /// Process one event.
    pub fn handle(&mut self, event: &InputEvent, ctx: &mut InteractionContext<'_>) -> Vec<Intent> {
        match event {
            InputEvent::PointerDown {
                pointer_id,
                pos,
                button,
                modifiers,
            } => self.pointer_down(*pointer_id, *pos, *button, *modifiers),
            InputEvent::PointerMove { pointer_id, pos, .. } => self.pointer_move(*pointer_id, *pos, ctx),
            InputEvent::PointerUp {
                pointer_id,
                pos,
                modifiers,
                ..
            } => self.pointer_up(*pointer_id, *pos, *modifiers, ctx),
            InputEvent::PointerLeave { pointer_id } => self.pointer_leave(*pointer_id, ctx),
            InputEvent::Wheel { pos, delta_y, .. } => {
                if delta_y.is_finite() {
                    let pending = self.pending_wheel.get_or_insert(PendingWheel { pos: *pos, delta: 0.0 });
                    pending.pos = *pos;
                    pending.delta += delta_y;
                }
                Vec::new()
            }
            InputEvent::KeyDown { key, modifiers } => self.key_down(key, *modifiers, ctx),
        }
    }

    /// Apply the wheel delta coalesced since the last tick.
    pub fn flush_wheel(&mut self, ctx: &mut InteractionContext<'_>) -> Vec<Intent> {
        let Some(wheel) = self.pending_wheel.take() else {
            return Vec::new();
        };
        let exponent = (-wheel.delta * ctx.options.wheel_sensitivity).clamp(-MAX_WHEEL_EXPONENT, MAX_WHEEL_EXPONENT);
        if exponent == 0.0 {
            return Vec::new();
        }
        let before = *ctx.transform;
        ctx.transform.zoom_at(wheel.pos, exponent.exp());
        if *ctx.transform == before {
            Vec::new()
        } else {
            vec![Intent::TransformChanged]
        }
    }

    fn conflicts(&self, pointer_id: i64) -> bool {
        match self.gesture.pointer_id() {
            Some(active) if active != pointer_id => {
                log::trace!("{}", ViewerError::GestureConflict { pointer_id });
                true
            }
            _ => false,
        }
    }

    fn pointer_down(&mut self, pointer_id: i64, pos: Point, button: PointerButton, modifiers: Modifiers) -> Vec<Intent> {
        if self.conflicts(pointer_id) || self.gesture != Gesture::Idle {
            return Vec::new();
        }
        self.pointer = Some(pos);
        if button == PointerButton::Primary {
            self.gesture = Gesture::Pressed {
                pointer_id,
                origin: pos,
                modifiers,
            };
        }
        Vec::new()
    }

    fn pointer_move(&mut self, pointer_id: i64, pos: Point, ctx: &mut InteractionContext<'_>) -> Vec<Intent> {
        if self.conflicts(pointer_id) {
            return Vec::new();
        }
        self.pointer = Some(pos);
        let mut intents = Vec::new();
        if ctx.options.show_crosshair {
            intents.push(Intent::Redraw);
        }

        match self.gesture {
            Gesture::Idle => {
                let hit = ctx.overlays.hit_test(pos, ctx.transform, ctx.options).map(|r| r.id.clone());
                if ctx.selection.set_hovered(hit.clone()) {
                    intents.push(Intent::HoverChanged(hit));
                }
            }
            Gesture::Pressed {
                pointer_id,
                origin,
                modifiers,
            } => {
                if origin.distance(pos) <= ctx.options.drag_threshold {
                    return intents;
                }
                if modifiers.has(ctx.options.box_select_modifier) {
                    self.gesture = Gesture::BoxSelecting {
                        pointer_id,
                        origin,
                        current: pos,
                        additive: modifiers.has(ctx.options.multi_select_modifier),
                    };
                    intents.push(Intent::Redraw);
                } else {
                    self.gesture = Gesture::Panning { pointer_id, last: pos };
                    ctx.transform.pan_by(pos.x - origin.x, pos.y - origin.y);
                    intents.push(Intent::TransformChanged);
                    if ctx.selection.set_hovered(None) {
                        intents.push(Intent::HoverChanged(None));
                    }
                }
            }
            Gesture::Panning { pointer_id, last } => {
                ctx.transform.pan_by(pos.x - last.x, pos.y - last.y);
                self.gesture = Gesture::Panning { pointer_id, last: pos };
                intents.push(Intent::TransformChanged);
            }
            Gesture::BoxSelecting {
                pointer_id,
                origin,
                additive,
                ..
            } => {
                self.gesture = Gesture::BoxSelecting {
                    pointer_id,
                    origin,
                    current: pos,
                    additive,
                };
                intents.push(Intent::Redraw);
            }
        }
        intents
    }

    fn pointer_up(
        &mut self,
        pointer_id: i64,
        pos: Point,
        modifiers: Modifiers,
        ctx: &mut InteractionContext<'_>,
    ) -> Vec<Intent> {
        if self.conflicts(pointer_id) {
            return Vec::new();
        }
        let gesture = std::mem::take(&mut self.gesture);
        match gesture {
            Gesture::Idle => Vec::new(),
            Gesture::Pressed { .. } => self.click(pos, modifiers, ctx),
            Gesture::Panning { .. } => Vec::new(),
            Gesture::BoxSelecting {
                origin, additive, ..
            } => {
                let rect = Rect::from_corners(origin, pos);
                let hits = ctx.overlays.intersecting(&rect, ctx.transform, ctx.options);
                let changed = if additive {
                    let before = ctx.selection.clone();
                    for id in hits {
                        ctx.selection.add(id);
                    }
                    before != *ctx.selection
                } else {
                    ctx.selection.set(hits)
                };
                let mut intents = vec![Intent::Redraw];
                if changed {
                    intents.push(Intent::SelectionChanged);
                }
                intents
            }
        }
    }

    /// Click policy: empty space clears (unless the multi-select modifier is
    /// held); a plain click on a shape selects only it, or deselects it if it
    /// was already selected; with the modifier it toggles without clearing.
    fn click(&mut self, pos: Point, modifiers: Modifiers, ctx: &mut InteractionContext<'_>) -> Vec<Intent> {
        let hit = ctx.overlays.hit_test(pos, ctx.transform, ctx.options).map(|r| r.id.clone());
        let multi = modifiers.has(ctx.options.multi_select_modifier);
        let changed = match hit {
            None if multi => false,
            None => ctx.selection.clear(),
            Some(id) if multi => {
                ctx.selection.toggle(id);
                true
            }
            Some(id) => {
                if ctx.selection.is_selected(&id) {
                    ctx.selection.remove(&id)
                } else {
                    ctx.selection.clear();
                    ctx.selection.add(id);
                    true
                }
            }
        };
        if changed {
            vec![Intent::SelectionChanged]
        } else {
            Vec::new()
        }
    }

    fn pointer_leave(&mut self, pointer_id: i64, ctx: &mut InteractionContext<'_>) -> Vec<Intent> {
        if self.conflicts(pointer_id) {
            return Vec::new();
        }
        let mut intents = Vec::new();
        if matches!(self.gesture, Gesture::BoxSelecting { .. }) || self.pointer.is_some() {
            intents.push(Intent::Redraw);
        }
        self.gesture = Gesture::Idle;
        self.pointer = None;
        if ctx.selection.set_hovered(None) {
            intents.push(Intent::HoverChanged(None));
        }
        intents
    }

    fn key_down(&mut self, key: &str, modifiers: Modifiers, ctx: &mut InteractionContext<'_>) -> Vec<Intent> {
        let Some(shortcut) = self.shortcuts.lookup(key, modifiers) else {
            return Vec::new();
        };
        if shortcut.scope == ShortcutScope::Selection && ctx.selection.selected().is_empty() {
            log::debug!("Shortcut {} needs a selection", shortcut.action);
            return Vec::new();
        }
        vec![Intent::Action(shortcut.action.clone())]
    }
}
