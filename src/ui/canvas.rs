// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Viewer canvas.
//!
//! Replays the viewer's draw commands with the egui painter and turns raw
//! egui input into viewer [`InputEvent`]s.

use annoview::{Color, DrawCommand, InputEvent, Modifiers, Point, PointerButton, Rect, Size, Surface};

use super::timeline::format_time;

/// egui only reports one mouse pointer.
const MOUSE_POINTER: i64 = 1;

/// Pixels per wheel "line" step.
const LINE_HEIGHT: f32 = 40.0;

const CAPTION_FONT_SIZE: f32 = 12.0;

/// Draw commands from the last composite pass.
///
/// egui repaints the whole window every frame, so the commands are kept
/// and replayed until the viewer runs another pass.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    size: Size,
    commands: Vec<DrawCommand>,
}

impl FrameBuffer {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }
}

impl Surface for FrameBuffer {
    fn size(&self) -> Size {
        self.size
    }

    fn draw(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}

fn color32(color: Color) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

fn to_pos(origin: egui::Pos2, p: Point) -> egui::Pos2 {
    origin + egui::vec2(p.x as f32, p.y as f32)
}

fn to_rect(origin: egui::Pos2, r: &Rect) -> egui::Rect {
    egui::Rect::from_min_size(to_pos(origin, r.min()), egui::vec2(r.width as f32, r.height as f32))
}

fn to_stroke(stroke: &annoview::Stroke) -> egui::Stroke {
    egui::Stroke::new(stroke.width as f32, color32(stroke.color))
}

/// Paint `commands` with `painter`, whose clip rect is the canvas.
///
/// `texture` holds the decoded still image. Video frames are not decoded,
/// so video media draws a placeholder with the current timestamp.
pub fn paint(
    painter: &egui::Painter,
    origin: egui::Pos2,
    commands: &[DrawCommand],
    texture: Option<&egui::TextureHandle>,
) {
    for command in commands {
        match command {
            DrawCommand::Clear { color } => {
                painter.rect_filled(painter.clip_rect(), 0.0, color32(*color));
            }
            DrawCommand::Media { dest, time } => {
                let rect = to_rect(origin, dest);
                match (texture, time) {
                    (Some(texture), _) => {
                        painter.image(
                            texture.id(),
                            rect,
                            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                            egui::Color32::WHITE,
                        );
                    }
                    (None, time) => {
                        painter.rect_filled(rect, 0.0, egui::Color32::from_gray(32));
                        if let Some(t) = time {
                            painter.text(
                                rect.center(),
                                egui::Align2::CENTER_CENTER,
                                format_time(*t),
                                egui::FontId::monospace(24.0),
                                egui::Color32::from_gray(150),
                            );
                        }
                    }
                }
            }
            DrawCommand::StrokeRect { rect, stroke } => {
                painter.rect_stroke(to_rect(origin, rect), 0.0, to_stroke(stroke));
            }
            DrawCommand::FillRect { rect, color } => {
                painter.rect_filled(to_rect(origin, rect), 0.0, color32(*color));
            }
            DrawCommand::Line { from, to, stroke } => {
                painter.line_segment([to_pos(origin, *from), to_pos(origin, *to)], to_stroke(stroke));
            }
            DrawCommand::Polyline { points, closed, stroke } => {
                let points: Vec<egui::Pos2> = points.iter().map(|p| to_pos(origin, *p)).collect();
                let shape = if *closed {
                    egui::epaint::PathShape::closed_line(points, to_stroke(stroke))
                } else {
                    egui::epaint::PathShape::line(points, to_stroke(stroke))
                };
                painter.add(shape);
            }
            DrawCommand::FillPolygon { points, color } => {
                let points: Vec<egui::Pos2> = points.iter().map(|p| to_pos(origin, *p)).collect();
                painter.add(egui::Shape::convex_polygon(points, color32(*color), egui::Stroke::NONE));
            }
            DrawCommand::Circle {
                center,
                radius,
                fill,
                stroke,
            } => {
                let center = to_pos(origin, *center);
                let radius = *radius as f32;
                if let Some(fill) = fill {
                    painter.circle_filled(center, radius, color32(*fill));
                }
                if let Some(stroke) = stroke {
                    painter.circle_stroke(center, radius, to_stroke(stroke));
                }
            }
            DrawCommand::Text {
                pos,
                text,
                color,
                background,
            } => {
                let at = to_pos(origin, *pos);
                let galley = painter.layout_no_wrap(
                    text.clone(),
                    egui::FontId::proportional(CAPTION_FONT_SIZE),
                    color32(*color),
                );
                if let Some(background) = background {
                    let rect = egui::Rect::from_min_size(at, galley.size()).expand(2.0);
                    painter.rect_filled(rect, 2.0, color32(*background));
                }
                painter.galley(at, galley, color32(*color));
            }
        }
    }
}

pub fn map_modifiers(modifiers: egui::Modifiers) -> Modifiers {
    Modifiers {
        shift: modifiers.shift,
        ctrl: modifiers.ctrl,
        alt: modifiers.alt,
        meta: modifiers.mac_cmd,
    }
}

fn map_button(button: egui::PointerButton) -> Option<PointerButton> {
    match button {
        egui::PointerButton::Primary => Some(PointerButton::Primary),
        egui::PointerButton::Secondary => Some(PointerButton::Secondary),
        egui::PointerButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

/// Shortcut key name for an egui key.
///
/// `?` arrives as text instead, since keyboards disagree on which key
/// and modifiers produce it.
pub fn key_name(key: egui::Key) -> Option<&'static str> {
    match key {
        egui::Key::Questionmark => None,
        // shift+= on most layouts
        egui::Key::Plus => Some("="),
        other => Some(other.name()),
    }
}

/// Translates egui input for one canvas rect into viewer events.
#[derive(Debug, Default)]
pub struct InputTranslator {
    inside: bool,
    pressed: bool,
}

impl InputTranslator {
    fn is_over(ctx: &egui::Context, rect: egui::Rect, layer: egui::LayerId, pos: egui::Pos2) -> bool {
        rect.contains(pos) && ctx.layer_id_at(pos).map_or(true, |l| l == layer)
    }

    /// Pointer events are kept while a button pressed on the canvas is held,
    /// even outside it. Keys are only read when `keyboard` is true.
    pub fn translate(
        &mut self,
        ctx: &egui::Context,
        rect: egui::Rect,
        layer: egui::LayerId,
        keyboard: bool,
    ) -> Vec<InputEvent> {
        let (events, current, hover) = ctx.input(|i| (i.events.clone(), i.modifiers, i.pointer.hover_pos()));
        let local = |p: egui::Pos2| Point::new(f64::from(p.x - rect.min.x), f64::from(p.y - rect.min.y));
        let mut out = Vec::new();

        for event in events {
            match event {
                egui::Event::PointerMoved(pos) => {
                    let over = Self::is_over(ctx, rect, layer, pos);
                    if over || self.pressed {
                        self.inside = over;
                        out.push(InputEvent::PointerMove {
                            pointer_id: MOUSE_POINTER,
                            pos: local(pos),
                            modifiers: map_modifiers(current),
                        });
                    } else if self.inside {
                        self.inside = false;
                        out.push(InputEvent::PointerLeave {
                            pointer_id: MOUSE_POINTER,
                        });
                    }
                }
                egui::Event::PointerButton {
                    pos,
                    button,
                    pressed,
                    modifiers,
                } => {
                    let Some(button) = map_button(button) else {
                        continue;
                    };
                    if pressed && Self::is_over(ctx, rect, layer, pos) {
                        self.pressed = true;
                        out.push(InputEvent::PointerDown {
                            pointer_id: MOUSE_POINTER,
                            pos: local(pos),
                            button,
                            modifiers: map_modifiers(modifiers),
                        });
                    } else if !pressed && self.pressed {
                        self.pressed = false;
                        out.push(InputEvent::PointerUp {
                            pointer_id: MOUSE_POINTER,
                            pos: local(pos),
                            button,
                            modifiers: map_modifiers(modifiers),
                        });
                    }
                }
                egui::Event::PointerGone => {
                    if self.inside || self.pressed {
                        self.inside = false;
                        self.pressed = false;
                        out.push(InputEvent::PointerLeave {
                            pointer_id: MOUSE_POINTER,
                        });
                    }
                }
                egui::Event::MouseWheel { unit, delta, modifiers } => {
                    let Some(pos) = hover.filter(|p| Self::is_over(ctx, rect, layer, *p)) else {
                        continue;
                    };
                    let scale = match unit {
                        egui::MouseWheelUnit::Point => 1.0,
                        egui::MouseWheelUnit::Line => LINE_HEIGHT,
                        egui::MouseWheelUnit::Page => rect.height(),
                    };
                    // egui reports scrolling up as positive
                    out.push(InputEvent::Wheel {
                        pos: local(pos),
                        delta_y: f64::from(-delta.y * scale),
                        modifiers: map_modifiers(modifiers),
                    });
                }
                egui::Event::Key {
                    key,
                    pressed: true,
                    modifiers,
                    ..
                } if keyboard => {
                    if let Some(name) = key_name(key) {
                        out.push(InputEvent::KeyDown {
                            key: name.to_string(),
                            modifiers: map_modifiers(modifiers),
                        });
                    }
                }
                egui::Event::Text(text) if keyboard && text == "?" => {
                    out.push(InputEvent::KeyDown {
                        key: text,
                        modifiers: Modifiers::NONE,
                    });
                }
                _ => {}
            }
        }
        out
    }
}
