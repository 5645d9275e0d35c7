// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Viewer control bar.
//!
//! Buttons map onto the same named actions as the keyboard shortcuts, so
//! the bar and the keys can never disagree.

use annoview::interaction::shortcuts::actions;
use annoview::models::selection::PanelVisibility;

/// What the control bar needs to know to draw itself.
#[derive(Debug, Clone, Copy)]
pub struct ToolbarState {
    pub is_video: bool,
    pub playing: bool,
    pub has_selection: bool,
    pub panels: PanelVisibility,
    pub fullscreen: bool,
}

/// Display the control bar. Returns the action of the clicked button.
pub fn show(ui: &mut egui::Ui, state: ToolbarState) -> Option<&'static str> {
    let mut action = None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 6.0;

        if state.is_video {
            let play = if state.playing { "⏸" } else { "▶" };
            if ui.button(play).on_hover_text("Play / pause (Space)").clicked() {
                action = Some(actions::PLAY_PAUSE);
            }
            if ui.add_enabled(!state.playing, egui::Button::new("⏮")).on_hover_text("Previous frame (,)").clicked() {
                action = Some(actions::STEP_BACK);
            }
            if ui.add_enabled(!state.playing, egui::Button::new("⏭")).on_hover_text("Next frame (.)").clicked() {
                action = Some(actions::STEP_FORWARD);
            }
            ui.separator();
        }

        if ui.button("−").on_hover_text("Zoom out (-)").clicked() {
            action = Some(actions::ZOOM_OUT);
        }
        if ui.button("+").on_hover_text("Zoom in (=)").clicked() {
            action = Some(actions::ZOOM_IN);
        }
        if ui.button("Fit").on_hover_text("Reset zoom (R)").clicked() {
            action = Some(actions::RESET_ZOOM);
        }
        if ui
            .add_enabled(state.has_selection, egui::Button::new("Zoom to selection"))
            .on_hover_text("Z")
            .clicked()
        {
            action = Some(actions::ZOOM_TO_SELECTION);
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.selectable_label(state.fullscreen, "⛶").on_hover_text("Fullscreen (F)").clicked() {
                action = Some(actions::TOGGLE_FULLSCREEN);
            }
            if ui.selectable_label(state.panels.help, "?").on_hover_text("Keyboard shortcuts (?)").clicked() {
                action = Some(actions::TOGGLE_HELP);
            }
            if ui.selectable_label(state.panels.thumbnails, "Grid").on_hover_text("Thumbnails (G)").clicked() {
                action = Some(actions::TOGGLE_THUMBNAILS);
            }
            if ui.selectable_label(state.panels.json, "JSON").on_hover_text("Label JSON (J)").clicked() {
                action = Some(actions::TOGGLE_JSON);
            }
        });
    });

    action
}
