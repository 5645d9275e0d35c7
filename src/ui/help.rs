// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Keyboard shortcut overlay.

use annoview::{HelpPanelProps, Panel, PanelIntent};

/// Show the shortcut window. Returns an intent when the user closes it.
pub fn show(ctx: &egui::Context, props: &HelpPanelProps<'_>) -> Option<PanelIntent> {
    let mut open = props.visible;
    egui::Window::new("Keyboard shortcuts")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(ctx, |ui| {
            egui::Grid::new("shortcut_grid")
                .num_columns(2)
                .spacing([24.0, 6.0])
                .striped(true)
                .show(ui, |ui| {
                    for row in props.rows() {
                        ui.label(egui::RichText::new(row.keys).monospace().strong());
                        ui.label(row.description);
                        ui.end_row();
                    }
                });
        });

    (props.visible && !open).then_some(PanelIntent::Close(Panel::Help))
}
