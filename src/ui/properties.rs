// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! JSON inspector for the selected overlays.

use annoview::{JsonPanelProps, Panel, PanelIntent};

/// Display the inspector. Returns an intent when the user closes it.
pub fn show(ui: &mut egui::Ui, props: &JsonPanelProps<'_>) -> Option<PanelIntent> {
    let mut intent = None;

    ui.horizontal(|ui| {
        ui.heading("Labels");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.small_button("✕").clicked() {
                intent = Some(PanelIntent::Close(Panel::Json));
            }
            if ui.small_button("Copy").clicked() {
                ui.output_mut(|o| o.copied_text = props.pretty());
            }
        });
    });

    let caption = if props.selection_only {
        format!("{} selected", props.records.len())
    } else {
        format!("All {} labels", props.records.len())
    };
    ui.label(egui::RichText::new(caption).weak());
    ui.separator();

    if props.records.is_empty() {
        ui.label(egui::RichText::new("No labels").italics().weak());
        return intent;
    }

    let mut text = props.pretty();
    egui::ScrollArea::both().auto_shrink([false, false]).show(ui, |ui| {
        ui.add(
            egui::TextEdit::multiline(&mut text)
                .code_editor()
                .interactive(false)
                .desired_width(f32::INFINITY),
        );
    });

    intent
}
