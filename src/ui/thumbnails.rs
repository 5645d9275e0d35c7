// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Thumbnail strip for switching between media items.

use annoview::{Panel, PanelIntent, ThumbnailProps};

const TILE_SIZE: egui::Vec2 = egui::vec2(96.0, 54.0);

pub fn show(ui: &mut egui::Ui, props: &ThumbnailProps<'_>) -> Option<PanelIntent> {
    let mut intent = None;

    ui.horizontal(|ui| {
        if ui.small_button("✕").clicked() {
            intent = Some(PanelIntent::Close(Panel::Thumbnails));
        }
        if props.items.is_empty() {
            ui.label(egui::RichText::new("No other items").italics().weak());
            return;
        }
        egui::ScrollArea::horizontal().show(ui, |ui| {
            ui.horizontal(|ui| {
                for item in props.items {
                    let current = props.current == Some(item.id.as_str());
                    let tile = egui::Button::new(egui::RichText::new(&item.id).small())
                        .min_size(TILE_SIZE)
                        .selected(current);
                    if ui.add(tile).on_hover_text(&item.thumbnail_source).clicked() && !current {
                        intent = Some(PanelIntent::Select(item.id.clone()));
                    }
                }
            });
        });
    });

    intent
}
