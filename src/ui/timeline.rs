// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video scrubber with buffered ranges.

use annoview::playback::PlaybackController;

/// `m:ss.t`, or `h:mm:ss.t` past an hour.
pub fn format_time(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let tenths = (seconds * 10.0).floor() as u64;
    let (whole, tenth) = (tenths / 10, tenths % 10);
    let (h, m, s) = (whole / 3600, (whole / 60) % 60, whole % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}.{}", h, m, s, tenth)
    } else {
        format!("{}:{:02}.{}", m, s, tenth)
    }
}

/// Show the scrubber. Returns the time to seek to when the user drags it.
pub fn show(ui: &mut egui::Ui, playback: &PlaybackController) -> Option<f64> {
    let duration = playback.duration().unwrap_or(0.0);
    // Show the pending seek so the handle does not jump back mid-drag.
    let mut time = playback.seek_target().unwrap_or(playback.current_time());
    let mut seek = None;

    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(format_time(time)).monospace());

        ui.spacing_mut().slider_width = (ui.available_width() - 90.0).max(40.0);
        let slider = ui.add_enabled(
            duration > 0.0,
            egui::Slider::new(&mut time, 0.0..=duration.max(f64::EPSILON)).show_value(false),
        );

        if duration > 0.0 {
            let rail = slider.rect;
            let y = rail.bottom() - 2.0;
            for &(start, end) in playback.buffered().ranges() {
                let x0 = rail.left() + rail.width() * (start / duration).clamp(0.0, 1.0) as f32;
                let x1 = rail.left() + rail.width() * (end / duration).clamp(0.0, 1.0) as f32;
                ui.painter().line_segment(
                    [egui::pos2(x0, y), egui::pos2(x1, y)],
                    egui::Stroke::new(2.0, egui::Color32::from_gray(110)),
                );
            }
        }

        if slider.changed() {
            seek = Some(time);
        }

        let total = playback.duration().map_or_else(|| "--:--".to_string(), format_time);
        ui.label(egui::RichText::new(total).monospace().weak());
    });

    seek
}
