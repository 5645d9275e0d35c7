// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The app owns a [`Viewer`] and plays host for it: it decodes media in the
//! background, feeds egui input to the viewer, runs its frames on repaint
//! and lays the viewer's panels out as egui panels.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};

use annoview::io::media::{self, LoadedImage, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
use annoview::io::serialization::{self, OverlayDocument};
use annoview::{MediaDescriptor, Options, Size, Viewer, ViewerEvent};

use crate::host::{ClockMedia, EguiHost};
use crate::ui::canvas::{self, FrameBuffer, InputTranslator};
use crate::ui::{help, properties, thumbnails, timeline, toolbar};

/// Files named on the command line.
#[derive(Debug, Default)]
pub struct StartupFiles {
    pub media: Option<PathBuf>,
    pub overlays: Option<PathBuf>,
    pub options: Option<PathBuf>,
}

/// Result of background media loading.
struct LoadedMedia {
    descriptor: MediaDescriptor,
    image: Option<LoadedImage>,
}

/// Main application state.
pub struct ViewerApp {
    viewer: Viewer,

    /// Shared with the viewer; carries frame requests and the canvas size
    host: EguiHost,

    /// Element for the current video, if any
    clock: Option<ClockMedia>,

    /// Last composite pass, replayed every egui frame
    frame: FrameBuffer,

    input: InputTranslator,

    /// Decoded still image
    media_texture: Option<egui::TextureHandle>,

    /// Overlay document for the current media
    document: Option<OverlayDocument>,

    /// Directory relative media paths in the document resolve against
    document_dir: Option<PathBuf>,

    /// Receiver for background media loading
    media_loader: Option<Receiver<Result<LoadedMedia, String>>>,

    /// Loading state message
    loading_message: Option<String>,

    /// Last error, shown in the menu bar
    status: Option<String>,
}

impl ViewerApp {
    pub fn new(ctx: &egui::Context, startup: StartupFiles) -> Self {
        let host = EguiHost::new(ctx.clone());
        let mut viewer = Viewer::new(Options::default());
        viewer.attach(Box::new(host.clone()));

        let mut app = Self {
            viewer,
            host,
            clock: None,
            frame: FrameBuffer::default(),
            input: InputTranslator::default(),
            media_texture: None,
            document: None,
            document_dir: None,
            media_loader: None,
            loading_message: None,
            status: None,
        };

        if let Some(path) = startup.options {
            app.load_options_file(&path);
        }
        if let Some(path) = startup.overlays {
            app.load_overlay_file(&path);
        }
        if let Some(path) = startup.media {
            app.open_media(path);
        }
        app
    }

    /// Decode `path` in the background. Overlays from the current document
    /// are attached once it arrives.
    fn open_media(&mut self, path: PathBuf) {
        let (sender, receiver) = channel();
        self.media_loader = Some(receiver);
        self.loading_message = Some(format!("Loading {}...", path.display()));

        let hint = self.document.as_ref().and_then(|d| d.media.clone());

        std::thread::spawn(move || {
            let result = (|| -> Result<LoadedMedia, String> {
                if media::is_video(&path) {
                    return Ok(LoadedMedia {
                        descriptor: media::video_descriptor(&path, hint.as_ref()),
                        image: None,
                    });
                }
                let image = media::load_image(&path).map_err(|e| format!("{:#}", e))?;
                log::info!("Loaded image: {} ({}x{})", path.display(), image.width, image.height);
                Ok(LoadedMedia {
                    descriptor: MediaDescriptor::image(path.to_string_lossy(), image.size()),
                    image: Some(image),
                })
            })();

            let _ = sender.send(result);
        });
    }

    fn finish_loading(&mut self, ctx: &egui::Context, loaded: LoadedMedia) {
        self.media_texture = loaded.image.map(|image| {
            let size = [image.width as usize, image.height as usize];
            let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &image.pixels);
            ctx.load_texture("media", color_image, egui::TextureOptions::LINEAR)
        });
        self.status = None;
        self.install_media(loaded.descriptor);
    }

    /// Hand `descriptor` and the document's overlays to the viewer.
    fn install_media(&mut self, descriptor: MediaDescriptor) {
        let records = self
            .document
            .as_ref()
            .map(|d| d.records_for(descriptor.size()))
            .unwrap_or_default();

        self.clock = descriptor.is_video().then(|| ClockMedia::new(descriptor.duration));
        let element = self
            .clock
            .clone()
            .map(|clock| Box::new(clock) as Box<dyn annoview::MediaElement>);
        self.viewer.load_media(descriptor, records, element);
    }

    fn load_overlay_file(&mut self, path: &Path) {
        let document = match serialization::load_overlays(path) {
            Ok(document) => document,
            Err(e) => {
                log::error!("Failed to load overlays: {:#}", e);
                self.status = Some(format!("Failed to load overlays: {}", e));
                return;
            }
        };
        if !document.rejected.is_empty() {
            self.status = Some(format!("{} overlays were skipped", document.rejected.len()));
        }

        self.viewer.set_thumbnails(document.thumbnails.clone());
        let referenced = document.media.as_ref().map(|m| PathBuf::from(&m.source));
        self.document_dir = path.parent().map(Path::to_path_buf);
        self.document = Some(document);

        match self.viewer.media().cloned() {
            Some(current) => self.install_media(current),
            None => {
                // No media yet: open the one the document names
                if let Some(source) = referenced.map(|p| self.resolve(p)) {
                    if source.exists() {
                        self.open_media(source);
                    } else {
                        log::warn!("Referenced media not found: {}", source.display());
                    }
                }
            }
        }
    }

    fn load_options_file(&mut self, path: &Path) {
        match serialization::load_options(path) {
            Ok(patch) => {
                self.viewer.update_options(&patch);
                log::info!("Applied options from {}", path.display());
            }
            Err(e) => {
                log::error!("Failed to load options: {:#}", e);
                self.status = Some(format!("Failed to load options: {}", e));
            }
        }
    }

    fn resolve(&self, path: PathBuf) -> PathBuf {
        match &self.document_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        }
    }

    fn handle_event(&mut self, ctx: &egui::Context, event: ViewerEvent) {
        match event {
            ViewerEvent::FullscreenChanged { fullscreen } => {
                ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(fullscreen));
            }
            ViewerEvent::Error { message, .. } => {
                self.status = Some(message);
            }
            ViewerEvent::ItemSelected { id } => {
                let source = self
                    .document
                    .as_ref()
                    .and_then(|d| d.thumbnails.iter().find(|t| t.id == id))
                    .map(|t| PathBuf::from(&t.thumbnail_source));
                if let Some(source) = source {
                    let source = self.resolve(source);
                    log::info!("Switching to item {} ({})", id, source.display());
                    self.open_media(source);
                }
            }
            ViewerEvent::Shortcut { action } => {
                log::info!("No handler for shortcut action {:?}", action);
            }
            other => log::trace!("{:?}", other),
        }
    }

    fn show_menu(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Media...").clicked() {
                    let mut media_extensions = IMAGE_EXTENSIONS.to_vec();
                    media_extensions.extend_from_slice(VIDEO_EXTENSIONS);
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Media", media_extensions.as_slice())
                        .add_filter("Images", IMAGE_EXTENSIONS)
                        .add_filter("Videos", VIDEO_EXTENSIONS)
                        .pick_file()
                    {
                        self.open_media(path);
                    }
                    ui.close_menu();
                }
                if ui.button("Load Overlays...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Overlays", &["yaml", "yml", "json"])
                        .pick_file()
                    {
                        self.load_overlay_file(&path);
                    }
                    ui.close_menu();
                }
                if ui.button("Load Options...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Options", &["yaml", "yml", "json"])
                        .pick_file()
                    {
                        self.load_options_file(&path);
                    }
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Quit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            ui.menu_button("View", |ui| {
                let panels = self.viewer.panels();
                let has_selection = !self.viewer.selection().selected().is_empty();
                if ui.button("Zoom In").clicked() {
                    self.viewer.zoom_in();
                    ui.close_menu();
                }
                if ui.button("Zoom Out").clicked() {
                    self.viewer.zoom_out();
                    ui.close_menu();
                }
                if ui.button("Reset Zoom").clicked() {
                    self.viewer.reset_zoom();
                    ui.close_menu();
                }
                if ui.add_enabled(has_selection, egui::Button::new("Zoom to Selection")).clicked() {
                    self.viewer.zoom_to_selection();
                    ui.close_menu();
                }
                ui.separator();
                if ui.selectable_label(panels.json, "Label JSON").clicked() {
                    self.viewer.toggle_panel(annoview::Panel::Json);
                    ui.close_menu();
                }
                if ui.selectable_label(panels.thumbnails, "Thumbnails").clicked() {
                    self.viewer.toggle_panel(annoview::Panel::Thumbnails);
                    ui.close_menu();
                }
                if ui.selectable_label(self.viewer.is_fullscreen(), "Fullscreen").clicked() {
                    self.viewer.set_fullscreen(!self.viewer.is_fullscreen());
                    ui.close_menu();
                }
            });

            ui.menu_button("Help", |ui| {
                if ui.button("Keyboard Shortcuts").clicked() {
                    self.viewer.set_panel(annoview::Panel::Help, true);
                    ui.close_menu();
                }
            });

            if let Some(status) = &self.status {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(egui::RichText::new(status).color(ui.visuals().warn_fg_color));
                });
            }
        });
    }

    fn show_canvas(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let (rect, _response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
        let size = Size::new(f64::from(rect.width()), f64::from(rect.height()));
        if self.host.set_size(size) {
            self.viewer.resize(size.width, size.height);
        }

        let keyboard = !ctx.wants_keyboard_input();
        for event in self.input.translate(ctx, rect, ui.layer_id(), keyboard) {
            self.viewer.handle_input(event);
        }

        if let Some(token) = self.host.take_frame() {
            let mut next = FrameBuffer::new(size);
            if self.viewer.on_animation_frame(token, &mut next) {
                self.frame = next;
            }
        }

        let painter = ui.painter_at(rect);
        canvas::paint(&painter, rect.min, self.frame.commands(), self.media_texture.as_ref());

        if self.viewer.media().is_none() {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "File → Open Media...",
                egui::FontId::proportional(16.0),
                egui::Color32::from_gray(150),
            );
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for completed media loading
        if let Some(ref receiver) = self.media_loader {
            if let Ok(result) = receiver.try_recv() {
                self.media_loader = None;
                self.loading_message = None;
                match result {
                    Ok(loaded) => self.finish_loading(ctx, loaded),
                    Err(e) => {
                        log::error!("Failed to load media: {}", e);
                        self.status = Some(e);
                    }
                }
            }
        }

        // Request repaint if still loading (to update spinner)
        if self.loading_message.is_some() {
            ctx.request_repaint();
        }

        if let Some(clock) = self.clock.clone() {
            let dt = f64::from(ctx.input(|i| i.stable_dt));
            for event in clock.tick(dt) {
                self.viewer.on_media_event(event);
            }
            if clock.is_playing() {
                ctx.request_repaint();
            }
        }

        for event in self.viewer.drain_events() {
            self.handle_event(ctx, event);
        }

        if !self.viewer.is_fullscreen() {
            egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| self.show_menu(ctx, ui));
        }

        let is_video = self.viewer.media().is_some_and(MediaDescriptor::is_video);
        if self.viewer.options().show_controls && self.viewer.media().is_some() {
            let state = toolbar::ToolbarState {
                is_video,
                playing: self.viewer.playback().is_playing_or_will_resume(),
                has_selection: !self.viewer.selection().selected().is_empty(),
                panels: self.viewer.panels(),
                fullscreen: self.viewer.is_fullscreen(),
            };
            let (action, seek) = egui::TopBottomPanel::bottom("controls")
                .show(ctx, |ui| {
                    let seek = if is_video {
                        timeline::show(ui, self.viewer.playback())
                    } else {
                        None
                    };
                    (toolbar::show(ui, state), seek)
                })
                .inner;
            if let Some(time) = seek {
                self.viewer.seek(time);
            }
            if let Some(action) = action {
                self.viewer.perform(action);
            }
        }

        if self.viewer.panels().thumbnails {
            let intent = egui::TopBottomPanel::bottom("thumbnails")
                .resizable(false)
                .show(ctx, |ui| thumbnails::show(ui, &self.viewer.thumbnail_props()))
                .inner;
            if let Some(intent) = intent {
                self.viewer.handle_panel_intent(intent);
            }
        }

        if self.viewer.panels().json {
            let intent = egui::SidePanel::right("label_json")
                .default_width(300.0)
                .show(ctx, |ui| properties::show(ui, &self.viewer.json_props()))
                .inner;
            if let Some(intent) = intent {
                self.viewer.handle_panel_intent(intent);
            }
        }

        if self.viewer.panels().help {
            let intent = help::show(ctx, &self.viewer.help_props());
            if let Some(intent) = intent {
                self.viewer.handle_panel_intent(intent);
            }
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                // Show loading overlay if loading
                if let Some(ref message) = self.loading_message {
                    ui.centered_and_justified(|ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);
                            ui.spinner();
                            ui.add_space(10.0);
                            ui.label(
                                egui::RichText::new(message)
                                    .size(16.0)
                                    .color(egui::Color32::from_gray(200)),
                            );
                        });
                    });
                } else {
                    self.show_canvas(ctx, ui);
                }
            });

        // Events raised while laying out this frame
        for event in self.viewer.drain_events() {
            self.handle_event(ctx, event);
        }
    }
}
