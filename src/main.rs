// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! annoview - desktop viewer for annotated images and videos.

mod app;
mod host;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use app::{StartupFiles, ViewerApp};

const USAGE: &str = "\
Usage: annoview [OPTIONS] [MEDIA]

Arguments:
  [MEDIA]            Image or video to open

Options:
  --overlays FILE    Overlay document (.json, .yaml, .yml)
  --options FILE     Viewer options (.json, .yaml, .yml)
  -h, --help         Print this help
";

fn parse_args() -> Result<Option<StartupFiles>> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        print!("{}", USAGE);
        return Ok(None);
    }

    let overlays: Option<PathBuf> = args.opt_value_from_str("--overlays")?;
    let options: Option<PathBuf> = args.opt_value_from_str("--options")?;
    let mut rest = args.finish().into_iter();
    let media = rest.next().map(PathBuf::from);
    if let Some(extra) = rest.next() {
        anyhow::bail!("Unexpected argument {:?}\n\n{}", extra, USAGE);
    }

    Ok(Some(StartupFiles {
        media,
        overlays,
        options,
    }))
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let Some(startup) = parse_args()? else {
        return Ok(());
    };

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([640.0, 400.0])
            .with_title("annoview"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "annoview",
        options,
        Box::new(|cc| Ok(Box::new(ViewerApp::new(&cc.egui_ctx, startup)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
