// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media file loading for the desktop host.
//!
//! Images are decoded to RGBA8 with the `image` crate. Videos are not
//! decoded here; they get a descriptor and are played by a clock-driven
//! element in the app.

use anyhow::{Context, Result};
use std::path::Path;

use crate::models::media::MediaDescriptor;
use crate::util::geometry::Size;

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv", "avi", "m4v"];
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "tiff", "tif", "webp"];

/// Fallback frame size for videos whose overlay document omits one.
const DEFAULT_VIDEO_SIZE: Size = Size {
    width: 1280.0,
    height: 720.0,
};

/// Decoded image pixels.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    /// Unmultiplied RGBA8, row major.
    pub pixels: Vec<u8>,
}

impl LoadedImage {
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

pub fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decode an image file to RGBA8.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let img = image::open(path).with_context(|| format!("Failed to decode {}", path.display()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    log::debug!("Decoded {} ({}x{})", path.display(), width, height);
    Ok(LoadedImage {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

/// Descriptor for a video file. Size and duration come from `hint` (the
/// overlay document's media entry) when present.
pub fn video_descriptor(path: &Path, hint: Option<&MediaDescriptor>) -> MediaDescriptor {
    let source = path.to_string_lossy().to_string();
    match hint.filter(|h| h.is_video() && h.size().is_positive()) {
        Some(h) => MediaDescriptor {
            source,
            ..h.clone()
        },
        None => {
            log::warn!(
                "No frame size known for {}, assuming {}x{}",
                path.display(),
                DEFAULT_VIDEO_SIZE.width,
                DEFAULT_VIDEO_SIZE.height
            );
            MediaDescriptor::video(source, DEFAULT_VIDEO_SIZE, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_extensions() {
        assert!(is_video(Path::new("clip.MP4")));
        assert!(!is_video(Path::new("photo.png")));
        assert!(!is_video(Path::new("noext")));
    }

    #[test]
    fn video_descriptor_uses_hint() {
        let hint = MediaDescriptor::video("other.mp4", Size::new(640.0, 360.0), Some(12.0));
        let d = video_descriptor(Path::new("clip.mp4"), Some(&hint));
        assert_eq!(d.source, "clip.mp4");
        assert_eq!(d.size(), Size::new(640.0, 360.0));
        assert_eq!(d.duration, Some(12.0));

        let d = video_descriptor(Path::new("clip.mp4"), None);
        assert_eq!(d.size(), DEFAULT_VIDEO_SIZE);
    }

    #[test]
    fn decode_png_roundtrip() {
        let path = std::env::temp_dir().join("annoview-media-test.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        let loaded = load_image(&path).unwrap();
        assert_eq!((loaded.width, loaded.height), (3, 2));
        assert_eq!(&loaded.pixels[..4], &[10, 20, 30, 255]);
        let _ = std::fs::remove_file(path);
    }
}
