// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media descriptors supplied by the host.
//!
//! The viewer never fetches bytes itself; a descriptor only names the
//! source and carries the dimensions (and duration, for video) the
//! transform and playback controller need.

use serde::{Deserialize, Serialize};

use crate::util::geometry::Size;

/// Whether the media is a still image or time-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// A single media item to display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    /// Source reference (path or URL) understood by the host.
    pub source: String,
    pub kind: MediaKind,
    pub width: f64,
    pub height: f64,
    /// Known duration in seconds; video metadata may supply it later.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f64>,
}

impl MediaDescriptor {
    pub fn image(source: impl Into<String>, size: Size) -> Self {
        Self {
            source: source.into(),
            kind: MediaKind::Image,
            width: size.width,
            height: size.height,
            duration: None,
            frame_rate: None,
        }
    }

    pub fn video(source: impl Into<String>, size: Size, duration: Option<f64>) -> Self {
        Self {
            source: source.into(),
            kind: MediaKind::Video,
            width: size.width,
            height: size.height,
            duration,
            frame_rate: None,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

/// Entry shown by the thumbnail selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailItem {
    pub id: String,
    pub thumbnail_source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_from_json() {
        let json = r#"{"source": "clip.mp4", "kind": "video", "width": 640, "height": 360, "duration": 12.5}"#;
        let media: MediaDescriptor = serde_json::from_str(json).unwrap();
        assert!(media.is_video());
        assert_eq!(media.size(), Size::new(640.0, 360.0));
        assert_eq!(media.duration, Some(12.5));
        assert_eq!(media.frame_rate, None);
    }

    #[test]
    fn thumbnail_uses_camel_case() {
        let item: ThumbnailItem = serde_json::from_str(r#"{"id": "s1", "thumbnailSource": "s1.jpg"}"#).unwrap();
        assert_eq!(item.thumbnail_source, "s1.jpg");
    }
}
