// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Overlay documents and options files.
//!
//! Both are accepted as YAML or JSON, chosen by file extension. An overlay
//! document names the media it belongs to and lists its overlays; records
//! that fail to parse or validate are dropped one at a time so a single
//! bad record never rejects the whole file.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use crate::error::ViewerError;
use crate::models::media::{MediaDescriptor, ThumbnailItem};
use crate::models::overlay::OverlayRecord;
use crate::util::geometry::Size;

/// Serialized file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path.extension().and_then(|s| s.to_str());
        match extension.map(str::to_ascii_lowercase).as_deref() {
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            Some("json") => Ok(Format::Json),
            _ => bail!("Unsupported file extension: {:?}", extension),
        }
    }

    fn parse(self, text: &str) -> Result<Value> {
        let value = match self {
            Format::Json => serde_json::from_str(text).context("Invalid JSON")?,
            Format::Yaml => serde_yaml::from_str(text).context("Invalid YAML")?,
        };
        Ok(value)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    #[serde(default)]
    media: Option<MediaDescriptor>,
    /// Geometry is in `[0, 1]` relative coordinates.
    #[serde(default)]
    relative: bool,
    #[serde(default)]
    overlays: Vec<Value>,
    #[serde(default)]
    thumbnails: Vec<ThumbnailItem>,
}

/// A parsed overlay document.
#[derive(Debug, Clone, Default)]
pub struct OverlayDocument {
    pub media: Option<MediaDescriptor>,
    pub relative: bool,
    pub overlays: Vec<OverlayRecord>,
    pub thumbnails: Vec<ThumbnailItem>,
    /// Records that could not be parsed.
    pub rejected: Vec<ViewerError>,
}

impl OverlayDocument {
    /// Records in media space for media of `size`.
    pub fn records_for(&self, size: Size) -> Vec<OverlayRecord> {
        if !self.relative {
            return self.overlays.clone();
        }
        self.overlays
            .iter()
            .map(|r| OverlayRecord {
                geometry: r.geometry.denormalize(size),
                ..r.clone()
            })
            .collect()
    }
}

/// Parse an overlay document from text.
pub fn parse_overlays(text: &str, format: Format) -> Result<OverlayDocument> {
    let raw: RawDocument = serde_json::from_value(format.parse(text)?).context("Malformed overlay document")?;

    let mut doc = OverlayDocument {
        media: raw.media,
        relative: raw.relative,
        thumbnails: raw.thumbnails,
        ..OverlayDocument::default()
    };
    for (i, value) in raw.overlays.into_iter().enumerate() {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .map_or_else(|| format!("#{}", i), str::to_string);
        match serde_json::from_value::<OverlayRecord>(value) {
            Ok(record) => doc.overlays.push(record),
            Err(e) => {
                let err = ViewerError::InvalidOverlayGeometry {
                    id,
                    reason: e.to_string(),
                };
                log::warn!("{}", err);
                doc.rejected.push(err);
            }
        }
    }
    log::debug!(
        "Parsed {} overlays ({} rejected, relative={})",
        doc.overlays.len(),
        doc.rejected.len(),
        doc.relative
    );
    Ok(doc)
}

/// Load an overlay document from a `.json`, `.yaml` or `.yml` file.
pub fn load_overlays(path: &Path) -> Result<OverlayDocument> {
    let format = Format::from_path(path)?;
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let doc = parse_overlays(&text, format).with_context(|| format!("Failed to parse {}", path.display()))?;
    log::info!("Loaded {} overlays from {}", doc.overlays.len(), path.display());
    Ok(doc)
}

/// Load a partial options object, ready for `Viewer::update_options`.
pub fn load_options(path: &Path) -> Result<Value> {
    let format = Format::from_path(path)?;
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let value = format
        .parse(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    if !value.is_object() {
        bail!("{} does not contain an options object", path.display());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::overlay::Geometry;
    use crate::test_utils::assert_abs_diff_eq;
    use crate::util::geometry::Rect;

    const YAML: &str = r#"
media:
  source: street.jpg
  kind: image
  width: 640
  height: 480
relative: true
overlays:
  - id: car-1
    field: detections
    label: car
    confidence: 0.91
    kind: box
    bounds: {x: 0.25, y: 0.5, width: 0.5, height: 0.25}
  - id: broken
    kind: box
  - id: kp
    kind: keypoints
    points: [{x: 0.5, y: 0.5}]
"#;

    #[test]
    fn yaml_document_with_relative_geometry() {
        let doc = parse_overlays(YAML, Format::Yaml).unwrap();
        assert_eq!(doc.overlays.len(), 2);
        assert_eq!(doc.rejected.len(), 1);
        assert!(matches!(&doc.rejected[0], ViewerError::InvalidOverlayGeometry { id, .. } if id == "broken"));

        let media = doc.media.as_ref().unwrap();
        let records = doc.records_for(media.size());
        match &records[0].geometry {
            Geometry::Box { bounds } => assert_eq!(*bounds, Rect::new(160.0, 240.0, 320.0, 120.0)),
            other => panic!("unexpected geometry {:?}", other),
        }
        match &records[1].geometry {
            Geometry::Keypoints { points } => {
                assert_abs_diff_eq!(points[0].x, 320.0);
                assert_abs_diff_eq!(points[0].y, 240.0);
            }
            other => panic!("unexpected geometry {:?}", other),
        }
        assert_eq!(records[0].label.as_deref(), Some("car"));
    }

    #[test]
    fn json_document_in_pixels() {
        let json = r#"{"overlays": [{"id": "a", "kind": "classification", "label": "night"}]}"#;
        let doc = parse_overlays(json, Format::Json).unwrap();
        assert!(doc.media.is_none());
        assert_eq!(doc.records_for(Size::new(10.0, 10.0)), doc.overlays);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(Format::from_path(Path::new("labels.txt")).is_err());
        assert_eq!(Format::from_path(Path::new("labels.YML")).unwrap(), Format::Yaml);
    }

    #[test]
    fn options_file_must_be_an_object() {
        let dir = std::env::temp_dir();
        let good = dir.join("annoview-options-test.json");
        std::fs::write(&good, r#"{"showLabel": false}"#).unwrap();
        assert_eq!(load_options(&good).unwrap()["showLabel"], false);

        let bad = dir.join("annoview-options-test.yaml");
        std::fs::write(&bad, "- 1\n- 2\n").unwrap();
        assert!(load_options(&bad).is_err());
        let _ = std::fs::remove_file(good);
        let _ = std::fs::remove_file(bad);
    }
}
