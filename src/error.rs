// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Viewer error taxonomy.
//!
//! None of these are fatal. Structural problems (bad overlays, bad option
//! values, conflicting pointers) are recovered where they happen; media load
//! failures are surfaced to the host, which is the only party able to supply
//! a replacement source.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised inside the viewer engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewerError {
    #[error("failed to load media {source_ref:?}: {message}")]
    MediaLoad { source_ref: String, message: String },

    #[error("overlay {id:?} dropped: {reason}")]
    InvalidOverlayGeometry { id: String, reason: String },

    #[error("option {key:?} value {value} is out of range, using {clamped_to}")]
    UnsupportedOptionValue {
        key: String,
        value: String,
        clamped_to: String,
    },

    #[error("pointer {pointer_id} ignored during an active gesture")]
    GestureConflict { pointer_id: i64 },
}

/// Error category carried by outbound `error` and `warning` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    MediaLoad,
    InvalidOverlayGeometry,
    UnsupportedOptionValue,
    GestureConflict,
}

impl ViewerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ViewerError::MediaLoad { .. } => ErrorKind::MediaLoad,
            ViewerError::InvalidOverlayGeometry { .. } => ErrorKind::InvalidOverlayGeometry,
            ViewerError::UnsupportedOptionValue { .. } => ErrorKind::UnsupportedOptionValue,
            ViewerError::GestureConflict { .. } => ErrorKind::GestureConflict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_and_kinds() {
        let err = ViewerError::InvalidOverlayGeometry {
            id: "a".into(),
            reason: "empty".into(),
        };
        assert_eq!(err.to_string(), "overlay \"a\" dropped: empty");
        assert_eq!(err.kind(), ErrorKind::InvalidOverlayGeometry);
        assert_eq!(
            serde_json::to_string(&ErrorKind::UnsupportedOptionValue).unwrap(),
            "\"unsupported-option-value\""
        );
    }
}
