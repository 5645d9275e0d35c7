// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data models: overlays, media descriptors, options and selection state.

pub mod media;
pub mod options;
pub mod overlay;
pub mod selection;
