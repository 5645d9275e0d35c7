// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! egui widgets for the desktop viewer.

pub mod canvas;
pub mod help;
pub mod properties;
pub mod thumbnails;
pub mod timeline;
pub mod toolbar;
