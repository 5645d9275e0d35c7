// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! File I/O for the desktop host: media decoding, overlay documents and
//! options files.

pub mod media;
pub mod serialization;
