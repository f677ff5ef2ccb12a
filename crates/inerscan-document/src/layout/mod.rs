// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout module — page splitting, photo grids, watermarks and text stamps.

pub mod font;
pub mod grid;
pub mod split;
pub mod stamp;

pub use grid::build_photo_grid;
pub use split::split_vertical;
pub use stamp::{TextStyle, WatermarkStyle, add_text, add_watermark};
