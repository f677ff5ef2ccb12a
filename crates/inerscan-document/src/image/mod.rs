// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — geometry, tone adjustment and background matting.

pub mod matting;
pub mod processor;

pub use processor::{CropBox, ImageProcessor};
