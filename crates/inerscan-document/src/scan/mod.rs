// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — text binarization, blank detection, straightening,
// perspective flattening and face redaction.

pub mod deskew;
pub mod enhance;
pub mod faces;
pub mod perspective;

mod geometry;

pub use deskew::{ContourStraightener, ProjectionStraightener, Straightened, Straightener};
pub use enhance::ScanEnhancer;
pub use faces::{FaceDetector, FaceRect, HaarCascade, NoFaceDetector};
