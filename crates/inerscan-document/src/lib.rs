// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// inerscan-document — Raster processing for the InerScan document editor.
//
// Provides geometric and tone primitives, background matting, document
// enhancers (binarization, blank detection, deskew, perspective flattening,
// face redaction), page layout (split, photo grid, watermark, text) and
// multi-page PDF export.

pub mod image;
pub mod layout;
pub mod pdf;
pub mod scan;

// Re-export the primary structs so callers can use `inerscan_document::PdfWriter` etc.
pub use image::processor::{CropBox, ImageProcessor};
pub use pdf::writer::PdfWriter;
pub use scan::enhance::ScanEnhancer;
