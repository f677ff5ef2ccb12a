// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Persistent application settings.
///
/// Stored as `config.json` in the data directory. Unknown or missing fields
/// fall back to their defaults so older files keep loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Maximum number of undo snapshots kept per page.
    pub undo_limit: usize,
    /// Pause between acquisitions in batch-scan mode, in milliseconds.
    pub batch_delay_ms: u64,
    /// Drop blank pages during scanning instead of adding them.
    pub skip_blank_pages: bool,
    /// Laplacian variance below which a page counts as blank.
    pub blank_variance_threshold: f64,
    /// Channel value above which a pixel counts as background white.
    pub background_threshold: u8,
    /// Smallest accepted crop selection edge, in pixels.
    pub min_crop_px: u32,
    /// Target used by "resize to paper".
    pub default_paper_size: crate::PaperSize,
    /// Resolution used to size PDF pages from raster dimensions.
    pub export_dpi: u32,
    /// JPEG quality for single-page export (1-100).
    pub jpeg_quality: u8,
    /// TrueType/OpenType font used for watermarks and text annotations.
    pub font_path: Option<PathBuf>,
    /// OpenCV-format Haar cascade used for face redaction.
    pub face_cascade_path: Option<PathBuf>,
    /// Timeout for remote intelligence calls.
    pub remote_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            undo_limit: 20,
            batch_delay_ms: 2000,
            skip_blank_pages: true,
            blank_variance_threshold: 100.0,
            background_threshold: 230,
            min_crop_px: 10,
            default_paper_size: crate::PaperSize::A4,
            export_dpi: 300,
            jpeg_quality: 90,
            font_path: None,
            face_cascade_path: None,
            remote_timeout_secs: 120,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{ "undo_limit": 5 }"#).unwrap();
        assert_eq!(config.undo_limit, 5);
        assert_eq!(config.batch_delay_ms, 2000);
        assert_eq!(config.background_threshold, 230);
        assert!(config.font_path.is_none());
    }
}
