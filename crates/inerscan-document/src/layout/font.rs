// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Font lookup for stamps and annotations.

use std::path::{Path, PathBuf};

use ab_glyph::FontArc;
use inerscan_core::error::{InerScanError, Result};
use tracing::{debug, info};

/// Bold sans-serif faces tried in order when no font is configured.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "C:\\Windows\\Fonts\\arialbd.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
];

/// Load a TrueType/OpenType font file.
pub fn load_font(path: &Path) -> Result<FontArc> {
    let bytes = std::fs::read(path)?;
    let font = FontArc::try_from_vec(bytes).map_err(|err| {
        InerScanError::ImageError(format!("unusable font {}: {err}", path.display()))
    })?;
    info!(path = %path.display(), "Font loaded");
    Ok(font)
}

/// Use `configured` if given, otherwise the first system font that exists.
pub fn resolve_font(configured: Option<&Path>) -> Result<FontArc> {
    if let Some(path) = configured {
        return load_font(path);
    }
    let path = find_system_font().ok_or_else(|| {
        InerScanError::ImageError(
            "no usable font found; set font_path in the configuration".into(),
        )
    })?;
    debug!(path = %path.display(), "Using system font");
    load_font(&path)
}

pub fn find_system_font() -> Option<PathBuf> {
    SYSTEM_FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_font_file_is_an_error() {
        assert!(load_font(Path::new("/definitely/not/here.ttf")).is_err());
    }

    #[test]
    fn garbage_font_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        match load_font(&path) {
            Err(InerScanError::ImageError(msg)) => assert!(msg.contains("unusable font")),
            other => panic!("expected ImageError, got {:?}", other.is_ok()),
        }
    }
}
