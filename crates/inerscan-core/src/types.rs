// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the InerScan document editor.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{InerScanError, Result};

/// Unique identifier for a document page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId(pub Uuid);

impl PageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quarter-turn page rotation, clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    /// Build from any multiple of 90 degrees (negative values turn
    /// counter-clockwise).
    pub fn from_degrees(degrees: i32) -> Result<Self> {
        if degrees % 90 != 0 {
            return Err(InerScanError::InvalidParameter(format!(
                "rotation must be a multiple of 90 degrees, got {degrees}"
            )));
        }
        Ok(match degrees.rem_euclid(360) {
            0 => Self::None,
            90 => Self::Cw90,
            180 => Self::Cw180,
            _ => Self::Cw270,
        })
    }

    pub fn degrees(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Cw90 => 90,
            Self::Cw180 => 180,
            Self::Cw270 => 270,
        }
    }

    /// Compose with a further turn of `degrees`.
    pub fn turned_by(self, degrees: i32) -> Result<Self> {
        Self::from_degrees(self.degrees() + degrees)
    }
}

/// An opaque RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const RED: Rgb = Rgb(255, 0, 0);

    pub fn channels(self) -> [u8; 3] {
        [self.0, self.1, self.2]
    }
}

/// Standard paper sizes, as pixel dimensions at 300 DPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom { width_px: u32, height_px: u32 },
}

impl PaperSize {
    /// Dimensions in pixels (width, height) at 300 DPI.
    pub fn dimensions_px(&self) -> (u32, u32) {
        match self {
            Self::A4 => (2480, 3508),
            Self::A3 => (3508, 4961),
            Self::A5 => (1748, 2480),
            Self::Letter => (2550, 3300),
            Self::Legal => (2550, 4200),
            Self::Custom {
                width_px,
                height_px,
            } => (*width_px, *height_px),
        }
    }

    /// Parse a preset name (`a4`, `letter`, ...) or a custom `WxH` size.
    pub fn parse(spec: &str) -> Result<Self> {
        match spec.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "a3" => Ok(Self::A3),
            "a5" => Ok(Self::A5),
            "letter" => Ok(Self::Letter),
            "legal" => Ok(Self::Legal),
            other => {
                let (width_px, height_px) = parse_dimensions(other)?;
                Ok(Self::Custom {
                    width_px,
                    height_px,
                })
            }
        }
    }
}

/// How an image is fitted onto a fixed-size target canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeMode {
    /// Preserve aspect ratio, letterbox onto white.
    Fit,
    /// Crop the centred region, pad with white where the source is short.
    CropCenter,
}

/// Anchor for a watermark stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WatermarkPosition {
    #[default]
    Center,
    TopRight,
    BottomRight,
    TopLeft,
    BottomLeft,
}

impl WatermarkPosition {
    /// Parse a position keyword. Unknown keywords (including the legacy
    /// `diagonal`) fall back to `Center`.
    pub fn parse(keyword: &str) -> Self {
        match keyword.trim().to_ascii_lowercase().as_str() {
            "top-right" => Self::TopRight,
            "bottom-right" => Self::BottomRight,
            "top-left" => Self::TopLeft,
            "bottom-left" => Self::BottomLeft,
            _ => Self::Center,
        }
    }
}

/// Largest column or row count a parsed grid layout may have.
pub const MAX_GRID_SIDE: u32 = 100;

/// Columns x rows of a photo grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub cols: u32,
    pub rows: u32,
}

impl GridLayout {
    /// Parse a `CxR` layout string such as `2x2` or `3X2`. Each side is at
    /// most [`MAX_GRID_SIDE`].
    pub fn parse(spec: &str) -> Result<Self> {
        let (cols, rows) = parse_dimensions(&spec.trim().to_ascii_lowercase())?;
        if cols > MAX_GRID_SIDE || rows > MAX_GRID_SIDE {
            return Err(InerScanError::InvalidParameter(format!(
                "grid layout {cols}x{rows} exceeds {MAX_GRID_SIDE} cells per side"
            )));
        }
        Ok(Self { cols, rows })
    }

    pub fn slots(&self) -> usize {
        self.cols as usize * self.rows as usize
    }
}

impl std::fmt::Display for GridLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}

/// Parse a lowercase `AxB` pair of positive integers.
fn parse_dimensions(spec: &str) -> Result<(u32, u32)> {
    let invalid = || InerScanError::InvalidParameter(format!("expected 'WxH', got '{spec}'"));
    let (a, b) = spec.split_once('x').ok_or_else(invalid)?;
    let a: u32 = a.trim().parse().map_err(|_| invalid())?;
    let b: u32 = b.trim().parse().map_err(|_| invalid())?;
    if a == 0 || b == 0 {
        return Err(invalid());
    }
    Ok((a, b))
}

/// Kind of file produced by an export, as recorded in the scan history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportKind {
    Jpeg,
    Pdf,
}

impl ExportKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Pdf => "PDF",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Pdf => "pdf",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_wraps_both_directions() {
        assert_eq!(Rotation::from_degrees(450).unwrap(), Rotation::Cw90);
        assert_eq!(Rotation::from_degrees(-90).unwrap(), Rotation::Cw270);
        assert_eq!(Rotation::Cw270.turned_by(90).unwrap(), Rotation::None);
        assert!(Rotation::from_degrees(45).is_err());
    }

    #[test]
    fn paper_presets_and_custom() {
        assert_eq!(PaperSize::parse("A4").unwrap().dimensions_px(), (2480, 3508));
        assert_eq!(
            PaperSize::parse("800x600").unwrap(),
            PaperSize::Custom {
                width_px: 800,
                height_px: 600
            }
        );
        assert!(PaperSize::parse("tabloid").is_err());
    }

    #[test]
    fn grid_layout_parsing() {
        let layout = GridLayout::parse("3X2").unwrap();
        assert_eq!((layout.cols, layout.rows), (3, 2));
        assert_eq!(layout.slots(), 6);
        assert!(GridLayout::parse("0x2").is_err());
        assert!(GridLayout::parse("2by2").is_err());
        assert!(GridLayout::parse("100x100").is_ok());
        assert!(GridLayout::parse("101x1").is_err());
        assert!(GridLayout::parse("4000000000x1").is_err());
    }

    #[test]
    fn watermark_position_fallback() {
        assert_eq!(WatermarkPosition::parse("top-left"), WatermarkPosition::TopLeft);
        assert_eq!(WatermarkPosition::parse("diagonal"), WatermarkPosition::Center);
    }
}
