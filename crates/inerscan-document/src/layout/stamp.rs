// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Watermark and text stamps. Text is drawn onto a transparent overlay which
// is then composited over the page, so opacity applies uniformly.

use ab_glyph::FontArc;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use inerscan_core::{Rgb as Colour, WatermarkPosition};
use tracing::{debug, instrument};

use crate::image::matting::overlay_onto;
use crate::image::processor::rotate_rgba;

/// Distance of corner-anchored watermarks from the page edge, in pixels.
const EDGE_MARGIN: i32 = 50;
/// Automatic watermark size as a fraction of the shorter page side.
const AUTO_SIZE_FRACTION: f32 = 0.15;

const TRANSPARENT: Rgba<u8> = Rgba([255, 255, 255, 0]);

/// Appearance of a watermark.
#[derive(Debug, Clone)]
pub struct WatermarkStyle {
    pub text: String,
    pub position: WatermarkPosition,
    /// 0 = invisible, 255 = opaque.
    pub opacity: u8,
    /// Counter-clockwise rotation of the text layer in degrees; the default
    /// -45 runs the text from top-left to bottom-right.
    pub rotation_degrees: f32,
    pub color: Colour,
    /// Pixel height of the text; `None` picks 15% of the shorter side.
    pub font_size: Option<f32>,
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        Self {
            text: "COPY".into(),
            position: WatermarkPosition::Center,
            opacity: 128,
            rotation_degrees: -45.0,
            color: Colour::RED,
            font_size: None,
        }
    }
}

/// Appearance of a free text annotation.
#[derive(Debug, Clone)]
pub struct TextStyle {
    pub font_size: f32,
    pub color: Colour,
    pub opacity: u8,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 40.0,
            color: Colour::BLACK,
            opacity: 255,
        }
    }
}

/// Stamp `style.text` over the page. Output is RGB with unchanged dimensions.
#[instrument(skip(image, font), fields(text = %style.text, position = ?style.position))]
pub fn add_watermark(image: &DynamicImage, style: &WatermarkStyle, font: &FontArc) -> DynamicImage {
    let (w, h) = image.dimensions();
    let size = style
        .font_size
        .unwrap_or_else(|| (w.min(h) as f32 * AUTO_SIZE_FRACTION).floor())
        .max(1.0);

    let (text_w, text_h) = text_size(size, font, &style.text);
    let (x, y) = anchor_origin((w, h), (text_w, text_h), style.position);
    debug!(size, text_w, text_h, x, y, "Watermark placed");

    let mut overlay = RgbaImage::from_pixel(w, h, TRANSPARENT);
    let [r, g, b] = style.color.channels();
    draw_text_mut(&mut overlay, Rgba([r, g, b, style.opacity]), x, y, size, font, &style.text);

    if style.rotation_degrees != 0.0 {
        overlay = rotate_rgba(&overlay, -style.rotation_degrees, false, TRANSPARENT);
    }
    flatten_with_overlay(image, &overlay)
}

/// Draw `text` with its top-left corner at `(x, y)`. Output is RGB with
/// unchanged dimensions.
#[instrument(skip(image, font, style))]
pub fn add_text(
    image: &DynamicImage,
    text: &str,
    (x, y): (i32, i32),
    style: &TextStyle,
    font: &FontArc,
) -> DynamicImage {
    let (w, h) = image.dimensions();
    let mut overlay = RgbaImage::from_pixel(w, h, TRANSPARENT);
    let [r, g, b] = style.color.channels();
    draw_text_mut(
        &mut overlay,
        Rgba([r, g, b, style.opacity]),
        x,
        y,
        style.font_size.max(1.0),
        font,
        text,
    );
    flatten_with_overlay(image, &overlay)
}

/// Top-left corner for text of `text` size anchored at `position` on a
/// canvas of `canvas` size. May be negative when the text is larger than
/// the page.
pub fn anchor_origin(
    (canvas_w, canvas_h): (u32, u32),
    (text_w, text_h): (u32, u32),
    position: WatermarkPosition,
) -> (i32, i32) {
    let (cw, ch) = (canvas_w as i32, canvas_h as i32);
    let (tw, th) = (text_w as i32, text_h as i32);
    match position {
        WatermarkPosition::Center => ((cw - tw).div_euclid(2), (ch - th).div_euclid(2)),
        WatermarkPosition::TopRight => (cw - tw - EDGE_MARGIN, EDGE_MARGIN),
        WatermarkPosition::BottomRight => (cw - tw - EDGE_MARGIN, ch - th - EDGE_MARGIN),
        WatermarkPosition::TopLeft => (EDGE_MARGIN, EDGE_MARGIN),
        WatermarkPosition::BottomLeft => (EDGE_MARGIN, ch - th - EDGE_MARGIN),
    }
}

/// Alpha is dropped, not blended: transparent pixels keep their colour.
fn flatten_with_overlay(image: &DynamicImage, overlay: &RgbaImage) -> DynamicImage {
    let mut base = image.to_rgb8();
    overlay_onto(&mut base, overlay);
    DynamicImage::ImageRgb8(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font::find_system_font;
    use image::{Rgb, RgbImage};

    fn system_font() -> Option<FontArc> {
        let path = find_system_font()?;
        crate::layout::font::load_font(&path).ok()
    }

    #[test]
    fn anchors_respect_margin() {
        let canvas = (1000, 800);
        let text = (200, 100);
        assert_eq!(anchor_origin(canvas, text, WatermarkPosition::Center), (400, 350));
        assert_eq!(anchor_origin(canvas, text, WatermarkPosition::TopRight), (750, 50));
        assert_eq!(anchor_origin(canvas, text, WatermarkPosition::BottomRight), (750, 650));
        assert_eq!(anchor_origin(canvas, text, WatermarkPosition::TopLeft), (50, 50));
        assert_eq!(anchor_origin(canvas, text, WatermarkPosition::BottomLeft), (50, 650));
    }

    #[test]
    fn oversized_text_goes_negative() {
        assert_eq!(
            anchor_origin((100, 100), (300, 20), WatermarkPosition::Center),
            (-100, 40)
        );
    }

    #[test]
    fn default_style_matches_stamp_conventions() {
        let style = WatermarkStyle::default();
        assert_eq!(style.text, "COPY");
        assert_eq!(style.opacity, 128);
        assert_eq!(style.rotation_degrees, -45.0);
        assert_eq!(style.color, Colour::RED);
    }

    #[test]
    fn flattening_drops_alpha_without_blending() {
        let page = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([200, 10, 10, 0])));
        let out = flatten_with_overlay(&page, &RgbaImage::new(4, 4)).to_rgb8();
        assert!(out.pixels().all(|p| *p == Rgb([200, 10, 10])));
    }

    #[test]
    fn watermark_keeps_size_and_marks_page() {
        // Needs a system font; nothing to check on machines without one.
        let Some(font) = system_font() else { return };
        let page = DynamicImage::ImageRgb8(RgbImage::from_pixel(400, 300, Rgb([255, 255, 255])));
        let out = add_watermark(&page, &WatermarkStyle::default(), &font);
        assert_eq!(out.dimensions(), (400, 300));
        assert!(!out.color().has_alpha());
        assert!(out.to_rgb8().pixels().any(|p| p[1] < 255));
    }

    #[test]
    fn text_lands_near_its_origin() {
        let Some(font) = system_font() else { return };
        let page = DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 200, Rgb([255, 255, 255])));
        let out = add_text(&page, "Hi", (20, 20), &TextStyle::default(), &font).to_rgb8();
        assert_eq!(out.dimensions(), (300, 200));
        let inked: Vec<(u32, u32)> = out
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] < 128)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!inked.is_empty());
        assert!(inked.iter().all(|&(x, y)| x >= 18 && y >= 18 && x < 150 && y < 120));
    }
}
