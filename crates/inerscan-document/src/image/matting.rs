// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background matting — knock out near-white paper, trim to the visible
// content, and flatten transparency onto a solid colour.

use image::{DynamicImage, GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};
use inerscan_core::Rgb as Colour;
use tracing::{debug, instrument};

/// Make every pixel whose R, G and B all exceed `threshold` fully
/// transparent. Other pixels keep the alpha they already had (opaque for RGB
/// input). Dimensions never change.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn remove_near_white(image: &DynamicImage, threshold: u8) -> DynamicImage {
    let mut rgba = image.to_rgba8();
    let mut cleared = 0usize;
    for pixel in rgba.pixels_mut() {
        if pixel[0] > threshold && pixel[1] > threshold && pixel[2] > threshold {
            pixel[3] = 0;
            cleared += 1;
        }
    }
    debug!(cleared, threshold, "Background removed");
    DynamicImage::ImageRgba8(rgba)
}

/// Crop to the bounding box of pixels with non-zero alpha.
///
/// Returns the input unchanged when it has no alpha channel or when every
/// pixel is transparent.
#[instrument(skip(image))]
pub fn auto_crop_to_content(image: &DynamicImage) -> DynamicImage {
    if !image.color().has_alpha() {
        return image.clone();
    }

    let rgba = image.to_rgba8();
    let Some((left, top, right, bottom)) = alpha_bounds(&rgba) else {
        debug!("Image fully transparent, nothing to crop");
        return image.clone();
    };
    debug!(left, top, right, bottom, "Cropping to visible content");
    image.crop_imm(left, top, right - left, bottom - top)
}

/// Alpha-composite the image over an opaque `background`, producing RGB.
/// Opaque images come back as a plain RGB copy.
pub fn composite_on_color(image: &DynamicImage, background: Colour) -> DynamicImage {
    if !image.color().has_alpha() {
        return DynamicImage::ImageRgb8(image.to_rgb8());
    }
    let rgba = image.to_rgba8();
    let bg = background.channels();
    let out = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        Rgb([blend(r, bg[0], a), blend(g, bg[1], a), blend(b, bg[2], a)])
    });
    DynamicImage::ImageRgb8(out)
}

/// Composite a straight-alpha `overlay` onto an opaque RGB `base` of the same
/// size, in place.
pub(crate) fn overlay_onto(base: &mut RgbImage, overlay: &RgbaImage) {
    for (dst, src) in base.pixels_mut().zip(overlay.pixels()) {
        let a = src[3];
        if a == 0 {
            continue;
        }
        for c in 0..3 {
            dst[c] = blend(src[c], dst[c], a);
        }
    }
}

/// "Over" for one channel: `fg * a + bg * (1 - a)`, alpha in 0..=255.
fn blend(fg: u8, bg: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    ((fg as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8
}

/// Half-open bounding box `(left, top, right, bottom)` of non-transparent
/// pixels, or `None` if there are none.
fn alpha_bounds(rgba: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in rgba.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x + 1, y + 1),
            Some((l, t, r, b)) => (l.min(x), t.min(y), r.max(x + 1), b.max(y + 1)),
        });
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_white_becomes_transparent() {
        let mut rgb = RgbImage::from_pixel(2, 1, Rgb([250, 250, 250]));
        rgb.put_pixel(1, 0, Rgb([0, 0, 0]));
        let out = remove_near_white(&DynamicImage::ImageRgb8(rgb), 230).to_rgba8();
        assert_eq!(out.dimensions(), (2, 1));
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(1, 0), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn threshold_is_strict_per_channel() {
        // One channel at the threshold keeps the pixel opaque.
        let rgb = RgbImage::from_pixel(1, 1, Rgb([255, 230, 255]));
        let out = remove_near_white(&DynamicImage::ImageRgb8(rgb), 230).to_rgba8();
        assert_eq!(out.get_pixel(0, 0)[3], 255);
    }

    #[test]
    fn auto_crop_trims_transparent_border() {
        let mut rgba = RgbaImage::from_pixel(20, 10, Rgba([0, 0, 0, 0]));
        for x in 5..9 {
            for y in 2..7 {
                rgba.put_pixel(x, y, Rgba([10, 20, 30, 255]));
            }
        }
        let out = auto_crop_to_content(&DynamicImage::ImageRgba8(rgba));
        assert_eq!(out.dimensions(), (4, 5));
    }

    #[test]
    fn auto_crop_leaves_opaque_and_empty_images() {
        let rgb = DynamicImage::ImageRgb8(RgbImage::new(7, 3));
        assert_eq!(auto_crop_to_content(&rgb).dimensions(), (7, 3));
        let clear = DynamicImage::ImageRgba8(RgbaImage::new(7, 3));
        assert_eq!(auto_crop_to_content(&clear).dimensions(), (7, 3));
    }

    #[test]
    fn composite_blends_by_alpha() {
        let mut rgba = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([0, 0, 0, 128]));
        let out = composite_on_color(&DynamicImage::ImageRgba8(rgba), Colour::WHITE).to_rgb8();
        assert_eq!(out.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(out.get_pixel(1, 0), &Rgb([127, 127, 127]));
    }
}
