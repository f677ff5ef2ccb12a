// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — quarter-turn and arbitrary rotation, flips, crop,
// resize-to-target, grayscale and alpha-aware brightness/contrast. Operates on
// in-memory images using the `image` and `imageproc` crates.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use inerscan_core::error::{InerScanError, Result};
use inerscan_core::{ResizeMode, Rotation};
use tracing::{debug, info, instrument};

/// Crop rectangle in source-pixel coordinates, right/bottom exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropBox {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Normalise a box dragged in any direction (corners may be swapped).
    pub fn from_corners(a: (u32, u32), b: (u32, u32)) -> Self {
        Self {
            left: a.0.min(b.0),
            top: a.1.min(b.1),
            right: a.0.max(b.0),
            bottom: a.1.max(b.1),
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }
}

/// Image processing pipeline operating on a single in-memory image.
///
/// Each method consumes `self` and returns a new `ImageProcessor` wrapping the
/// transformed image, enabling method chaining.
///
/// ```ignore
/// let result = ImageProcessor::open("scan.png")?
///     .rotate(Rotation::Cw90)
///     .flip_horizontal()
///     .adjust_brightness(1.2)
///     .to_jpeg_bytes(90)?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            InerScanError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Geometry -------------------------------------------------------------

    /// Rotate by a quarter turn (clockwise). Lossless; the canvas swaps its
    /// dimensions for 90/270 so no corner is ever clipped.
    #[instrument(skip(self))]
    pub fn rotate(self, rotation: Rotation) -> Self {
        let image = match rotation {
            Rotation::None => self.image,
            Rotation::Cw90 => self.image.rotate90(),
            Rotation::Cw180 => self.image.rotate180(),
            Rotation::Cw270 => self.image.rotate270(),
        };
        Self { image }
    }

    /// Rotate by an arbitrary angle in degrees (clockwise) about the centre.
    ///
    /// With `expand` the canvas grows to the rotated bounding box; otherwise it
    /// keeps its size and corners are clipped. Uncovered area is filled with
    /// `fill`. Images with an alpha channel stay RGBA, everything else comes
    /// back as RGB.
    #[instrument(skip(self, fill))]
    pub fn rotate_degrees(self, degrees: f32, expand: bool, fill: Rgba<u8>) -> Self {
        let normalised = degrees.rem_euclid(360.0);
        if normalised.abs() < 0.01 || (normalised - 360.0).abs() < 0.01 {
            return self;
        }

        let had_alpha = self.image.color().has_alpha();
        let rotated = rotate_rgba(&self.image.to_rgba8(), degrees, expand, fill);
        debug!(
            degrees,
            expand,
            new_w = rotated.width(),
            new_h = rotated.height(),
            "General rotation applied"
        );

        let image = if had_alpha {
            DynamicImage::ImageRgba8(rotated)
        } else {
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rotated).to_rgb8())
        };
        Self { image }
    }

    /// Mirror left-to-right.
    pub fn flip_horizontal(self) -> Self {
        Self {
            image: self.image.fliph(),
        }
    }

    /// Mirror top-to-bottom.
    pub fn flip_vertical(self) -> Self {
        Self {
            image: self.image.flipv(),
        }
    }

    /// Crop to `region`, clamped to the image bounds.
    ///
    /// Selections narrower or shorter than `min_px` after clamping are rejected
    /// with `SelectionTooSmall`; the processor is consumed either way, so callers
    /// that must keep the original should crop a clone.
    #[instrument(skip(self), fields(?region, min_px))]
    pub fn crop(self, region: CropBox, min_px: u32) -> Result<Self> {
        let img_w = self.image.width();
        let img_h = self.image.height();

        let left = region.left.min(img_w);
        let top = region.top.min(img_h);
        let right = region.right.min(img_w);
        let bottom = region.bottom.min(img_h);
        let width = right.saturating_sub(left);
        let height = bottom.saturating_sub(top);

        if width < min_px || height < min_px {
            return Err(InerScanError::SelectionTooSmall {
                width,
                height,
                min: min_px,
            });
        }

        info!(left, top, width, height, "Cropping image");
        Ok(Self {
            image: self.image.crop_imm(left, top, width, height),
        })
    }

    /// Place the image on an opaque white canvas of exactly
    /// `target_w` x `target_h`.
    ///
    /// `Fit` shrinks (never enlarges) preserving aspect ratio and centres the
    /// result. `CropCenter` takes the centred region of at most the target
    /// size and pads it with white where the source falls short.
    #[instrument(skip(self), fields(target_w, target_h, ?mode))]
    pub fn resize_to_target(self, target_w: u32, target_h: u32, mode: ResizeMode) -> Result<Self> {
        if target_w == 0 || target_h == 0 {
            return Err(InerScanError::InvalidParameter(format!(
                "target size must be positive, got {target_w}x{target_h}"
            )));
        }

        let (img_w, img_h) = self.image.dimensions();
        let placed = match mode {
            ResizeMode::Fit => fit_within(&self.image, target_w, target_h).to_rgb8(),
            ResizeMode::CropCenter => {
                let left = img_w.saturating_sub(target_w) / 2;
                let top = img_h.saturating_sub(target_h) / 2;
                let right = img_w.min(left + target_w);
                let bottom = img_h.min(top + target_h);
                self.image
                    .crop_imm(left, top, right - left, bottom - top)
                    .to_rgb8()
            }
        };

        if placed.dimensions() == (target_w, target_h) {
            return Ok(Self {
                image: DynamicImage::ImageRgb8(placed),
            });
        }

        let mut canvas = RgbImage::from_pixel(target_w, target_h, Rgb([255, 255, 255]));
        let x = (target_w - placed.width()) / 2;
        let y = (target_h - placed.height()) / 2;
        imageops::replace(&mut canvas, &placed, x as i64, y as i64);
        info!(
            from_w = img_w,
            from_h = img_h,
            target_w,
            target_h,
            "Resized onto target canvas"
        );
        Ok(Self {
            image: DynamicImage::ImageRgb8(canvas),
        })
    }

    // -- Tone -----------------------------------------------------------------

    /// Convert to grayscale (luma). Any alpha channel is discarded.
    #[instrument(skip(self))]
    pub fn grayscale(self) -> Self {
        Self {
            image: DynamicImage::ImageLuma8(self.image.to_luma8()),
        }
    }

    /// Make sure the image is RGB, or RGBA if it already carries transparency.
    pub fn normalize_color(self) -> Self {
        let image = match self.image {
            image @ (DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_)) => image,
            other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        };
        Self { image }
    }

    /// Scale every colour channel by `factor` (1.0 = unchanged).
    ///
    /// Transparency is never touched: RGBA input keeps its alpha channel
    /// byte-for-byte.
    #[instrument(skip(self), fields(factor))]
    pub fn adjust_brightness(self, factor: f32) -> Self {
        info!(factor, "Adjusting brightness");
        let image = map_color_channels(self.image, |_| 0.0, factor);
        Self { image }
    }

    /// Scale channel distance from the image's mean luminance by `factor`
    /// (1.0 = unchanged). Alpha is preserved exactly as in
    /// [`adjust_brightness`](Self::adjust_brightness).
    #[instrument(skip(self), fields(factor))]
    pub fn adjust_contrast(self, factor: f32) -> Self {
        info!(factor, "Adjusting contrast");
        let image = map_color_channels(self.image, mean_luma, factor);
        Self { image }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| InerScanError::ImageError(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Write the image to a file. The format is inferred from the file extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        self.image.save(path.as_ref()).map_err(|err| {
            InerScanError::ImageError(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}

// -- Shared raster helpers ----------------------------------------------------

/// Shrink `image` so it fits inside `max_w` x `max_h`, preserving aspect ratio.
/// Images that already fit are returned as-is (no upscaling).
pub fn fit_within(image: &DynamicImage, max_w: u32, max_h: u32) -> DynamicImage {
    let (w, h) = image.dimensions();
    if w <= max_w && h <= max_h {
        return image.clone();
    }
    let scale = (max_w as f64 / w as f64).min(max_h as f64 / h as f64);
    let new_w = ((w as f64 * scale).round() as u32).clamp(1, max_w);
    let new_h = ((h as f64 * scale).round() as u32).clamp(1, max_h);
    image.resize_exact(new_w, new_h, FilterType::Lanczos3)
}

/// Rotate an RGBA raster clockwise by `degrees` about its centre.
pub(crate) fn rotate_rgba(
    rgba: &RgbaImage,
    degrees: f32,
    expand: bool,
    fill: Rgba<u8>,
) -> RgbaImage {
    let (w, h) = rgba.dimensions();
    let theta = degrees.to_radians();
    let (out_w, out_h) = if expand {
        expanded_dimensions(w, h, theta)
    } else {
        (w, h)
    };

    let projection = Projection::translate(out_w as f32 / 2.0, out_h as f32 / 2.0)
        * Projection::rotate(theta)
        * Projection::translate(-(w as f32) / 2.0, -(h as f32) / 2.0);

    let mut output = RgbaImage::from_pixel(out_w, out_h, fill);
    warp_into(rgba, &projection, Interpolation::Bilinear, fill, &mut output);
    output
}

/// Bounding box of a `w` x `h` rectangle rotated by `theta` radians.
fn expanded_dimensions(w: u32, h: u32, theta: f32) -> (u32, u32) {
    let (sin, cos) = (theta.sin().abs() as f64, theta.cos().abs() as f64);
    let (w, h) = (w as f64, h as f64);
    // Tolerance keeps float noise from adding a phantom row or column.
    let new_w = (w * cos + h * sin - 1e-6).ceil().max(1.0) as u32;
    let new_h = (w * sin + h * cos - 1e-6).ceil().max(1.0) as u32;
    (new_w, new_h)
}

/// Mean luminance (ITU-R BT.601) of the colour channels, rounded.
fn mean_luma(rgba: &RgbaImage) -> f32 {
    let count = rgba.width() as f64 * rgba.height() as f64;
    if count == 0.0 {
        return 0.0;
    }
    let sum: f64 = rgba
        .pixels()
        .map(|p| 0.299 * p[0] as f64 + 0.587 * p[1] as f64 + 0.114 * p[2] as f64)
        .sum();
    (sum / count).round() as f32
}

/// Blend each colour channel towards/away from a pivot:
/// `out = pivot + factor * (in - pivot)`.
///
/// Images without transparency come back as RGB; RGBA images keep their
/// alpha channel untouched.
fn map_color_channels(
    image: DynamicImage,
    pivot: impl Fn(&RgbaImage) -> f32,
    factor: f32,
) -> DynamicImage {
    let had_alpha = image.color().has_alpha();
    let mut rgba = image.into_rgba8();
    let pivot = pivot(&rgba);
    let adjust = |channel: u8| -> u8 {
        (pivot + factor * (channel as f32 - pivot))
            .round()
            .clamp(0.0, 255.0) as u8
    };
    for pixel in rgba.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        *pixel = Rgba([adjust(r), adjust(g), adjust(b), a]);
    }
    if had_alpha {
        DynamicImage::ImageRgba8(rgba)
    } else {
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).to_rgb8())
    }
}
