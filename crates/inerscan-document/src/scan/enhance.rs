// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan enhancement pipeline — text binarization, blank-page detection,
// straightening, perspective flattening and face redaction for scanned
// document images.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::{gaussian_blur_f32, laplacian_filter};
use tracing::{debug, info, instrument};

use crate::scan::deskew;
use crate::scan::faces::{self, FaceDetector};
use crate::scan::perspective;

/// Gaussian sigma matching an 11x11 adaptive-threshold neighbourhood.
const ADAPTIVE_SIGMA: f32 = 2.0;
/// Constant subtracted from the weighted local mean.
const ADAPTIVE_C: f32 = 2.0;

/// Enhances scanned document images.
///
/// Wraps one working image and exposes the scan-specific enhancers as a
/// consuming chain, mirroring [`ImageProcessor`](crate::ImageProcessor):
///
/// ```ignore
/// let page = ScanEnhancer::from_dynamic(raw)
///     .straighten()
///     .enhance_text()
///     .into_dynamic();
/// ```
pub struct ScanEnhancer {
    image: DynamicImage,
}

impl ScanEnhancer {
    // -- Construction ---------------------------------------------------------

    /// Wrap an already-decoded image.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Borrow the working image.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the enhancer and return the working image.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Text -----------------------------------------------------------------

    /// Binarize for legibility: grayscale, then Gaussian-weighted adaptive
    /// threshold. Ink becomes black, paper white. Output is single-channel.
    #[instrument(skip(self))]
    pub fn enhance_text(self) -> Self {
        info!("Binarizing for text legibility");
        let gray = self.image.to_luma8();
        Self {
            image: DynamicImage::ImageLuma8(adaptive_threshold(&gray, false)),
        }
    }

    // -- Blank detection ------------------------------------------------------

    /// Variance of the Laplacian of the grayscale image. Low values mean a
    /// page with almost no edges.
    pub fn laplacian_variance(&self) -> f64 {
        laplacian_variance(&self.image.to_luma8())
    }

    /// True when the Laplacian variance is below `threshold`.
    pub fn is_blank(&self, threshold: f64) -> bool {
        detect_blank(&self.image, threshold)
    }

    // -- Geometry -------------------------------------------------------------

    /// Best-effort straightening: the contour method first, then the
    /// projection-profile search when no outline is found.
    pub fn straighten(self) -> Self {
        Self {
            image: deskew::straighten_best_effort(&self.image),
        }
    }

    /// Detect the document quadrilateral and warp it to a flat rectangle.
    pub fn flatten_perspective(self) -> Self {
        Self {
            image: perspective::flatten_perspective(&self.image),
        }
    }

    /// Blur every face region found by `detector`.
    pub fn redact_faces(self, detector: &dyn FaceDetector) -> Self {
        Self {
            image: faces::redact_faces(&self.image, detector),
        }
    }
}

/// Blank-page test without taking ownership of the raster: the Laplacian
/// variance of the grayscale image is below `threshold`.
#[instrument(skip(image), fields(threshold))]
pub fn detect_blank(image: &DynamicImage, threshold: f64) -> bool {
    let variance = laplacian_variance(&image.to_luma8());
    debug!(variance, threshold, "Blank page check");
    variance < threshold
}

/// Gaussian-weighted adaptive threshold over an 11x11 neighbourhood with
/// offset 2. A pixel is foreground (255) when it is brighter than the local
/// weighted mean minus the offset; `invert` swaps foreground and background
/// so dark ink becomes 255.
pub(crate) fn adaptive_threshold(gray: &GrayImage, invert: bool) -> GrayImage {
    let local_mean = gaussian_blur_f32(gray, ADAPTIVE_SIGMA);
    let (on, off) = if invert { (0u8, 255u8) } else { (255u8, 0u8) };
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = gray.get_pixel(x, y)[0] as f32;
        let threshold = local_mean.get_pixel(x, y)[0] as f32 - ADAPTIVE_C;
        Luma([if value > threshold { on } else { off }])
    })
}

/// Population variance of the 3x3 Laplacian response.
pub(crate) fn laplacian_variance(gray: &GrayImage) -> f64 {
    let response = laplacian_filter(gray);
    let count = response.width() as f64 * response.height() as f64;
    if count == 0.0 {
        return 0.0;
    }
    let (sum, sum_sq) = response.pixels().fold((0.0f64, 0.0f64), |(s, sq), p| {
        let v = p[0] as f64;
        (s + v, sq + v * v)
    });
    let mean = sum / count;
    (sum_sq / count - mean * mean).max(0.0)
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn solid_white_page_is_blank() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, Rgb([255, 255, 255])));
        let enhancer = ScanEnhancer::from_dynamic(img);
        assert_eq!(enhancer.laplacian_variance(), 0.0);
        assert!(enhancer.is_blank(100.0));
    }

    #[test]
    fn checkerboard_is_not_blank() {
        let img = GrayImage::from_fn(64, 64, |x, y| {
            Luma([if (x / 4 + y / 4) % 2 == 0 { 0 } else { 255 }])
        });
        let enhancer = ScanEnhancer::from_dynamic(DynamicImage::ImageLuma8(img));
        assert!(!enhancer.is_blank(100.0));
    }

    #[test]
    fn enhance_text_binarizes() {
        let mut img = GrayImage::from_pixel(60, 60, Luma([200]));
        for x in 10..50 {
            for y in 28..32 {
                img.put_pixel(x, y, Luma([40]));
            }
        }
        let out = ScanEnhancer::from_dynamic(DynamicImage::ImageLuma8(img))
            .enhance_text()
            .into_dynamic()
            .to_luma8();
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
        // Ink stroke goes black, flat paper stays white.
        assert_eq!(out.get_pixel(30, 30)[0], 0);
        assert_eq!(out.get_pixel(5, 5)[0], 255);
    }

    #[test]
    fn inverted_threshold_marks_ink() {
        let mut img = GrayImage::from_pixel(30, 30, Luma([220]));
        img.put_pixel(15, 15, Luma([10]));
        let out = adaptive_threshold(&img, true);
        assert_eq!(out.get_pixel(15, 15)[0], 255);
        assert_eq!(out.get_pixel(2, 2)[0], 0);
    }
}
