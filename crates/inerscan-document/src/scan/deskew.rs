// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Straightening of slightly rotated scans.
//
// Two strategies share the `Straightener` contract: a contour method that
// measures the tilt of the dominant outline, and a projection-profile search
// that needs no outline at all. `straighten_best_effort` tries them in order.

use image::{DynamicImage, GrayImage, Luma, Rgba};
use imageproc::contours::find_contours;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use imageproc::geometry::contour_area;
use imageproc::point::Point;
use inerscan_core::Rgb;
use tracing::{debug, info, instrument};

use crate::image::matting::composite_on_color;
use crate::image::processor::ImageProcessor;
use crate::scan::enhance::adaptive_threshold;
use crate::scan::geometry::min_area_rect_angle;

/// Tilts smaller than this are left alone, in degrees.
const MIN_CORRECTION_DEG: f64 = 0.3;
/// Gaussian sigma matching a 5x5 smoothing kernel.
const SMOOTHING_SIGMA: f32 = 1.1;
/// Projection search covers -RANGE..=RANGE whole degrees.
const PROJECTION_RANGE_DEG: i32 = 10;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Result of a straightening attempt.
pub enum Straightened {
    /// The image was rotated by `angle` degrees (clockwise positive) and the
    /// canvas expanded to keep every corner.
    Rotated { image: DynamicImage, angle: f64 },
    /// A tilt was measured but is too small to be worth correcting.
    AlreadyStraight,
    /// The strategy found nothing to measure; another strategy may do better.
    NoFeatures,
}

/// A strategy that measures and removes skew.
pub trait Straightener {
    fn name(&self) -> &'static str;

    fn straighten(&self, image: &DynamicImage) -> Straightened;
}

/// Measures the minimum-area rectangle of the largest outer contour of the
/// ink mask and rotates by the opposite angle.
pub struct ContourStraightener;

impl Straightener for ContourStraightener {
    fn name(&self) -> &'static str {
        "contour"
    }

    #[instrument(skip_all, name = "contour_straighten")]
    fn straighten(&self, image: &DynamicImage) -> Straightened {
        let Some(angle) = estimate_skew(&image.to_luma8()) else {
            debug!("No contours found");
            return Straightened::NoFeatures;
        };
        if angle.abs() < MIN_CORRECTION_DEG {
            debug!(angle, "Skew below correction threshold");
            return Straightened::AlreadyStraight;
        }

        info!(angle, "Deskewing by contour angle");
        Straightened::Rotated {
            image: rotate_expanded(image, -angle),
            angle: -angle,
        }
    }
}

/// Rotates a grayscale copy through whole degrees in -10..=10 and keeps the
/// angle whose row-wise ink profile has the highest variance (text lines
/// line up with rows).
pub struct ProjectionStraightener;

impl Straightener for ProjectionStraightener {
    fn name(&self) -> &'static str {
        "projection"
    }

    #[instrument(skip_all, name = "projection_straighten")]
    fn straighten(&self, image: &DynamicImage) -> Straightened {
        let gray = composite_on_color(image, Rgb::WHITE).to_luma8();
        let mut best_angle = 0;
        let mut best_score = 0.0f64;

        for angle in -PROJECTION_RANGE_DEG..=PROJECTION_RANGE_DEG {
            let rotated = if angle == 0 {
                gray.clone()
            } else {
                rotate_about_center(
                    &gray,
                    (angle as f32).to_radians(),
                    Interpolation::Bilinear,
                    Luma([255]),
                )
            };
            let score = row_profile_variance(&rotated);
            if score > best_score {
                best_score = score;
                best_angle = angle;
            }
        }

        debug!(best_angle, best_score, "Projection search finished");
        if best_score == 0.0 {
            return Straightened::NoFeatures;
        }
        if best_angle == 0 {
            return Straightened::AlreadyStraight;
        }

        info!(angle = best_angle, "Deskewing by projection profile");
        Straightened::Rotated {
            image: rotate_expanded(image, best_angle as f64),
            angle: best_angle as f64,
        }
    }
}

/// Try the contour method, falling back to the projection search when it
/// finds no features. Returns the input unchanged if neither rotates it.
pub fn straighten_best_effort(image: &DynamicImage) -> DynamicImage {
    let strategies: [&dyn Straightener; 2] = [&ContourStraightener, &ProjectionStraightener];
    for strategy in strategies {
        match strategy.straighten(image) {
            Straightened::Rotated { image, angle } => {
                debug!(strategy = strategy.name(), angle, "Straightened");
                return image;
            }
            Straightened::AlreadyStraight => return image.clone(),
            Straightened::NoFeatures => {
                debug!(strategy = strategy.name(), "No features, trying next strategy");
            }
        }
    }
    image.clone()
}

/// Tilt of the largest outer contour in degrees (clockwise positive), or
/// `None` when the image has no contours at all.
///
/// Contours come from an inverted adaptive threshold of the smoothed image;
/// if that yields nothing, plain Canny edges are used instead.
pub fn estimate_skew(gray: &GrayImage) -> Option<f64> {
    let smoothed = gaussian_blur_f32(gray, SMOOTHING_SIGMA);
    let mask = adaptive_threshold(&smoothed, true);

    let mut outlines = outer_contours(&mask);
    if outlines.is_empty() {
        debug!("Threshold mask empty, falling back to edge detection");
        outlines = outer_contours(&canny(gray, 50.0, 150.0));
    }

    let largest = outlines
        .into_iter()
        .max_by(|a, b| contour_area(a).total_cmp(&contour_area(b)))?;
    min_area_rect_angle(&largest)
}

fn outer_contours(mask: &GrayImage) -> Vec<Vec<Point<i32>>> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.parent.is_none())
        .map(|c| c.points)
        .collect()
}

/// Variance of per-row ink totals (ink = 255 - luma).
fn row_profile_variance(gray: &GrayImage) -> f64 {
    let rows: Vec<f64> = gray
        .rows()
        .map(|row| row.map(|p| (255 - p[0]) as f64).sum())
        .collect();
    if rows.is_empty() {
        return 0.0;
    }
    let n = rows.len() as f64;
    let mean = rows.iter().sum::<f64>() / n;
    rows.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n
}

fn rotate_expanded(image: &DynamicImage, degrees_cw: f64) -> DynamicImage {
    ImageProcessor::from_dynamic(image.clone())
        .rotate_degrees(degrees_cw as f32, true, WHITE)
        .into_dynamic()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbImage};

    /// White page with a dark filled rectangle, rotated clockwise by `deg`.
    fn tilted_block(deg: f32) -> GrayImage {
        let mut img = GrayImage::from_pixel(400, 400, Luma([255]));
        for y in 150..250 {
            for x in 100..300 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        if deg == 0.0 {
            img
        } else {
            rotate_about_center(&img, deg.to_radians(), Interpolation::Bilinear, Luma([255]))
        }
    }

    /// Horizontal text-like stripes, rotated clockwise by `deg`.
    fn striped_page(deg: f32) -> GrayImage {
        let img = GrayImage::from_fn(300, 300, |x, y| {
            let ink = (40..260).contains(&x) && (40..260).contains(&y) && (y / 6) % 2 == 0;
            Luma([if ink { 0 } else { 255 }])
        });
        if deg == 0.0 {
            img
        } else {
            rotate_about_center(&img, deg.to_radians(), Interpolation::Bilinear, Luma([255]))
        }
    }

    #[test]
    fn skew_of_tilted_block_is_measured() {
        let angle = estimate_skew(&tilted_block(5.0)).unwrap();
        assert!((angle - 5.0).abs() < 1.5, "got {angle}");
    }

    #[test]
    fn level_block_is_left_alone() {
        let img = DynamicImage::ImageLuma8(tilted_block(0.0));
        assert!(matches!(
            ContourStraightener.straighten(&img),
            Straightened::AlreadyStraight
        ));
        assert_eq!(straighten_best_effort(&img).dimensions(), (400, 400));
    }

    #[test]
    fn tilted_block_is_rotated_back_with_expansion() {
        let img = DynamicImage::ImageLuma8(tilted_block(5.0));
        match ContourStraightener.straighten(&img) {
            Straightened::Rotated { image, angle } => {
                assert!(angle < 0.0);
                assert!(image.width() > 400 && image.height() > 400);
            }
            _ => panic!("expected a rotation"),
        }
    }

    #[test]
    fn blank_page_has_no_features() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(80, 80, image::Rgb([255, 255, 255])));
        assert!(matches!(
            ContourStraightener.straighten(&img),
            Straightened::NoFeatures
        ));
        assert!(matches!(
            ProjectionStraightener.straighten(&img),
            Straightened::NoFeatures
        ));
        assert_eq!(straighten_best_effort(&img).dimensions(), (80, 80));
    }

    #[test]
    fn projection_finds_level_stripes() {
        let img = DynamicImage::ImageLuma8(striped_page(0.0));
        assert!(matches!(
            ProjectionStraightener.straighten(&img),
            Straightened::AlreadyStraight
        ));
    }

    #[test]
    fn projection_undoes_stripe_tilt() {
        let img = DynamicImage::ImageLuma8(striped_page(4.0));
        match ProjectionStraightener.straighten(&img) {
            Straightened::Rotated { angle, .. } => assert_eq!(angle, -4.0),
            _ => panic!("expected a rotation"),
        }
    }
}
