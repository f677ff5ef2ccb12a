// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective flattening: find the document's four corners and warp the
// quadrilateral they enclose to an upright rectangle.

use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::contours::find_contours;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use imageproc::geometry::{approximate_polygon_dp, arc_length, contour_area};
use imageproc::morphology::dilate;
use imageproc::point::Point;
use tracing::{debug, info, instrument, warn};

use crate::scan::geometry::{Pt, distance, to_pt};

/// How many of the largest contours are tested for a quadrilateral.
const CANDIDATES: usize = 5;
/// Simplification tolerance as a fraction of the contour perimeter.
const APPROX_FRACTION: f64 = 0.02;

/// Warp the detected document quadrilateral to a rectangle.
///
/// Returns the input unchanged when no four-cornered outline is found or the
/// target rectangle would be degenerate.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn flatten_perspective(image: &DynamicImage) -> DynamicImage {
    let Some(quad) = find_document_quad(&image.to_luma8()) else {
        debug!("No document outline found, returning unchanged");
        return image.clone();
    };

    let [tl, tr, br, bl] = order_corners(quad);
    let width = distance(br, bl).max(distance(tr, tl)).round() as u32;
    let height = distance(tr, br).max(distance(tl, bl)).round() as u32;
    if width < 2 || height < 2 {
        warn!(width, height, "Degenerate document outline, skipping warp");
        return image.clone();
    }

    let (w, h) = ((width - 1) as f32, (height - 1) as f32);
    let from = [tl, tr, br, bl].map(|(x, y)| (x as f32, y as f32));
    let to = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
    let Some(projection) = Projection::from_control_points(from, to) else {
        warn!("Corner points do not define a projection");
        return image.clone();
    };

    let rgb = image.to_rgb8();
    let mut output = RgbImage::new(width, height);
    warp_into(
        &rgb,
        &projection,
        Interpolation::Bilinear,
        Rgb([255, 255, 255]),
        &mut output,
    );
    info!(width, height, "Perspective flattened");
    DynamicImage::ImageRgb8(output)
}

/// Find the largest four-vertex outline among the edge contours.
fn find_document_quad(gray: &GrayImage) -> Option<[Pt; 4]> {
    let blurred = gaussian_blur_f32(gray, 1.1);
    let edges = canny(&blurred, 75.0, 200.0);
    // Close single-pixel breaks (typically at corners) in the edge map.
    let edges = dilate(&edges, Norm::LInf, 1);

    let mut contours: Vec<Vec<Point<i32>>> = find_contours::<i32>(&edges)
        .into_iter()
        .map(|c| c.points)
        .filter(|points| points.len() >= 4)
        .collect();
    contours.sort_by(|a, b| contour_area(b).total_cmp(&contour_area(a)));

    contours.iter().take(CANDIDATES).find_map(|contour| {
        let perimeter = arc_length(contour, true);
        if perimeter <= 0.0 {
            return None;
        }
        let approx = approximate_polygon_dp(contour, APPROX_FRACTION * perimeter, true);
        debug!(vertices = approx.len(), perimeter, "Contour simplified");
        let quad = <[Point<i32>; 4]>::try_from(approx).ok()?;
        Some(quad.map(to_pt))
    })
}

/// Order corners as top-left, top-right, bottom-right, bottom-left.
///
/// Top-left has the smallest x + y and bottom-right the largest; top-right
/// has the smallest y - x and bottom-left the largest.
fn order_corners(points: [Pt; 4]) -> [Pt; 4] {
    let by = |key: fn(&Pt) -> f64, max: bool| {
        let iter = points.iter().copied();
        let found = if max {
            iter.max_by(|a, b| key(a).total_cmp(&key(b)))
        } else {
            iter.min_by(|a, b| key(a).total_cmp(&key(b)))
        };
        found.unwrap_or(points[0])
    };
    let sum = |p: &Pt| p.0 + p.1;
    let diff = |p: &Pt| p.1 - p.0;
    [by(sum, false), by(diff, false), by(sum, true), by(diff, true)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Luma, Rgba, RgbaImage};
    use imageproc::drawing::draw_polygon_mut;

    /// A light quadrilateral on a dark 600x700 desk.
    fn photographed_page(corners: [(i32, i32); 4]) -> DynamicImage {
        let mut img = GrayImage::from_pixel(600, 700, Luma([30u8]));
        let poly = corners.map(|(x, y)| Point::new(x, y));
        draw_polygon_mut(&mut img, &poly, Luma([240u8]));
        DynamicImage::ImageLuma8(img)
    }

    fn mean_luma(img: &DynamicImage) -> f64 {
        let gray = img.to_luma8();
        let total: u64 = gray.pixels().map(|p| p[0] as u64).sum();
        total as f64 / (gray.width() as u64 * gray.height() as u64) as f64
    }

    #[test]
    fn blank_image_returns_unchanged() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 300, Luma([200u8])));
        let out = flatten_perspective(&img);
        assert_eq!(out.dimensions(), (200, 300));
    }

    #[test]
    fn small_rgba_no_panic() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(50, 50, Rgba([128, 128, 128, 255])));
        let _ = flatten_perspective(&img);
    }

    #[test]
    fn corners_are_ordered_clockwise_from_top_left() {
        let ordered = order_corners([(90.0, 95.0), (10.0, 5.0), (12.0, 80.0), (95.0, 8.0)]);
        assert_eq!(ordered, [(10.0, 5.0), (95.0, 8.0), (90.0, 95.0), (12.0, 80.0)]);
    }

    /// A light page on a dark desk should be cut out at roughly its own size.
    #[test]
    fn synthetic_page_is_cut_out() {
        let mut img = GrayImage::from_pixel(400, 500, Luma([30u8]));
        for y in 60..440 {
            for x in 50..350 {
                img.put_pixel(x, y, Luma([240u8]));
            }
        }
        let out = flatten_perspective(&DynamicImage::ImageLuma8(img));
        let (w, h) = out.dimensions();
        assert!((290..=315).contains(&w), "width {w}");
        assert!((370..=395).contains(&h), "height {h}");
    }

    /// Width comes from the longer of the top and bottom edges, height from
    /// the longer of the two sides.
    #[test]
    fn trapezoid_is_warped_to_longest_edges() {
        let img = photographed_page([(150, 80), (450, 100), (520, 620), (60, 600)]);
        let out = flatten_perspective(&img);
        let (w, h) = out.dimensions();
        assert!((452..=472).contains(&w), "width {w}");
        assert!((520..=540).contains(&h), "height {h}");
        assert!(mean_luma(&out) > 200.0, "interior should be the page");
    }

    #[test]
    fn height_uses_the_longer_side() {
        // Left side is 500 long, right side only 300.
        let img = photographed_page([(100, 100), (500, 100), (500, 400), (100, 600)]);
        let out = flatten_perspective(&img);
        let (w, h) = out.dimensions();
        assert!((440..=460).contains(&w), "width {w}");
        assert!((495..=515).contains(&h), "height {h}");
        assert!(mean_luma(&out) > 200.0, "interior should be the page");
    }
}
