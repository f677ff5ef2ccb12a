// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glue between imageproc's contour geometry and the straightening and
// perspective code.

use imageproc::geometry::min_area_rect;
use imageproc::point::Point;

pub(crate) type Pt = (f64, f64);

/// Finest sub-pixel scale used when measuring rectangle angles.
const MAX_SUBPIXEL: i32 = 64;
/// Largest scaled coordinate whose square still fits in an `i32`.
const MAX_SCALED_COORD: i32 = 46_000;

pub(crate) fn to_pt(p: Point<i32>) -> Pt {
    (p.x as f64, p.y as f64)
}

pub(crate) fn distance(a: Pt, b: Pt) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Tilt of the minimum-area bounding rectangle of `points`, in degrees
/// within `[-45, 45)`. Positive means the rectangle is turned clockwise on
/// screen. `None` when the points span no area.
pub(crate) fn min_area_rect_angle(points: &[Point<i32>]) -> Option<f64> {
    if points.len() < 3 {
        return None;
    }
    // `min_area_rect` rounds its corners to whole units, so the points are
    // scaled up first. Its orientation test multiplies coordinate
    // differences in i32, which bounds the scale.
    let extent = points.iter().map(|p| p.x.abs().max(p.y.abs())).max().unwrap_or(0);
    let scale = (MAX_SCALED_COORD / (extent + 1)).clamp(1, MAX_SUBPIXEL);
    let scaled: Vec<Point<i32>> = points
        .iter()
        .map(|p| Point::new(p.x * scale, p.y * scale))
        .collect();
    let corners = min_area_rect(&scaled).map(to_pt);
    let origin = corners[0];
    let mut others = [corners[1], corners[2], corners[3]];
    others.sort_by(|a, b| distance(origin, *a).total_cmp(&distance(origin, *b)));

    // Nearest is the short side, farthest the diagonal.
    if distance(origin, others[0]) < scale as f64 {
        return None;
    }
    let side = others[1];
    let theta = (side.1 - origin.1).atan2(side.0 - origin.0);
    Some(fold_quarter_turn(theta.to_degrees()))
}

/// A rectangle looks the same every quarter turn; fold to `[-45, 45)`.
pub(crate) fn fold_quarter_turn(degrees: f64) -> f64 {
    let folded = degrees.rem_euclid(90.0);
    if folded < 45.0 { folded } else { folded - 90.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::geometry::{approximate_polygon_dp, arc_length, contour_area, convex_hull};

    fn rectangle_outline(w: i32, h: i32) -> Vec<Point<i32>> {
        let mut pts = Vec::new();
        for x in 0..w {
            pts.push(Point::new(x, 0));
        }
        for y in 0..h {
            pts.push(Point::new(w, y));
        }
        for x in (1..=w).rev() {
            pts.push(Point::new(x, h));
        }
        for y in (1..=h).rev() {
            pts.push(Point::new(0, y));
        }
        pts
    }

    fn turned(outline: &[Point<i32>], degrees: f64) -> Vec<Point<i32>> {
        let (sin, cos) = degrees.to_radians().sin_cos();
        outline
            .iter()
            .map(|p| {
                let (x, y) = (p.x as f64, p.y as f64);
                Point::new(
                    (x * cos - y * sin + 200.0).round() as i32,
                    (x * sin + y * cos + 200.0).round() as i32,
                )
            })
            .collect()
    }

    #[test]
    fn rectangle_area() {
        let corners = [Point::new(0, 0), Point::new(10, 0), Point::new(10, 5), Point::new(0, 5)];
        assert!((contour_area(&corners) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn hull_drops_interior_points() {
        let pts = vec![
            Point::new(0, 0),
            Point::new(4, 0),
            Point::new(4, 4),
            Point::new(0, 4),
            Point::new(2, 2),
            Point::new(1, 3),
        ];
        assert_eq!(convex_hull(pts).len(), 4);
    }

    #[test]
    fn axis_aligned_rect_has_zero_tilt() {
        let angle = min_area_rect_angle(&rectangle_outline(40, 20)).unwrap();
        assert!(angle.abs() < 0.1, "got {angle}");
    }

    #[test]
    fn tilted_rect_reports_its_angle() {
        let pts = turned(&rectangle_outline(300, 100), 10.0);
        let angle = min_area_rect_angle(&pts).unwrap();
        assert!((angle - 10.0).abs() < 0.5, "got {angle}");

        let mirrored: Vec<Point<i32>> = pts.iter().map(|p| Point::new(p.x, 800 - p.y)).collect();
        let angle = min_area_rect_angle(&mirrored).unwrap();
        assert!((angle + 10.0).abs() < 0.5, "got {angle}");
    }

    #[test]
    fn collinear_points_have_no_angle() {
        let line: Vec<Point<i32>> = (0..20).map(|x| Point::new(x, 7)).collect();
        assert_eq!(min_area_rect_angle(&line), None);
        assert_eq!(min_area_rect_angle(&[Point::new(1, 1), Point::new(2, 2)]), None);
    }

    #[test]
    fn scan_sized_coordinates_are_measured() {
        let pts = turned(&rectangle_outline(2400, 3400), 2.0);
        let angle = min_area_rect_angle(&pts).unwrap();
        assert!((angle - 2.0).abs() < 0.1, "got {angle}");
    }

    #[test]
    fn quarter_turn_folding() {
        assert_eq!(fold_quarter_turn(100.0), 10.0);
        assert_eq!(fold_quarter_turn(-100.0), -10.0);
        assert_eq!(fold_quarter_turn(45.0), -45.0);
        assert_eq!(fold_quarter_turn(180.0), 0.0);
    }

    #[test]
    fn dense_rectangle_simplifies_to_four_corners() {
        let outline = rectangle_outline(60, 40);
        let perimeter = arc_length(&outline, true);
        assert!((perimeter - 200.0).abs() < 1e-9);
        let approx = approximate_polygon_dp(&outline, 0.02 * perimeter, true);
        assert_eq!(approx.len(), 4, "{approx:?}");
    }
}
