// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Photo grid (collage) composition.

use image::imageops;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use inerscan_core::error::{InerScanError, Result};
use inerscan_core::{GridLayout, Rgb as Colour};
use tracing::{info, instrument};

use crate::image::matting::composite_on_color;
use crate::image::processor::fit_within;

/// Arrange `images` row-major into a `layout.cols` x `layout.rows` grid.
///
/// Every cell is as large as the largest input; each image is shrunk (never
/// enlarged) to fit its cell and centred on `background`. Missing slots are
/// filled with blank cells the size of the first image; surplus images are
/// ignored. Transparent inputs are flattened onto `background` first.
///
/// The result is `cols * cell_w + (cols - 1) * spacing` wide and
/// `rows * cell_h + (rows - 1) * spacing` tall.
#[instrument(skip(images), fields(count = images.len(), %layout, spacing))]
pub fn build_photo_grid(
    images: &[DynamicImage],
    layout: GridLayout,
    spacing: u32,
    background: Colour,
) -> Result<DynamicImage> {
    let first = images
        .first()
        .ok_or_else(|| InerScanError::InvalidParameter("no images provided for the grid".into()))?;
    if layout.cols == 0 || layout.rows == 0 {
        return Err(InerScanError::InvalidParameter(format!(
            "grid layout {layout} has no cells"
        )));
    }

    let bg = Rgb(background.channels());
    let (first_w, first_h) = first.dimensions();
    let mut cells: Vec<RgbImage> = images
        .iter()
        .take(layout.slots())
        .map(|img| composite_on_color(img, background).to_rgb8())
        .collect();

    // The first image is always placed, so padding never widens a cell.
    let cell_w = cells.iter().map(|c| c.width()).max().unwrap_or(first_w);
    let cell_h = cells.iter().map(|c| c.height()).max().unwrap_or(first_h);
    let too_large = || {
        InerScanError::InvalidParameter(format!(
            "grid layout {layout} with {cell_w}x{cell_h} cells is too large"
        ))
    };
    let grid_w = span(layout.cols, cell_w, spacing).ok_or_else(too_large)?;
    let grid_h = span(layout.rows, cell_h, spacing).ok_or_else(too_large)?;

    while cells.len() < layout.slots() {
        cells.push(RgbImage::from_pixel(first_w, first_h, bg));
    }
    let mut grid = RgbImage::from_pixel(grid_w, grid_h, bg);

    for (idx, cell) in cells.into_iter().enumerate() {
        let col = idx as u32 % layout.cols;
        let row = idx as u32 / layout.cols;
        let fitted = fit_within(&DynamicImage::ImageRgb8(cell), cell_w, cell_h).to_rgb8();
        let x = col * (cell_w + spacing) + (cell_w - fitted.width()) / 2;
        let y = row * (cell_h + spacing) + (cell_h - fitted.height()) / 2;
        imageops::replace(&mut grid, &fitted, x as i64, y as i64);
    }

    info!(grid_w, grid_h, cell_w, cell_h, "Photo grid composed");
    Ok(DynamicImage::ImageRgb8(grid))
}

/// `count * cell + (count - 1) * spacing`, or `None` on overflow.
fn span(count: u32, cell: u32, spacing: u32) -> Option<u32> {
    count
        .checked_mul(cell)?
        .checked_add((count - 1).checked_mul(spacing)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid(w: u32, h: u32, v: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([v, v, v])))
    }

    #[test]
    fn two_by_two_grid_size() {
        let images = vec![solid(100, 100, 0); 3];
        let grid = build_photo_grid(&images, GridLayout { cols: 2, rows: 2 }, 10, Colour::WHITE).unwrap();
        assert_eq!(grid.dimensions(), (210, 210));
        // The fourth slot is a blank cell.
        assert_eq!(grid.to_rgb8().get_pixel(160, 160), &Rgb([255, 255, 255]));
        assert_eq!(grid.to_rgb8().get_pixel(50, 50), &Rgb([0, 0, 0]));
    }

    #[test]
    fn cells_take_largest_dimensions() {
        let images = vec![solid(100, 40, 0), solid(60, 80, 0)];
        let grid = build_photo_grid(&images, GridLayout { cols: 2, rows: 1 }, 4, Colour::WHITE).unwrap();
        assert_eq!(grid.dimensions(), (204, 80));
        // 100x40 sits vertically centred in its 100x80 cell.
        assert_eq!(grid.to_rgb8().get_pixel(50, 5), &Rgb([255, 255, 255]));
        assert_eq!(grid.to_rgb8().get_pixel(50, 40), &Rgb([0, 0, 0]));
    }

    #[test]
    fn surplus_images_are_dropped() {
        let images = vec![solid(10, 10, 0); 5];
        let grid = build_photo_grid(&images, GridLayout { cols: 1, rows: 2 }, 0, Colour::WHITE).unwrap();
        assert_eq!(grid.dimensions(), (10, 20));
    }

    #[test]
    fn transparent_cells_flatten_on_background() {
        let clear = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 0])));
        let grid = build_photo_grid(&[clear], GridLayout { cols: 1, rows: 1 }, 0, Colour::RED).unwrap();
        assert_eq!(grid.to_rgb8().get_pixel(5, 5), &Rgb([255, 0, 0]));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(build_photo_grid(&[], GridLayout { cols: 2, rows: 2 }, 10, Colour::WHITE).is_err());
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let images = vec![solid(50_000, 10, 0)];
        let layout = GridLayout { cols: 100_000, rows: 1 };
        assert!(matches!(
            build_photo_grid(&images, layout, 0, Colour::WHITE),
            Err(InerScanError::InvalidParameter(_))
        ));
        assert!(matches!(
            build_photo_grid(&[solid(10, 10, 0)], GridLayout { cols: 2, rows: 1 }, u32::MAX, Colour::WHITE),
            Err(InerScanError::InvalidParameter(_))
        ));
    }
}
