// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use image::{DynamicImage, GenericImageView};
use inerscan_core::error::{InerScanError, Result};

/// Cut an image into left and right halves at `width / 2`. An odd column
/// goes to the right half, so the two widths always sum to the original.
pub fn split_vertical(image: &DynamicImage) -> Result<(DynamicImage, DynamicImage)> {
    let (w, h) = image.dimensions();
    if w < 2 || h == 0 {
        return Err(InerScanError::InvalidParameter(format!(
            "cannot split a {w}x{h} image in two"
        )));
    }
    let half = w / 2;
    Ok((
        image.crop_imm(0, 0, half, h),
        image.crop_imm(half, 0, w - half, h),
    ))
}
