// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the page pipeline: full re-render and a
// non-destructive edit followed by undo.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};
use inerscan_core::Rotation;
use inerscan_editor::{EditParams, Page, render};

fn scan(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8])
    }))
}

fn bench_render(c: &mut Criterion) {
    let source = scan(850, 1100);
    let params = EditParams {
        rotation: Rotation::Cw90,
        flip_h: true,
        brightness: 1.2,
        contrast: 1.1,
        ..EditParams::default()
    };
    c.bench_function("render all params (850x1100)", |b| {
        b.iter(|| black_box(render(black_box(&source), &params)));
    });
}

fn bench_edit_undo(c: &mut Criterion) {
    let mut page = Page::new(scan(850, 1100), 20);
    c.bench_function("edit + undo (850x1100)", |b| {
        b.iter(|| {
            page.edit(|p| p.grayscale = !p.grayscale);
            black_box(page.undo());
        });
    });
}

criterion_group!(benches, bench_render, bench_edit_undo);
criterion_main!(benches);
