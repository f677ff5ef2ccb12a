// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page editor — the ordered page list of one document, the current
// selection, and every edit a user can make to the selected page.
//
// Non-destructive edits change parameters and re-render. Destructive edits
// run on the processed raster and bake the result into a new source. Both
// are undoable per page.

use ab_glyph::FontArc;
use image::DynamicImage;
use inerscan_bridge::RemoteKind;
use inerscan_core::error::{InerScanError, Result};
use inerscan_core::{AppConfig, GridLayout, PaperSize, ResizeMode, Rgb};
use inerscan_document::image::matting;
use inerscan_document::layout::font::resolve_font;
use inerscan_document::layout::{self, TextStyle, WatermarkStyle};
use inerscan_document::scan::enhance::detect_blank;
use inerscan_document::scan::{FaceDetector, NoFaceDetector};
use inerscan_document::{CropBox, ImageProcessor, ScanEnhancer};
use tracing::{error, info, instrument, warn};

use crate::batch::BatchSummary;
use crate::page::Page;
use crate::tasks::TaskEvent;

/// Gap between collage cells, in pixels.
pub const COLLAGE_SPACING: u32 = 10;

/// What happened to an acquired raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Added { index: usize },
    BlankSkipped,
    Cancelled,
}

/// Result of applying a background task event.
#[derive(Debug)]
pub enum EditorUpdate {
    Scan(ScanOutcome),
    BatchFinished(BatchSummary),
    RemoteText { kind: RemoteKind, text: String },
    Failed { task: &'static str, error: InerScanError },
}

/// Owns the document's pages. Lives on a single thread.
pub struct PageEditor {
    pages: Vec<Page>,
    current: Option<usize>,
    config: AppConfig,
    faces: Box<dyn FaceDetector>,
    font: Option<FontArc>,
}

impl PageEditor {
    pub fn new(config: AppConfig) -> Self {
        Self {
            pages: Vec::new(),
            current: None,
            config,
            faces: Box::new(NoFaceDetector),
            font: None,
        }
    }

    /// Use `detector` for privacy blur. Without one, redaction is a no-op.
    pub fn with_face_detector(mut self, detector: Box<dyn FaceDetector>) -> Self {
        self.faces = detector;
        self
    }

    /// Use `font` for watermarks and text instead of resolving one lazily.
    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // -- Page list ------------------------------------------------------------

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.current.and_then(|i| self.pages.get(i))
    }

    /// Append a page and select it. Returns its index.
    pub fn add_page(&mut self, raster: DynamicImage) -> usize {
        self.pages.push(Page::new(raster, self.config.undo_limit));
        let index = self.pages.len() - 1;
        self.current = Some(index);
        info!(index, pages = self.pages.len(), "page added");
        index
    }

    pub fn select(&mut self, index: usize) -> Result<()> {
        if index >= self.pages.len() {
            return Err(InerScanError::PageIndexOutOfRange { index, len: self.pages.len() });
        }
        self.current = Some(index);
        Ok(())
    }

    /// Remove the selected page; the previous page (or the new first page)
    /// becomes selected.
    pub fn delete_current(&mut self) -> Result<()> {
        let index = self.current.ok_or(InerScanError::NoPageSelected)?;
        self.pages.remove(index);
        self.current = if self.pages.is_empty() {
            None
        } else {
            Some(index.saturating_sub(1))
        };
        info!(index, pages = self.pages.len(), "page deleted");
        Ok(())
    }

    pub fn clear_all(&mut self) {
        self.pages.clear();
        self.current = None;
        info!("all pages cleared");
    }

    /// Reverse page order and select the first page.
    pub fn reverse_pages(&mut self) {
        self.pages.reverse();
        self.current = if self.pages.is_empty() { None } else { Some(0) };
    }

    /// Merge two separately scanned halves of a duplex job: the first
    /// `ceil(n/2)` pages are fronts, the rest are backs. With `backs_reversed`
    /// the backs were fed as a flipped stack and are taken last to first.
    /// Selects page 0.
    pub fn interleave_pages(&mut self, backs_reversed: bool) {
        let fronts_len = self.pages.len().div_ceil(2);
        let mut backs = self.pages.split_off(fronts_len);
        if backs_reversed {
            backs.reverse();
        }
        let fronts = std::mem::take(&mut self.pages);
        let mut backs = backs.into_iter();
        for front in fronts {
            self.pages.push(front);
            if let Some(back) = backs.next() {
                self.pages.push(back);
            }
        }
        self.current = if self.pages.is_empty() { None } else { Some(0) };
        info!(pages = self.pages.len(), backs_reversed, "pages interleaved");
    }

    /// Replace the selected page with its left half and insert the right
    /// half after it. Both halves start with fresh history.
    #[instrument(skip(self))]
    pub fn split_current(&mut self) -> Result<()> {
        let index = self.current.ok_or(InerScanError::NoPageSelected)?;
        let (left, right) = layout::split_vertical(self.pages[index].processed())?;
        self.pages[index] = Page::new(left, self.config.undo_limit);
        self.pages.insert(index + 1, Page::new(right, self.config.undo_limit));
        self.current = Some(index);
        Ok(())
    }

    /// Lay every page's processed raster out on a grid and append the result
    /// as a new, selected page. Needs at least two pages.
    #[instrument(skip(self), fields(%layout))]
    pub fn create_collage(&mut self, layout: GridLayout) -> Result<usize> {
        if self.pages.len() < 2 {
            return Err(InerScanError::InvalidParameter(
                "a collage needs at least two pages".into(),
            ));
        }
        let images: Vec<DynamicImage> = self.pages.iter().map(|p| p.processed().clone()).collect();
        let grid = layout::build_photo_grid(&images, layout, COLLAGE_SPACING, Rgb::WHITE)?;
        Ok(self.add_page(grid))
    }

    // -- Scanning -------------------------------------------------------------

    /// Add an acquired raster, honouring the blank-page rule. `None` is a
    /// user cancellation.
    pub fn accept_scan(&mut self, image: Option<DynamicImage>) -> ScanOutcome {
        match image {
            Some(image) => {
                let blank = self.config.skip_blank_pages
                    && detect_blank(&image, self.config.blank_variance_threshold);
                self.admit(image, blank)
            }
            None => ScanOutcome::Cancelled,
        }
    }

    /// Apply a finished background task on the owner thread.
    pub fn apply_event(&mut self, event: TaskEvent) -> EditorUpdate {
        match event {
            TaskEvent::Scanned { image, blank } => EditorUpdate::Scan(self.admit(image, blank)),
            TaskEvent::ScanCancelled => EditorUpdate::Scan(ScanOutcome::Cancelled),
            TaskEvent::BatchFinished(summary) => EditorUpdate::BatchFinished(summary),
            TaskEvent::RemoteText { kind, text } => EditorUpdate::RemoteText { kind, text },
            TaskEvent::Failed { task, error } => {
                error!(task, %error, "background task failed");
                EditorUpdate::Failed { task, error }
            }
        }
    }

    fn admit(&mut self, image: DynamicImage, blank: bool) -> ScanOutcome {
        if blank && self.config.skip_blank_pages {
            info!("blank page skipped");
            return ScanOutcome::BlankSkipped;
        }
        ScanOutcome::Added { index: self.add_page(image) }
    }

    // -- Non-destructive edits ------------------------------------------------

    /// Turn by a multiple of 90 degrees (positive is clockwise).
    pub fn rotate(&mut self, degrees: i32) -> Result<bool> {
        let page = self.current_mut()?;
        let rotation = page.params().rotation.turned_by(degrees)?;
        Ok(page.edit(|p| p.rotation = rotation))
    }

    pub fn toggle_flip_h(&mut self) -> Result<bool> {
        Ok(self.current_mut()?.edit(|p| p.flip_h = !p.flip_h))
    }

    pub fn toggle_flip_v(&mut self) -> Result<bool> {
        Ok(self.current_mut()?.edit(|p| p.flip_v = !p.flip_v))
    }

    pub fn set_grayscale(&mut self, enabled: bool) -> Result<bool> {
        Ok(self.current_mut()?.edit(|p| p.grayscale = enabled))
    }

    pub fn set_brightness(&mut self, factor: f32) -> Result<bool> {
        check_factor("brightness", factor)?;
        Ok(self.current_mut()?.edit(|p| p.brightness = factor))
    }

    pub fn set_contrast(&mut self, factor: f32) -> Result<bool> {
        check_factor("contrast", factor)?;
        Ok(self.current_mut()?.edit(|p| p.contrast = factor))
    }

    /// Return every parameter to neutral (undoable).
    pub fn reset_edits(&mut self) -> Result<bool> {
        Ok(self.current_mut()?.edit(|p| *p = Default::default()))
    }

    /// `Ok(false)` when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool> {
        let undone = self.current_mut()?.undo();
        if !undone {
            info!("nothing to undo");
        }
        Ok(undone)
    }

    /// `Ok(false)` when there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool> {
        let redone = self.current_mut()?.redo();
        if !redone {
            info!("nothing to redo");
        }
        Ok(redone)
    }

    // -- Destructive edits ----------------------------------------------------

    /// Crop to `region` in processed-raster pixels. Selections under the
    /// configured minimum are rejected and the page is left alone.
    pub fn crop(&mut self, region: CropBox) -> Result<()> {
        let min_px = self.config.min_crop_px;
        self.current_mut()?.bake(|img| {
            ImageProcessor::from_dynamic(img.clone())
                .crop(region, min_px)
                .map(ImageProcessor::into_dynamic)
        })
    }

    pub fn flatten_perspective(&mut self) -> Result<()> {
        self.current_mut()?
            .bake(|img| Ok(ScanEnhancer::from_dynamic(img.clone()).flatten_perspective().into_dynamic()))
    }

    /// Best-effort straightening: contour method, then projection profile.
    pub fn deskew(&mut self) -> Result<()> {
        self.current_mut()?
            .bake(|img| Ok(ScanEnhancer::from_dynamic(img.clone()).straighten().into_dynamic()))
    }

    /// Binarize for a clean black-on-white look.
    pub fn enhance_text(&mut self) -> Result<()> {
        self.current_mut()?
            .bake(|img| Ok(ScanEnhancer::from_dynamic(img.clone()).enhance_text().into_dynamic()))
    }

    /// Blur every face the configured detector finds.
    pub fn redact_faces(&mut self) -> Result<()> {
        let detector = self.faces.as_ref();
        let page = current_in(&mut self.pages, self.current)?;
        page.bake(|img| Ok(inerscan_document::scan::faces::redact_faces(img, detector)))
    }

    /// Knock out near-white background. `None` uses the configured threshold.
    pub fn remove_background(&mut self, threshold: Option<u8>) -> Result<()> {
        let threshold = threshold.unwrap_or(self.config.background_threshold);
        self.current_mut()?
            .bake(|img| Ok(matting::remove_near_white(img, threshold)))
    }

    /// Trim to the non-transparent content (no-op on opaque pages).
    pub fn auto_crop_to_content(&mut self) -> Result<()> {
        self.current_mut()?
            .bake(|img| Ok(matting::auto_crop_to_content(img)))
    }

    /// Flatten transparency onto a solid colour.
    pub fn composite_on_color(&mut self, background: Rgb) -> Result<()> {
        self.current_mut()?
            .bake(|img| Ok(matting::composite_on_color(img, background)))
    }

    pub fn resize_to_paper(&mut self, paper: PaperSize, mode: ResizeMode) -> Result<()> {
        let (width, height) = paper.dimensions_px();
        self.current_mut()?.bake(|img| {
            ImageProcessor::from_dynamic(img.clone())
                .resize_to_target(width, height, mode)
                .map(ImageProcessor::into_dynamic)
        })
    }

    pub fn add_watermark(&mut self, style: &WatermarkStyle) -> Result<()> {
        let font = self.font()?;
        self.current_mut()?
            .bake(|img| Ok(layout::add_watermark(img, style, &font)))
    }

    pub fn add_text(&mut self, text: &str, position: (i32, i32), style: &TextStyle) -> Result<()> {
        let font = self.font()?;
        self.current_mut()?
            .bake(|img| Ok(layout::add_text(img, text, position, style, &font)))
    }

    // -- Internals ------------------------------------------------------------

    fn current_mut(&mut self) -> Result<&mut Page> {
        current_in(&mut self.pages, self.current)
    }

    fn font(&mut self) -> Result<FontArc> {
        if let Some(font) = &self.font {
            return Ok(font.clone());
        }
        let font = resolve_font(self.config.font_path.as_deref()).inspect_err(|e| {
            warn!(error = %e, "no font available for text rendering");
        })?;
        self.font = Some(font.clone());
        Ok(font)
    }
}

fn current_in(pages: &mut [Page], current: Option<usize>) -> Result<&mut Page> {
    let index = current.ok_or(InerScanError::NoPageSelected)?;
    let len = pages.len();
    pages
        .get_mut(index)
        .ok_or(InerScanError::PageIndexOutOfRange { index, len })
}

fn check_factor(name: &str, factor: f32) -> Result<()> {
    if factor.is_finite() && factor > 0.0 {
        Ok(())
    } else {
        Err(InerScanError::InvalidParameter(format!(
            "{name} must be a positive number, got {factor}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb as Px, RgbImage};
    use inerscan_core::Rotation;
    use inerscan_document::scan::FaceRect;

    fn photo(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            Px([(x * 9 % 256) as u8, (y * 13 % 256) as u8, 60])
        }))
    }

    fn editor_with(pages: &[DynamicImage]) -> PageEditor {
        let mut editor = PageEditor::new(AppConfig::default());
        for page in pages {
            editor.add_page(page.clone());
        }
        editor
    }

    #[test]
    fn edits_need_a_selected_page() {
        let mut editor = PageEditor::new(AppConfig::default());
        assert!(matches!(editor.rotate(90), Err(InerScanError::NoPageSelected)));
        assert!(matches!(editor.deskew(), Err(InerScanError::NoPageSelected)));
        assert!(matches!(editor.delete_current(), Err(InerScanError::NoPageSelected)));
    }

    #[test]
    fn add_select_delete() {
        let mut editor = editor_with(&[photo(10, 10), photo(20, 10), photo(30, 10)]);
        assert_eq!(editor.current_index(), Some(2));
        editor.select(1).unwrap();
        editor.delete_current().unwrap();
        assert_eq!(editor.len(), 2);
        assert_eq!(editor.current_index(), Some(0));
        editor.delete_current().unwrap();
        editor.delete_current().unwrap();
        assert_eq!(editor.current_index(), None);
        assert!(matches!(
            editor.select(0),
            Err(InerScanError::PageIndexOutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn reverse_selects_first() {
        let mut editor = editor_with(&[photo(10, 10), photo(20, 10)]);
        editor.reverse_pages();
        assert_eq!(editor.current_index(), Some(0));
        assert_eq!(editor.pages()[0].source().width(), 20);
    }

    #[test]
    fn interleave_duplex_halves() {
        let widths = [1u32, 2, 3, 13, 12];
        let mut editor = editor_with(&widths.map(|w| photo(w, 4)));
        editor.interleave_pages(true);
        let order: Vec<u32> = editor.pages().iter().map(|p| p.source().width()).collect();
        assert_eq!(order, vec![1, 12, 2, 13, 3]);
        assert_eq!(editor.current_index(), Some(0));

        let mut editor = editor_with(&[photo(1, 4), photo(2, 4), photo(11, 4), photo(12, 4)]);
        editor.interleave_pages(false);
        let order: Vec<u32> = editor.pages().iter().map(|p| p.source().width()).collect();
        assert_eq!(order, vec![1, 11, 2, 12]);
    }

    #[test]
    fn two_quarter_turns_then_undo() {
        let mut editor = editor_with(&[photo(200, 300)]);
        editor.rotate(90).unwrap();
        assert_eq!(editor.current_page().unwrap().processed().width(), 300);
        editor.rotate(90).unwrap();
        let page = editor.current_page().unwrap();
        assert_eq!(page.params().rotation, Rotation::Cw180);
        assert_eq!((page.processed().width(), page.processed().height()), (200, 300));
        editor.undo().unwrap();
        assert_eq!(editor.current_page().unwrap().params().rotation, Rotation::Cw90);
        assert!(matches!(editor.rotate(45), Err(InerScanError::InvalidParameter(_))));
    }

    #[test]
    fn tone_factors_are_validated() {
        let mut editor = editor_with(&[photo(8, 8)]);
        assert!(editor.set_brightness(0.0).is_err());
        assert!(editor.set_contrast(f32::NAN).is_err());
        assert!(editor.set_brightness(1.4).unwrap());
        assert!(editor.set_contrast(1.2).unwrap());
        assert!(editor.reset_edits().unwrap());
        assert!(editor.current_page().unwrap().params().is_neutral());
        assert!(editor.undo().unwrap());
        assert_eq!(editor.current_page().unwrap().params().contrast, 1.2);
    }

    #[test]
    fn tiny_crop_is_rejected_without_side_effects() {
        let mut editor = editor_with(&[photo(100, 100)]);
        let before = editor.current_page().unwrap().snapshot();
        let result = editor.crop(CropBox::new(10, 10, 15, 15));
        assert!(matches!(result, Err(InerScanError::SelectionTooSmall { .. })));
        let page = editor.current_page().unwrap();
        assert_eq!(page.snapshot(), before);
        assert!(!page.history().can_undo());
    }

    #[test]
    fn crop_applies_to_processed_and_resets_params() {
        let mut editor = editor_with(&[photo(100, 50)]);
        editor.rotate(90).unwrap();
        editor.crop(CropBox::new(0, 0, 50, 40)).unwrap();
        let page = editor.current_page().unwrap();
        assert!(page.params().is_neutral());
        assert_eq!((page.source().width(), page.source().height()), (50, 40));
        assert_eq!(page.history().undo_depth(), 2);
    }

    #[test]
    fn background_ops_chain() {
        let mut img = RgbImage::from_pixel(20, 20, Px([255, 255, 255]));
        for y in 5..10 {
            for x in 4..12 {
                img.put_pixel(x, y, Px([10, 10, 10]));
            }
        }
        let mut editor = editor_with(&[DynamicImage::ImageRgb8(img)]);
        editor.remove_background(None).unwrap();
        assert!(editor.current_page().unwrap().source().color().has_alpha());
        editor.auto_crop_to_content().unwrap();
        let page = editor.current_page().unwrap();
        assert_eq!((page.source().width(), page.source().height()), (8, 5));
        editor.composite_on_color(Rgb::WHITE).unwrap();
        assert!(!editor.current_page().unwrap().source().color().has_alpha());
    }

    #[test]
    fn resize_to_custom_paper() {
        let mut editor = editor_with(&[photo(40, 20)]);
        editor
            .resize_to_paper(PaperSize::Custom { width_px: 30, height_px: 30 }, ResizeMode::Fit)
            .unwrap();
        let page = editor.current_page().unwrap();
        assert_eq!((page.source().width(), page.source().height()), (30, 30));
    }

    #[test]
    fn split_replaces_and_inserts() {
        let mut editor = editor_with(&[photo(10, 10), photo(31, 12), photo(10, 10)]);
        editor.select(1).unwrap();
        editor.split_current().unwrap();
        assert_eq!(editor.len(), 4);
        assert_eq!(editor.current_index(), Some(1));
        assert_eq!(editor.pages()[1].source().width(), 15);
        assert_eq!(editor.pages()[2].source().width(), 16);
        assert_eq!(editor.pages()[2].source().height(), 12);
    }

    #[test]
    fn collage_needs_two_pages_and_appends() {
        let mut editor = editor_with(&[photo(100, 100)]);
        assert!(editor.create_collage(GridLayout { cols: 2, rows: 2 }).is_err());
        editor.add_page(photo(80, 60));
        let index = editor.create_collage(GridLayout { cols: 2, rows: 1 }).unwrap();
        assert_eq!(index, 2);
        assert_eq!(editor.current_index(), Some(2));
        let grid = editor.current_page().unwrap().source();
        assert_eq!((grid.width(), grid.height()), (210, 100));
    }

    #[test]
    fn enhance_text_is_undoable() {
        let mut editor = editor_with(&[photo(30, 30)]);
        let original = editor.current_page().unwrap().source().as_bytes().to_vec();
        editor.enhance_text().unwrap();
        assert!(matches!(editor.current_page().unwrap().source(), DynamicImage::ImageLuma8(_)));
        editor.undo().unwrap();
        assert_eq!(editor.current_page().unwrap().source().as_bytes(), original.as_slice());
    }

    struct FixedFace;

    impl FaceDetector for FixedFace {
        fn detect(&self, _gray: &GrayImage) -> Vec<FaceRect> {
            vec![FaceRect { x: 0, y: 0, width: 10, height: 10 }]
        }
    }

    #[test]
    fn redaction_uses_configured_detector() {
        let mut editor = editor_with(&[photo(40, 40)]);
        editor.redact_faces().unwrap();
        assert_eq!(
            editor.current_page().unwrap().source().as_bytes(),
            photo(40, 40).as_bytes()
        );

        let mut editor = PageEditor::new(AppConfig::default()).with_face_detector(Box::new(FixedFace));
        editor.add_page(photo(40, 40));
        editor.redact_faces().unwrap();
        let out = editor.current_page().unwrap().source().to_rgb8();
        assert_ne!(out.get_pixel(0, 0), photo(40, 40).to_rgb8().get_pixel(0, 0));
        assert_eq!(out.get_pixel(30, 30), photo(40, 40).to_rgb8().get_pixel(30, 30));
    }

    #[test]
    fn blank_scans_are_skipped() {
        let mut editor = PageEditor::new(AppConfig::default());
        let white = DynamicImage::ImageLuma8(GrayImage::from_pixel(100, 100, Luma([255])));
        assert_eq!(editor.accept_scan(Some(white.clone())), ScanOutcome::BlankSkipped);
        assert_eq!(editor.accept_scan(None), ScanOutcome::Cancelled);
        assert_eq!(editor.accept_scan(Some(photo(50, 50))), ScanOutcome::Added { index: 0 });

        let config = AppConfig { skip_blank_pages: false, ..AppConfig::default() };
        let mut keep_all = PageEditor::new(config);
        assert_eq!(keep_all.accept_scan(Some(white)), ScanOutcome::Added { index: 0 });
    }

    #[test]
    fn events_are_applied_on_owner() {
        let mut editor = PageEditor::new(AppConfig::default());
        let update = editor.apply_event(TaskEvent::Scanned { image: photo(10, 10), blank: false });
        assert!(matches!(update, EditorUpdate::Scan(ScanOutcome::Added { index: 0 })));
        let update = editor.apply_event(TaskEvent::Scanned { image: photo(10, 10), blank: true });
        assert!(matches!(update, EditorUpdate::Scan(ScanOutcome::BlankSkipped)));
        let update = editor.apply_event(TaskEvent::Failed {
            task: "scan",
            error: InerScanError::DeviceBusy,
        });
        assert!(matches!(update, EditorUpdate::Failed { error: InerScanError::DeviceBusy, .. }));
        assert_eq!(editor.len(), 1);
    }

    #[test]
    fn watermark_and_text_bake_into_source() {
        let Some(path) = inerscan_document::layout::font::find_system_font() else {
            return;
        };
        let font = inerscan_document::layout::font::load_font(&path).unwrap();
        let mut editor = PageEditor::new(AppConfig::default()).with_font(font);
        editor.add_page(DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 200, Px([255, 255, 255]))));
        editor.add_watermark(&WatermarkStyle::default()).unwrap();
        editor.add_text("hello", (10, 10), &TextStyle::default()).unwrap();
        let page = editor.current_page().unwrap();
        assert_eq!(page.history().undo_depth(), 2);
        assert!(page.source().to_rgb8().pixels().any(|p| p.0 != [255, 255, 255]));
    }
}
