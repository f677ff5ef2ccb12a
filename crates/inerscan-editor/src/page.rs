// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page state — an immutable source raster, the pending edit parameters, and
// the processed raster derived from them.
//
// Rendering order is fixed: rotation, flips, grayscale (or colour
// normalisation), brightness, contrast.

use std::sync::Arc;

use image::DynamicImage;
use inerscan_core::error::Result;
use inerscan_core::{PageId, Rotation};
use inerscan_document::ImageProcessor;
use tracing::{debug, instrument};

use crate::history::{History, Snapshot};

/// Non-destructive edit parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditParams {
    pub rotation: Rotation,
    pub flip_h: bool,
    pub flip_v: bool,
    pub grayscale: bool,
    /// Linear multiplier; 1.0 is neutral.
    pub brightness: f32,
    /// Linear multiplier; 1.0 is neutral.
    pub contrast: f32,
}

impl Default for EditParams {
    fn default() -> Self {
        Self {
            rotation: Rotation::None,
            flip_h: false,
            flip_v: false,
            grayscale: false,
            brightness: 1.0,
            contrast: 1.0,
        }
    }
}

impl EditParams {
    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }
}

/// Apply `params` to `source`. Pure: equal inputs give byte-identical output.
pub fn render(source: &DynamicImage, params: &EditParams) -> DynamicImage {
    let mut raster = ImageProcessor::from_dynamic(source.clone()).rotate(params.rotation);
    if params.flip_h {
        raster = raster.flip_horizontal();
    }
    if params.flip_v {
        raster = raster.flip_vertical();
    }
    raster = if params.grayscale {
        raster.grayscale()
    } else {
        raster.normalize_color()
    };
    if params.brightness != 1.0 {
        raster = raster.adjust_brightness(params.brightness);
    }
    if params.contrast != 1.0 {
        raster = raster.adjust_contrast(params.contrast);
    }
    raster.into_dynamic()
}

/// One document page with its own edit history.
#[derive(Debug, Clone)]
pub struct Page {
    id: PageId,
    source: Arc<DynamicImage>,
    params: EditParams,
    processed: DynamicImage,
    history: History,
}

impl Page {
    /// A fresh page: neutral parameters, empty history.
    pub fn new(raster: DynamicImage, undo_limit: usize) -> Self {
        let params = EditParams::default();
        let processed = render(&raster, &params);
        Self {
            id: PageId::new(),
            source: Arc::new(raster),
            params,
            processed,
            history: History::new(undo_limit),
        }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn source(&self) -> &DynamicImage {
        &self.source
    }

    pub fn params(&self) -> EditParams {
        self.params
    }

    /// The display/export raster.
    pub fn processed(&self) -> &DynamicImage {
        &self.processed
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            source: Arc::clone(&self.source),
            params: self.params,
        }
    }

    /// Non-destructive transition. Returns `false` (and records nothing)
    /// when `change` leaves the parameters as they were.
    #[instrument(skip_all, fields(page = %self.id))]
    pub fn edit(&mut self, change: impl FnOnce(&mut EditParams)) -> bool {
        let mut params = self.params;
        change(&mut params);
        if params == self.params {
            debug!("parameters unchanged");
            return false;
        }
        self.history.record(self.snapshot());
        self.params = params;
        self.recompute();
        true
    }

    /// Destructive transition: run `op` on the processed raster and make the
    /// result the new source with neutral parameters. On error the page is
    /// left exactly as it was.
    #[instrument(skip_all, fields(page = %self.id))]
    pub fn bake(&mut self, op: impl FnOnce(&DynamicImage) -> Result<DynamicImage>) -> Result<()> {
        let result = op(&self.processed)?;
        self.history.record(self.snapshot());
        self.source = Arc::new(result);
        self.params = EditParams::default();
        self.recompute();
        debug!(width = self.source.width(), height = self.source.height(), "source replaced");
        Ok(())
    }

    /// Restore the previous snapshot. `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.snapshot()) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    /// Re-apply the most recently undone snapshot.
    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.snapshot()) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.source = snapshot.source;
        self.params = snapshot.params;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.processed = render(&self.source, &self.params);
    }
}
