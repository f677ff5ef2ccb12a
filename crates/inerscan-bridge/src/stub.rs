// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub scanner for builds and tests without a physical device.
//
// An empty stub reports `PlatformUnavailable`. A scripted stub replays a
// queue of outcomes (pages, cancellations, errors) and reports cancellation
// once the queue runs dry.

use std::collections::VecDeque;
use std::sync::Mutex;

use image::DynamicImage;
use inerscan_core::error::{InerScanError, Result};

use crate::traits::ScannerDevice;

type Outcome = Result<Option<DynamicImage>>;

/// Scanner stand-in with a scripted outcome queue.
pub struct StubScanner {
    script: Option<Mutex<VecDeque<Outcome>>>,
}

impl StubScanner {
    /// A scanner that is never available.
    pub fn unavailable() -> Self {
        Self { script: None }
    }

    /// A scanner that yields `pages` in order, then cancels.
    pub fn with_pages(pages: impl IntoIterator<Item = DynamicImage>) -> Self {
        Self::scripted(pages.into_iter().map(|page| Ok(Some(page))))
    }

    /// A scanner that replays arbitrary outcomes in order, then cancels.
    pub fn scripted(outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        Self {
            script: Some(Mutex::new(outcomes.into_iter().collect())),
        }
    }

    /// Outcomes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script
            .as_ref()
            .map(|queue| queue.lock().unwrap_or_else(|e| e.into_inner()).len())
            .unwrap_or(0)
    }
}

impl ScannerDevice for StubScanner {
    fn name(&self) -> &str {
        "Stub scanner"
    }

    fn acquire(&self) -> Result<Option<DynamicImage>> {
        let Some(queue) = &self.script else {
            tracing::warn!("ScannerDevice::acquire called on stub scanner");
            return Err(InerScanError::PlatformUnavailable);
        };
        let next = queue.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
        next.unwrap_or(Ok(None))
    }
}
