// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch scanning — repeated acquisitions with a pause between them.
//
// The loop runs on a worker thread and only ever hands images back through
// `post`; it never touches page state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use inerscan_bridge::ScannerDevice;
use inerscan_core::AppConfig;
use inerscan_document::scan::enhance::detect_blank;
use tracing::{debug, info, instrument, warn};

use crate::tasks::TaskEvent;

/// Granularity of the cancellable pause between acquisitions.
const CANCEL_POLL: Duration = Duration::from_millis(50);

/// Parameters of one batch run.
#[derive(Debug, Clone)]
pub struct BatchScan {
    /// Pages to collect; 0 keeps going until cancelled.
    pub target: u32,
    pub delay: Duration,
    pub skip_blank: bool,
    pub blank_threshold: f64,
}

impl BatchScan {
    pub fn from_config(config: &AppConfig, target: u32) -> Self {
        Self {
            target,
            delay: Duration::from_millis(config.batch_delay_ms),
            skip_blank: config.skip_blank_pages,
            blank_threshold: config.blank_variance_threshold,
        }
    }
}

/// Why a batch stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchEnd {
    TargetReached,
    /// The cancel flag was raised.
    Cancelled,
    /// The device returned no image.
    DeviceCancelled,
    /// The device failed; the error was posted separately.
    DeviceError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    /// Pages that count towards the target.
    pub acquired: u32,
    pub skipped_blank: u32,
    pub end: BatchEnd,
}

/// Acquire until the target is met, the flag is raised, the device cancels
/// or the device fails. Every image is posted as `Scanned`; the run ends
/// with a `BatchFinished` event carrying the returned summary.
#[instrument(skip_all, fields(device = device.name(), target = batch.target))]
pub fn run_batch(
    device: &dyn ScannerDevice,
    batch: &BatchScan,
    cancel: &AtomicBool,
    mut post: impl FnMut(TaskEvent),
) -> BatchSummary {
    let mut acquired = 0u32;
    let mut skipped_blank = 0u32;

    let end = loop {
        if cancel.load(Ordering::Relaxed) {
            break BatchEnd::Cancelled;
        }
        match device.acquire() {
            Ok(Some(image)) => {
                let blank = detect_blank(&image, batch.blank_threshold);
                if blank && batch.skip_blank {
                    skipped_blank += 1;
                    debug!("blank page does not count towards the target");
                } else {
                    acquired += 1;
                }
                post(TaskEvent::Scanned { image, blank });
                if batch.target > 0 && acquired >= batch.target {
                    break BatchEnd::TargetReached;
                }
            }
            Ok(None) => break BatchEnd::DeviceCancelled,
            Err(error) => {
                warn!(%error, "batch acquisition failed");
                post(TaskEvent::Failed { task: "batch scan", error });
                break BatchEnd::DeviceError;
            }
        }
        if !pause(batch.delay, cancel) {
            break BatchEnd::Cancelled;
        }
    };

    let summary = BatchSummary { acquired, skipped_blank, end };
    info!(acquired, skipped_blank, end = ?end, "batch finished");
    post(TaskEvent::BatchFinished(summary));
    summary
}

/// Sleep for `delay`, waking early if `cancel` is raised. Returns `false`
/// when cancelled.
fn pause(delay: Duration, cancel: &AtomicBool) -> bool {
    let deadline = Instant::now() + delay;
    loop {
        if cancel.load(Ordering::Relaxed) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep(CANCEL_POLL.min(deadline - now));
    }
}
