// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background tasks — blocking collaborator calls run on tokio's blocking
// pool and report back over an unbounded channel. Only the thread that owns
// the `PageEditor` drains the channel and applies results.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use image::DynamicImage;
use inerscan_bridge::{ChatMessage, RemoteIntelligence, RemoteKind, ScannerDevice};
use inerscan_core::InerScanError;
use inerscan_document::scan::enhance::detect_blank;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::batch::{BatchScan, BatchSummary, run_batch};

/// Immutable result handed back to the owner thread.
#[derive(Debug)]
pub enum TaskEvent {
    /// One acquired raster, already classified for blankness.
    Scanned { image: DynamicImage, blank: bool },
    /// A single scan returned no image.
    ScanCancelled,
    BatchFinished(BatchSummary),
    RemoteText { kind: RemoteKind, text: String },
    Failed { task: &'static str, error: InerScanError },
}

/// Control handle for a running batch.
pub struct BatchHandle {
    cancel: Arc<AtomicBool>,
    join: JoinHandle<BatchSummary>,
}

impl BatchHandle {
    /// Ask the batch to stop before its next acquisition.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the worker. `None` if it panicked.
    pub async fn join(self) -> Option<BatchSummary> {
        self.join.await.ok()
    }
}

/// Spawns collaborator calls and collects their results.
pub struct TaskRunner {
    handle: Handle,
    tx: mpsc::UnboundedSender<TaskEvent>,
    rx: mpsc::UnboundedReceiver<TaskEvent>,
}

impl TaskRunner {
    pub fn new(handle: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { handle, tx, rx }
    }

    /// Acquire one page on a worker.
    pub fn spawn_scan(&self, device: Arc<dyn ScannerDevice>, blank_threshold: f64) -> JoinHandle<()> {
        let tx = self.tx.clone();
        self.handle.spawn_blocking(move || {
            debug!(device = device.name(), "scan started");
            let event = match device.acquire() {
                Ok(Some(image)) => {
                    let blank = detect_blank(&image, blank_threshold);
                    TaskEvent::Scanned { image, blank }
                }
                Ok(None) => TaskEvent::ScanCancelled,
                Err(error) => TaskEvent::Failed { task: "scan", error },
            };
            deliver(&tx, event);
        })
    }

    /// Run a batch on a worker. Every page is posted as it arrives.
    pub fn spawn_batch(&self, device: Arc<dyn ScannerDevice>, batch: BatchScan) -> BatchHandle {
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let tx = self.tx.clone();
        let join = self.handle.spawn_blocking(move || {
            run_batch(device.as_ref(), &batch, &flag, |event| deliver(&tx, event))
        });
        BatchHandle { cancel, join }
    }

    /// Run a single-image remote request (OCR, filename, analysis).
    pub fn spawn_remote(
        &self,
        service: Arc<dyn RemoteIntelligence>,
        kind: RemoteKind,
        image: DynamicImage,
    ) -> JoinHandle<()> {
        let tx = self.tx.clone();
        self.handle.spawn_blocking(move || {
            let text = service.run(kind, &image);
            deliver(&tx, TaskEvent::RemoteText { kind, text });
        })
    }

    /// Continue a chat conversation, optionally about a page.
    pub fn spawn_chat(
        &self,
        service: Arc<dyn RemoteIntelligence>,
        message: String,
        history: Vec<ChatMessage>,
        image: Option<DynamicImage>,
    ) -> JoinHandle<()> {
        let tx = self.tx.clone();
        self.handle.spawn_blocking(move || {
            let text = service.chat(&message, &history, image.as_ref());
            deliver(&tx, TaskEvent::RemoteText { kind: RemoteKind::Chat, text });
        })
    }

    /// Next finished result, if one is waiting.
    pub fn try_next(&mut self) -> Option<TaskEvent> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next result.
    pub async fn next(&mut self) -> Option<TaskEvent> {
        self.rx.recv().await
    }

    /// Wait for the next result from synchronous code. Must not be called
    /// from inside the runtime.
    pub fn blocking_next(&mut self) -> Option<TaskEvent> {
        self.rx.blocking_recv()
    }
}

fn deliver(tx: &mpsc::UnboundedSender<TaskEvent>, event: TaskEvent) {
    if tx.send(event).is_err() {
        warn!("task receiver dropped; result discarded");
    }
}
