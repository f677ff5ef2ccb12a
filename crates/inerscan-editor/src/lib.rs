// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// inerscan-editor — The page edit pipeline.
//
// Each page keeps an immutable source raster plus edit parameters and a
// bounded undo/redo history. `PageEditor` owns the ordered page list;
// scanner and remote calls run on background workers and hand their results
// back as `TaskEvent`s.

pub mod batch;
pub mod editor;
pub mod export;
pub mod history;
pub mod page;
pub mod tasks;

pub use batch::{BatchEnd, BatchScan, BatchSummary, run_batch};
pub use editor::{EditorUpdate, PageEditor, ScanOutcome};
pub use export::{ExportRecord, export_current_jpeg, export_pdf};
pub use history::{History, Snapshot};
pub use page::{EditParams, Page, render};
pub use tasks::{BatchHandle, TaskEvent, TaskRunner};
