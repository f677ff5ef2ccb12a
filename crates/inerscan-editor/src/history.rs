// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded linear undo/redo history of page snapshots.

use std::collections::VecDeque;
use std::sync::Arc;

use image::DynamicImage;

use crate::page::EditParams;

/// Full restorable state of a page: its source raster and parameters.
///
/// Sources are never mutated in place, so sharing the raster through an
/// `Arc` cannot alias a later edit.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub source: Arc<DynamicImage>,
    pub params: EditParams,
}

/// Undo and redo stacks for one page.
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
    limit: usize,
}

impl History {
    /// `limit` caps the undo stack; the oldest snapshot is evicted first.
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::with_capacity(limit.min(64)),
            redo: Vec::new(),
            limit,
        }
    }

    /// Record the state before a new edit. Starts a new branch, so any
    /// pending redo states are dropped.
    pub fn record(&mut self, before: Snapshot) {
        self.push_undo(before);
        self.redo.clear();
    }

    /// Step back. `current` moves onto the redo stack; `None` when there is
    /// nothing to undo (and `current` is discarded).
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current);
        Some(previous)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo.pop()?;
        self.push_undo(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    fn push_undo(&mut self, snapshot: Snapshot) {
        if self.limit == 0 {
            return;
        }
        while self.undo.len() >= self.limit {
            self.undo.pop_front();
        }
        self.undo.push_back(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(brightness: f32) -> Snapshot {
        Snapshot {
            source: Arc::new(DynamicImage::new_rgb8(1, 1)),
            params: EditParams { brightness, ..EditParams::default() },
        }
    }

    #[test]
    fn oldest_snapshots_are_evicted() {
        let mut history = History::new(3);
        for i in 0..5 {
            history.record(snap(i as f32));
        }
        assert_eq!(history.undo_depth(), 3);
        let restored = history.undo(snap(99.0)).unwrap();
        assert_eq!(restored.params.brightness, 4.0);
        history.undo(snap(4.0)).unwrap();
        let oldest = history.undo(snap(3.0)).unwrap();
        assert_eq!(oldest.params.brightness, 2.0);
        assert!(history.undo(snap(2.0)).is_none());
    }

    #[test]
    fn new_branch_clears_redo() {
        let mut history = History::new(20);
        history.record(snap(1.0));
        history.undo(snap(2.0)).unwrap();
        assert!(history.can_redo());
        history.record(snap(1.0));
        assert!(!history.can_redo());
    }

    #[test]
    fn redo_returns_the_undone_state() {
        let mut history = History::new(20);
        history.record(snap(1.0));
        let previous = history.undo(snap(2.0)).unwrap();
        assert_eq!(previous.params.brightness, 1.0);
        let next = history.redo(previous).unwrap();
        assert_eq!(next.params.brightness, 2.0);
        assert_eq!(history.undo_depth(), 1);
        assert_eq!(history.redo_depth(), 0);
    }

    #[test]
    fn zero_limit_keeps_nothing() {
        let mut history = History::new(0);
        history.record(snap(1.0));
        assert!(!history.can_undo());
    }
}
