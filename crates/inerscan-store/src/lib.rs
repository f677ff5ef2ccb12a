// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// inerscan-store — Local persistence for the InerScan workstation.
//
// A key-value settings table, an append-only history of exported files and
// SHA-256 fingerprints recorded alongside each export. Both tables live in
// one SQLite database in the data directory.

pub mod history;
pub mod integrity;
pub mod settings;

pub use history::{HistoryEntry, NewHistoryEntry, ScanHistory};
pub use integrity::{hash_bytes, hash_file};
pub use settings::SettingsStore;
