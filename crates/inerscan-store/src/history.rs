// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan history — SQLite log of every exported file.
//
// Schema:
//   scan_history(
//     id          INTEGER PRIMARY KEY AUTOINCREMENT,
//     filename    TEXT    NOT NULL,
//     filepath    TEXT    NOT NULL,
//     file_type   TEXT,              -- "JPEG" or "PDF"
//     page_count  INTEGER,
//     file_size   INTEGER,           -- bytes
//     scan_date   TEXT    NOT NULL,  -- RFC 3339
//     notes       TEXT
//   )

use std::path::Path;

use chrono::Utc;
use inerscan_core::ExportKind;
use inerscan_core::error::{InerScanError, Result};
use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Number of entries returned by [`ScanHistory::recent`] callers that do not
/// choose a limit.
pub const DEFAULT_RECENT_LIMIT: u32 = 50;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS scan_history (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    filename    TEXT    NOT NULL,
    filepath    TEXT    NOT NULL,
    file_type   TEXT,
    page_count  INTEGER,
    file_size   INTEGER,
    scan_date   TEXT    NOT NULL,
    notes       TEXT
);";

/// Convert a `rusqlite::Error` into an `InerScanError::Database`.
pub(crate) fn db_err(e: rusqlite::Error) -> InerScanError {
    InerScanError::Database(e.to_string())
}

/// A stored history record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub filename: String,
    pub filepath: String,
    pub file_type: String,
    pub page_count: u32,
    pub file_size: u64,
    pub scan_date: String,
    pub notes: String,
}

/// Fields supplied when recording an export.
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub filename: String,
    pub filepath: String,
    pub file_type: ExportKind,
    pub page_count: u32,
    pub file_size: u64,
    pub notes: String,
}

/// History of exported files backed by SQLite.
pub struct ScanHistory {
    conn: Connection,
}

impl ScanHistory {
    /// Open (or create) the history table in the database at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        debug!("scan history opened");
        Ok(Self { conn })
    }

    /// Open an in-memory history (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self { conn })
    }

    /// Record an export and return the new row id.
    #[instrument(skip(self, entry), fields(filename = %entry.filename, kind = entry.file_type.label()))]
    pub fn add(&self, entry: &NewHistoryEntry) -> Result<i64> {
        let scan_date = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO scan_history
                    (filename, filepath, file_type, page_count, file_size, scan_date, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    entry.filename,
                    entry.filepath,
                    entry.file_type.label(),
                    entry.page_count,
                    entry.file_size as i64,
                    scan_date,
                    entry.notes,
                ],
            )
            .map_err(db_err)?;
        let id = self.conn.last_insert_rowid();
        debug!(id, "history entry recorded");
        Ok(id)
    }

    /// The most recent `limit` entries, newest first.
    pub fn recent(&self, limit: u32) -> Result<Vec<HistoryEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, filename, filepath, file_type, page_count, file_size, scan_date, notes
                 FROM scan_history
                 ORDER BY scan_date DESC, id DESC
                 LIMIT ?1",
            )
            .map_err(db_err)?;

        let rows = stmt.query_map(params![limit], entry_from_row).map_err(db_err)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(db_err)?);
        }
        Ok(entries)
    }

    /// Delete one entry. Returns whether a row was removed.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM scan_history WHERE id = ?1", params![id])
            .map_err(db_err)?;
        Ok(removed > 0)
    }

    /// Remove every entry.
    pub fn clear(&self) -> Result<()> {
        self.conn
            .execute("DELETE FROM scan_history", [])
            .map_err(db_err)?;
        debug!("scan history cleared");
        Ok(())
    }

    /// Return the total number of entries.
    pub fn count(&self) -> Result<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM scan_history", [], |row| row.get(0))
            .map_err(db_err)
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<HistoryEntry> {
    Ok(HistoryEntry {
        id: row.get(0)?,
        filename: row.get(1)?,
        filepath: row.get(2)?,
        file_type: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        page_count: row.get::<_, Option<u32>>(4)?.unwrap_or_default(),
        file_size: row.get::<_, Option<i64>>(5)?.unwrap_or_default().max(0) as u64,
        scan_date: row.get(6)?,
        notes: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_history() -> ScanHistory {
        ScanHistory::open_in_memory().expect("open in-memory history")
    }

    fn pdf(name: &str, pages: u32) -> NewHistoryEntry {
        NewHistoryEntry {
            filename: name.into(),
            filepath: format!("/tmp/{name}"),
            file_type: ExportKind::Pdf,
            page_count: pages,
            file_size: 1024,
            notes: String::new(),
        }
    }

    #[test]
    fn add_and_count() {
        let history = make_history();
        assert_eq!(history.count().unwrap(), 0);
        history.add(&pdf("Scan.pdf", 3)).unwrap();
        history.add(&pdf("Other.pdf", 1)).unwrap();
        assert_eq!(history.count().unwrap(), 2);
    }

    #[test]
    fn recent_is_newest_first_and_limited() {
        let history = make_history();
        for i in 0..5 {
            history.add(&pdf(&format!("Scan_{i}.pdf"), 1)).unwrap();
        }
        let recent = history.recent(3).unwrap();
        assert_eq!(recent.len(), 3);
        assert!(recent[0].id > recent[1].id);
        assert!(recent[1].id > recent[2].id);
        assert_eq!(recent[0].filename, "Scan_4.pdf");
        assert_eq!(recent[0].file_type, "PDF");
    }

    #[test]
    fn delete_and_clear() {
        let history = make_history();
        let id = history.add(&pdf("a.pdf", 1)).unwrap();
        history.add(&pdf("b.pdf", 1)).unwrap();
        assert!(history.delete(id).unwrap());
        assert!(!history.delete(id).unwrap());
        assert_eq!(history.count().unwrap(), 1);
        history.clear().unwrap();
        assert_eq!(history.count().unwrap(), 0);
    }

    #[test]
    fn entry_fields_round_trip_through_sqlite() {
        let history = make_history();
        let mut entry = pdf("Scan_1.jpg", 1);
        entry.file_type = ExportKind::Jpeg;
        entry.file_size = 4096;
        entry.notes = "sha256:abc".into();
        history.add(&entry).unwrap();

        let stored = &history.recent(DEFAULT_RECENT_LIMIT).unwrap()[0];
        assert_eq!(stored.file_type, "JPEG");
        assert_eq!(stored.file_size, 4096);
        assert_eq!(stored.notes, "sha256:abc");
        assert!(chrono::DateTime::parse_from_rfc3339(&stored.scan_date).is_ok());
    }

    #[test]
    fn file_backed_history_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inerscan.db");
        ScanHistory::open(&path).unwrap().add(&pdf("keep.pdf", 2)).unwrap();
        assert_eq!(ScanHistory::open(&path).unwrap().count().unwrap(), 1);
    }
}
