// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Runtime settings — string key/value pairs in the `app_settings` table.

use std::path::{Path, PathBuf};

use inerscan_core::error::Result;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, instrument};

use crate::history::db_err;

/// Well-known setting keys.
pub mod keys {
    pub const OUTPUT_DIR: &str = "output_dir";
    pub const FILENAME_PREFIX: &str = "filename_prefix";
    pub const OPENAI_API_KEY: &str = "openai_api_key";
    pub const OPENAI_BASE_URL: &str = "openai_base_url";
    pub const OPENAI_MODEL: &str = "openai_model";

    pub const ALL: [&str; 5] = [
        OUTPUT_DIR,
        FILENAME_PREFIX,
        OPENAI_API_KEY,
        OPENAI_BASE_URL,
        OPENAI_MODEL,
    ];
}

pub const DEFAULT_PREFIX: &str = "Scan";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS app_settings (
    key   TEXT PRIMARY KEY,
    value TEXT
);";

/// Key/value settings backed by SQLite. Writes replace any previous value.
pub struct SettingsStore {
    conn: Connection,
}

impl SettingsStore {
    /// Open (or create) the settings table in the database at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        debug!("settings store opened");
        Ok(Self { conn })
    }

    /// Open an in-memory store (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self { conn })
    }

    /// Stored value for `key`, if any.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM app_settings WHERE key = ?1",
                params![key],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()
            .map(Option::flatten)
            .map_err(db_err)
    }

    /// Stored value for `key`, or `default` when unset.
    pub fn get_or(&self, key: &str, default: &str) -> Result<String> {
        Ok(self.get(key)?.unwrap_or_else(|| default.to_owned()))
    }

    /// Stored value, falling back to the built-in default for well-known
    /// keys (empty for anything else).
    pub fn get_or_default(&self, key: &str) -> Result<String> {
        match self.get(key)? {
            Some(value) => Ok(value),
            None => Ok(default_for(key)),
        }
    }

    /// Insert or replace a setting.
    #[instrument(skip(self, value))]
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO app_settings (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(db_err)?;
        debug!("setting saved");
        Ok(())
    }

    // -- Typed accessors ------------------------------------------------------

    pub fn output_dir(&self) -> Result<PathBuf> {
        Ok(PathBuf::from(self.get_or_default(keys::OUTPUT_DIR)?))
    }

    pub fn filename_prefix(&self) -> Result<String> {
        self.get_or_default(keys::FILENAME_PREFIX)
    }

    pub fn api_key(&self) -> Result<String> {
        self.get_or_default(keys::OPENAI_API_KEY)
    }

    pub fn base_url(&self) -> Result<String> {
        self.get_or_default(keys::OPENAI_BASE_URL)
    }

    pub fn model(&self) -> Result<String> {
        self.get_or_default(keys::OPENAI_MODEL)
    }
}

/// Built-in default for a well-known key.
pub fn default_for(key: &str) -> String {
    match key {
        keys::OUTPUT_DIR => default_output_dir().to_string_lossy().into_owned(),
        keys::FILENAME_PREFIX => DEFAULT_PREFIX.into(),
        keys::OPENAI_BASE_URL => DEFAULT_BASE_URL.into(),
        keys::OPENAI_MODEL => DEFAULT_MODEL.into(),
        _ => String::new(),
    }
}

/// `~/Documents/Scans`, or `./Scans` when no home directory is known.
fn default_output_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(|home| PathBuf::from(home).join("Documents").join("Scans"))
        .unwrap_or_else(|| PathBuf::from("Scans"))
}
