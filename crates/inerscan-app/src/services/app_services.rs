// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — opens the settings and history stores, loads the
// config file, and builds the scanner, face detector and remote
// intelligence collaborators for the commands.
//
// The rusqlite-backed stores are `Send` but not `Sync`, so they are wrapped
// in `Arc<Mutex<>>` and can be handed to background tasks.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use inerscan_bridge::{RemoteIntelligence, RemoteSettings, remote_intelligence};
use inerscan_core::AppConfig;
use inerscan_core::error::{InerScanError, Result};
use inerscan_document::scan::faces::locate_default_cascade;
use inerscan_document::scan::{FaceDetector, HaarCascade, NoFaceDetector};
use inerscan_editor::{ExportRecord, PageEditor, export_current_jpeg, export_pdf};
use inerscan_store::settings::keys;
use inerscan_store::{HistoryEntry, ScanHistory, SettingsStore};
use tracing::{info, warn};

use super::data_dir;

const DATABASE_FILE: &str = "inerscan.db";
const CONFIG_FILE: &str = "config.json";

/// Shared application services.
#[derive(Clone)]
pub struct AppServices {
    settings: Arc<Mutex<SettingsStore>>,
    history: Arc<Mutex<ScanHistory>>,
    data_dir: PathBuf,
    config: Arc<Mutex<AppConfig>>,
}

impl AppServices {
    /// Open the stores in the data directory. Call once at startup.
    pub fn init() -> Result<Self> {
        Self::open_in(data_dir::data_dir())
    }

    /// Open the stores in `dir`, which must already exist.
    pub fn open_in(dir: PathBuf) -> Result<Self> {
        info!(path = %dir.display(), "initialising app services");
        let db_path = dir.join(DATABASE_FILE);
        let settings = SettingsStore::open(&db_path)?;
        let history = ScanHistory::open(&db_path)?;
        let config = load_config(&dir).unwrap_or_default();

        Ok(Self {
            settings: Arc::new(Mutex::new(settings)),
            history: Arc::new(Mutex::new(history)),
            data_dir: dir,
            config: Arc::new(Mutex::new(config)),
        })
    }

    /// In-memory stores and default config, for when the data directory is
    /// unusable.
    pub fn fallback() -> Result<Self> {
        warn!("using in-memory settings and history");
        Ok(Self {
            settings: Arc::new(Mutex::new(SettingsStore::open_in_memory()?)),
            history: Arc::new(Mutex::new(ScanHistory::open_in_memory()?)),
            data_dir: std::env::temp_dir(),
            config: Arc::new(Mutex::new(AppConfig::default())),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // -- Config ---------------------------------------------------------------

    pub fn config(&self) -> AppConfig {
        self.config.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Update and persist the config.
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        *self.config.lock().unwrap_or_else(|e| e.into_inner()) = config.clone();
        persist_config(&self.data_dir, config)
    }

    // -- Settings -------------------------------------------------------------

    pub fn setting(&self, key: &str) -> Result<String> {
        check_key(key)?;
        self.settings().get_or_default(key)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        check_key(key)?;
        self.settings().set(key, value)?;
        info!(key, "setting updated");
        Ok(())
    }

    pub fn output_dir(&self) -> Result<PathBuf> {
        self.settings().output_dir()
    }

    pub fn filename_prefix(&self) -> Result<String> {
        self.settings().filename_prefix()
    }

    // -- History --------------------------------------------------------------

    pub fn recent_history(&self, limit: u32) -> Result<Vec<HistoryEntry>> {
        self.history().recent(limit)
    }

    pub fn delete_history(&self, id: i64) -> Result<bool> {
        self.history().delete(id)
    }

    pub fn clear_history(&self) -> Result<()> {
        self.history().clear()
    }

    // -- Export ---------------------------------------------------------------

    /// Export every page to one PDF and log it.
    pub fn export_pdf(&self, editor: &PageEditor, dir: &Path, prefix: &str) -> Result<ExportRecord> {
        let history = self.history();
        export_pdf(editor, dir, prefix, Some(&*history))
    }

    /// Export each page to its own JPEG and log every file.
    pub fn export_jpegs(
        &self,
        editor: &mut PageEditor,
        dir: &Path,
        prefix: &str,
    ) -> Result<Vec<ExportRecord>> {
        let history = self.history();
        let mut records = Vec::with_capacity(editor.len());
        for index in 0..editor.len() {
            editor.select(index)?;
            records.push(export_current_jpeg(editor, dir, prefix, Some(&*history))?);
        }
        Ok(records)
    }

    // -- Collaborators --------------------------------------------------------

    /// Remote intelligence for the stored credentials. An unset key gives
    /// the offline implementation.
    pub fn remote(&self) -> Result<Arc<dyn RemoteIntelligence>> {
        let remote = {
            let settings = self.settings();
            RemoteSettings {
                api_key: settings.api_key()?,
                base_url: settings.base_url()?,
                model: settings.model()?,
            }
        };
        let timeout = self.config().remote_timeout_secs;
        Ok(Arc::from(remote_intelligence(remote, timeout)))
    }

    /// Haar cascade from the config or a well-known install location. Any
    /// failure degrades to a detector that finds nothing.
    pub fn face_detector(&self) -> Box<dyn FaceDetector> {
        let path = self.config().face_cascade_path.or_else(locate_default_cascade);
        let Some(path) = path else {
            info!("no face cascade found; privacy blur disabled");
            return Box::new(NoFaceDetector);
        };
        match HaarCascade::load(&path) {
            Ok(cascade) => {
                info!(path = %path.display(), "face cascade loaded");
                Box::new(cascade)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "face cascade unusable");
                Box::new(NoFaceDetector)
            }
        }
    }

    fn settings(&self) -> std::sync::MutexGuard<'_, SettingsStore> {
        self.settings.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn history(&self) -> std::sync::MutexGuard<'_, ScanHistory> {
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn check_key(key: &str) -> Result<()> {
    if keys::ALL.contains(&key) {
        Ok(())
    } else {
        Err(InerScanError::InvalidParameter(format!(
            "unknown setting {key:?}; known settings: {}",
            keys::ALL.join(", ")
        )))
    }
}

fn load_config(data_dir: &Path) -> Option<AppConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    serde_json::from_str(&data)
        .inspect_err(|e| warn!(path = %path.display(), error = %e, "config file unreadable; using defaults"))
        .ok()
}

fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    #[test]
    fn config_round_trips_through_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let services = AppServices::open_in(dir.path().to_path_buf()).unwrap();
        assert_eq!(services.config().undo_limit, 20);

        let config = AppConfig { jpeg_quality: 70, ..AppConfig::default() };
        services.save_config(&config).unwrap();
        let reopened = AppServices::open_in(dir.path().to_path_buf()).unwrap();
        assert_eq!(reopened.config().jpeg_quality, 70);
    }

    #[test]
    fn corrupt_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        let services = AppServices::open_in(dir.path().to_path_buf()).unwrap();
        assert_eq!(services.config().export_dpi, 300);
    }

    #[test]
    fn settings_reject_unknown_keys() {
        let services = AppServices::fallback().unwrap();
        assert_eq!(services.setting(keys::FILENAME_PREFIX).unwrap(), "Scan");
        services.set_setting(keys::FILENAME_PREFIX, "Invoice").unwrap();
        assert_eq!(services.filename_prefix().unwrap(), "Invoice");
        assert!(matches!(
            services.set_setting("colour", "blue"),
            Err(InerScanError::InvalidParameter(_))
        ));
    }

    #[test]
    fn exports_are_logged() {
        let dir = tempfile::tempdir().unwrap();
        let services = AppServices::fallback().unwrap();
        let mut editor = PageEditor::new(AppConfig::default());
        for _ in 0..2 {
            editor.add_page(DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 20, Rgb([10, 20, 30]))));
        }
        let jpegs = services.export_jpegs(&mut editor, dir.path(), "Scan").unwrap();
        assert_eq!(jpegs.len(), 2);
        assert!(dir.path().join("Scan_2.jpg").exists());
        services.export_pdf(&editor, dir.path(), "Scan").unwrap();

        let entries = services.recent_history(10).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].file_type, "PDF");
        assert!(services.delete_history(entries[0].id).unwrap());
        services.clear_history().unwrap();
        assert!(services.recent_history(10).unwrap().is_empty());
    }

    #[test]
    fn missing_key_gives_offline_remote() {
        let services = AppServices::fallback().unwrap();
        let remote = services.remote().unwrap();
        let page = DynamicImage::new_rgb8(4, 4);
        assert_eq!(remote.ocr(&page), "Error: API Key not configured.");
    }
}
