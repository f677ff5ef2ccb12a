// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folder scanner — treats image files on disk as successive scans.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::DynamicImage;
use inerscan_core::error::{InerScanError, Result};
use tracing::{debug, info, instrument};

use crate::traits::ScannerDevice;

/// Extensions accepted when listing a directory.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff", "webp", "gif"];

/// Yields one decoded file per `acquire` call, then reports cancellation.
pub struct FolderScanner {
    name: String,
    pending: Mutex<VecDeque<PathBuf>>,
}

impl FolderScanner {
    /// Scan the given files in the order supplied.
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            name: "File input".into(),
            pending: Mutex::new(paths.into_iter().collect()),
        }
    }

    /// Scan every image file directly inside `dir`, sorted by file name.
    #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => {
                InerScanError::DeviceAccessDenied(dir.display().to_string())
            }
            _ => InerScanError::Device(format!("{}: {e}", dir.display())),
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && has_image_extension(path))
            .collect();
        paths.sort();
        info!(files = paths.len(), "folder scanner ready");

        Ok(Self {
            name: format!("Folder {}", dir.display()),
            pending: Mutex::new(paths.into()),
        })
    }

    /// Files not yet acquired.
    pub fn remaining(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl ScannerDevice for FolderScanner {
    fn name(&self) -> &str {
        &self.name
    }

    fn acquire(&self) -> Result<Option<DynamicImage>> {
        let next = self.pending.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
        let Some(path) = next else {
            debug!("folder exhausted");
            return Ok(None);
        };
        let image = image::open(&path).map_err(|e| match e {
            image::ImageError::IoError(io) => {
                InerScanError::Device(format!("{}: {io}", path.display()))
            }
            other => InerScanError::ImageError(format!("{}: {other}", path.display())),
        })?;
        debug!(path = %path.display(), width = image.width(), height = image.height(), "acquired");
        Ok(Some(image))
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}
