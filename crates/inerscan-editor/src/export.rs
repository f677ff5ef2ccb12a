// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export — write the current page as JPEG or every page as one PDF, then
// log the file in the scan history.
//
// Exports read processed rasters only; page state is never changed, so a
// failed export loses nothing.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use inerscan_core::ExportKind;
use inerscan_core::error::{InerScanError, Result};
use inerscan_document::{ImageProcessor, PdfWriter};
use inerscan_store::{NewHistoryEntry, ScanHistory, hash_bytes};
use tracing::{info, instrument, warn};

use crate::editor::PageEditor;

/// A file written by an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRecord {
    pub path: PathBuf,
    pub kind: ExportKind,
    pub page_count: u32,
    pub file_size: u64,
    /// Lowercase hex SHA-256 of the written bytes.
    pub sha256: String,
    /// Row id in the scan history, when one was given and the insert worked.
    pub history_id: Option<i64>,
}

/// Write the selected page to `{dir}/{prefix}_{index + 1}.jpg`.
#[instrument(skip(editor, history), fields(dir = %dir.display()))]
pub fn export_current_jpeg(
    editor: &PageEditor,
    dir: &Path,
    prefix: &str,
    history: Option<&ScanHistory>,
) -> Result<ExportRecord> {
    check_prefix(prefix)?;
    let index = editor.current_index().ok_or(InerScanError::NoPageSelected)?;
    let page = editor.current_page().ok_or(InerScanError::NoPageSelected)?;

    let flat = DynamicImage::ImageRgb8(page.processed().to_rgb8());
    let bytes = ImageProcessor::from_dynamic(flat).to_jpeg_bytes(editor.config().jpeg_quality)?;
    let path = dir.join(format!("{prefix}_{}.{}", index + 1, ExportKind::Jpeg.extension()));
    write_output(dir, &path, &bytes)?;

    Ok(finish(&path, ExportKind::Jpeg, 1, &bytes, history))
}

/// Write every page, in order, to `{dir}/{prefix}.pdf`.
#[instrument(skip(editor, history), fields(dir = %dir.display(), pages = editor.len()))]
pub fn export_pdf(
    editor: &PageEditor,
    dir: &Path,
    prefix: &str,
    history: Option<&ScanHistory>,
) -> Result<ExportRecord> {
    check_prefix(prefix)?;
    if editor.is_empty() {
        return Err(InerScanError::PdfError("no pages to export".into()));
    }

    let images: Vec<DynamicImage> = editor.pages().iter().map(|p| p.processed().clone()).collect();
    let mut writer = PdfWriter::new(editor.config().export_dpi);
    writer.set_title(prefix);
    let bytes = writer.create_from_images(&images)?;
    let path = dir.join(format!("{prefix}.{}", ExportKind::Pdf.extension()));
    write_output(dir, &path, &bytes)?;

    Ok(finish(&path, ExportKind::Pdf, images.len() as u32, &bytes, history))
}

fn check_prefix(prefix: &str) -> Result<()> {
    if prefix.trim().is_empty() || prefix.contains(['/', '\\']) {
        return Err(InerScanError::InvalidParameter(format!(
            "invalid file name prefix {prefix:?}"
        )));
    }
    Ok(())
}

fn write_output(dir: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

fn finish(
    path: &Path,
    kind: ExportKind,
    page_count: u32,
    bytes: &[u8],
    history: Option<&ScanHistory>,
) -> ExportRecord {
    let sha256 = hash_bytes(bytes);
    let file_size = bytes.len() as u64;
    info!(path = %path.display(), kind = kind.label(), page_count, file_size, "export written");

    // The file is already on disk; a history failure is reported, not fatal.
    let history_id = history.and_then(|history| {
        let entry = NewHistoryEntry {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            filepath: path.display().to_string(),
            file_type: kind,
            page_count,
            file_size,
            notes: format!("sha256:{sha256}"),
        };
        history
            .add(&entry)
            .inspect_err(|e| warn!(error = %e, "could not record export in history"))
            .ok()
    });

    ExportRecord {
        path: path.to_path_buf(),
        kind,
        page_count,
        file_size,
        sha256,
        history_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use inerscan_core::AppConfig;

    fn editor_with(count: usize) -> PageEditor {
        let mut editor = PageEditor::new(AppConfig { export_dpi: 72, ..AppConfig::default() });
        for i in 0..count {
            let w = 40 + i as u32 * 10;
            editor.add_page(DynamicImage::ImageRgba8(RgbaImage::from_fn(w, 30, |x, _| {
                Rgba([x as u8, 100, 200, if x % 2 == 0 { 255 } else { 0 }])
            })));
        }
        editor
    }

    #[test]
    fn jpeg_uses_page_number_and_records_history() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("scans");
        let history = ScanHistory::open_in_memory().unwrap();
        let mut editor = editor_with(3);
        editor.select(1).unwrap();

        let record = export_current_jpeg(&editor, &out, "Scan", Some(&history)).unwrap();
        assert_eq!(record.path, out.join("Scan_2.jpg"));
        assert_eq!(record.page_count, 1);
        assert_eq!(record.file_size, std::fs::metadata(&record.path).unwrap().len());

        let decoded = image::open(&record.path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (50, 30));

        let entries = history.recent(10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(Some(entries[0].id), record.history_id);
        assert_eq!(entries[0].file_type, "JPEG");
        assert_eq!(entries[0].notes, format!("sha256:{}", record.sha256));
    }

    #[test]
    fn pdf_has_one_page_per_editor_page() {
        let dir = tempfile::tempdir().unwrap();
        let editor = editor_with(3);
        let record = export_pdf(&editor, dir.path(), "Report", None).unwrap();
        assert_eq!(record.path, dir.path().join("Report.pdf"));
        assert_eq!(record.page_count, 3);
        assert_eq!(record.history_id, None);

        let doc = lopdf::Document::load(&record.path).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn nothing_to_export() {
        let dir = tempfile::tempdir().unwrap();
        let editor = PageEditor::new(AppConfig::default());
        assert!(matches!(
            export_current_jpeg(&editor, dir.path(), "Scan", None),
            Err(InerScanError::NoPageSelected)
        ));
        assert!(matches!(
            export_pdf(&editor, dir.path(), "Scan", None),
            Err(InerScanError::PdfError(_))
        ));
    }

    #[test]
    fn bad_prefix_and_bad_directory_leave_pages_alone() {
        let dir = tempfile::tempdir().unwrap();
        let editor = editor_with(1);
        assert!(matches!(
            export_pdf(&editor, dir.path(), "a/b", None),
            Err(InerScanError::InvalidParameter(_))
        ));

        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let result = export_current_jpeg(&editor, &blocker.join("sub"), "Scan", None);
        assert!(matches!(result, Err(InerScanError::Io(_))));
        assert_eq!(editor.len(), 1);
        assert_eq!(editor.current_page().unwrap().source().width(), 40);
    }
}
