// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command implementations. Each one takes the shared services, does its
// work through the editor and collaborator crates, and prints a short
// report on stdout.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use image::DynamicImage;
use inerscan_bridge::{FolderScanner, RemoteKind, ScannerDevice};
use inerscan_core::error::{InerScanError, Result};
use inerscan_core::{AppConfig, GridLayout, PaperSize, ResizeMode, Rgb, WatermarkPosition};
use inerscan_document::layout::{TextStyle, WatermarkStyle};
use inerscan_document::{ImageProcessor, ScanEnhancer};
use inerscan_editor::{
    BatchEnd, BatchScan, BatchSummary, EditorUpdate, ExportRecord, PageEditor, ScanOutcome,
    TaskEvent, TaskRunner,
};
use inerscan_store::settings::keys;
use tokio::runtime::Runtime;
use tracing::{info, warn};

use crate::services::app_services::AppServices;

const DEFAULT_TEXT_POSITION: (i32, i32) = (50, 50);

/// Options of the `process` command.
#[derive(Args, Debug, Default)]
pub struct ProcessArgs {
    /// Image files, or a single directory of images
    #[arg(value_name = "INPUTS", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Keep pages that look blank
    #[arg(long)]
    pub keep_blank: bool,

    /// Flatten the document outline to a rectangle
    #[arg(long)]
    pub flatten: bool,

    /// Straighten tilted text
    #[arg(long)]
    pub deskew: bool,

    /// Rotate clockwise by a multiple of 90 degrees
    #[arg(long, value_name = "DEGREES", allow_hyphen_values = true)]
    pub rotate: Option<i32>,

    #[arg(long)]
    pub flip_h: bool,

    #[arg(long)]
    pub flip_v: bool,

    #[arg(long)]
    pub grayscale: bool,

    /// Brightness multiplier (1.0 = unchanged)
    #[arg(long, value_name = "FLOAT")]
    pub brightness: Option<f32>,

    /// Contrast multiplier (1.0 = unchanged)
    #[arg(long, value_name = "FLOAT")]
    pub contrast: Option<f32>,

    /// Binarize for a clean black-on-white page
    #[arg(long)]
    pub clean: bool,

    /// Blur detected faces
    #[arg(long)]
    pub redact: bool,

    /// Make near-white background transparent (optional threshold 0-255)
    #[arg(long, value_name = "T", num_args = 0..=1)]
    pub remove_bg: Option<Option<u8>>,

    /// Trim to the non-transparent content
    #[arg(long)]
    pub trim: bool,

    /// Flatten transparency onto white
    #[arg(long)]
    pub matte: bool,

    /// Place each page on a paper canvas: A4, A3, A5, Letter, Legal or WxH
    #[arg(long, value_name = "SIZE")]
    pub paper: Option<String>,

    /// With --paper, crop the centre instead of shrinking to fit
    #[arg(long, requires = "paper")]
    pub crop_center: bool,

    /// Stamp a watermark on every page
    #[arg(long, value_name = "TEXT")]
    pub watermark: Option<String>,

    /// center, top-left, top-right, bottom-left or bottom-right
    #[arg(long, value_name = "POSITION", requires = "watermark")]
    pub watermark_position: Option<String>,

    /// Write text on every page
    #[arg(long, value_name = "TEXT")]
    pub text: Option<String>,

    /// Top-left corner of --text (default 50,50)
    #[arg(long, value_name = "X,Y", requires = "text")]
    pub text_at: Option<String>,

    /// Split every page into left and right halves
    #[arg(long)]
    pub split: bool,

    /// Merge a duplex job scanned as all fronts then all backs (backs reversed)
    #[arg(long)]
    pub interleave: bool,

    /// Reverse page order
    #[arg(long)]
    pub reverse: bool,

    /// Append a collage of all pages, e.g. 2x2
    #[arg(long, value_name = "CxR")]
    pub grid: Option<String>,

    /// Output directory (defaults to the stored output_dir setting)
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// File name prefix (defaults to the stored filename_prefix setting)
    #[arg(short, long, value_name = "PREFIX", conflicts_with = "auto_name")]
    pub prefix: Option<String>,

    /// Ask the remote service for a file name based on the first page
    #[arg(long)]
    pub auto_name: bool,

    /// Write one JPEG per page instead of a PDF
    #[arg(long)]
    pub jpeg: bool,
}

// -- process ------------------------------------------------------------------

pub fn cmd_process(services: &AppServices, args: ProcessArgs) -> Result<()> {
    let mut config = services.config();
    if args.keep_blank {
        config.skip_blank_pages = false;
    }
    let device: Arc<dyn ScannerDevice> = Arc::new(scanner_for(&args.inputs)?);

    let runtime = Runtime::new()?;
    let mut runner = TaskRunner::new(runtime.handle().clone());
    let mut editor = PageEditor::new(config.clone()).with_face_detector(services.face_detector());

    let summary = load_pages(&mut runner, &mut editor, device, &config)?;
    println!(
        "Loaded {} page(s), skipped {} blank",
        summary.acquired, summary.skipped_blank
    );
    if editor.is_empty() {
        return Err(InerScanError::InvalidParameter("no pages were loaded".into()));
    }

    for index in 0..editor.len() {
        editor.select(index)?;
        edit_page(&mut editor, &args)?;
    }
    arrange_pages(&mut editor, &args)?;

    let dir = match &args.out {
        Some(dir) => dir.clone(),
        None => services.output_dir()?,
    };
    let prefix = if args.auto_name {
        suggest_prefix(services, &mut runner, &editor)?
    } else {
        match &args.prefix {
            Some(prefix) => prefix.clone(),
            None => services.filename_prefix()?,
        }
    };

    if args.jpeg {
        for record in services.export_jpegs(&mut editor, &dir, &prefix)? {
            print_record(&record);
        }
    } else {
        print_record(&services.export_pdf(&editor, &dir, &prefix)?);
    }
    Ok(())
}

fn scanner_for(inputs: &[PathBuf]) -> Result<FolderScanner> {
    match inputs {
        [dir] if dir.is_dir() => FolderScanner::from_dir(dir),
        _ => Ok(FolderScanner::from_paths(inputs.iter().cloned())),
    }
}

/// Run the whole input set as one continuous batch and feed every event to
/// the editor. The first failure is returned after the batch has finished.
fn load_pages(
    runner: &mut TaskRunner,
    editor: &mut PageEditor,
    device: Arc<dyn ScannerDevice>,
    config: &AppConfig,
) -> Result<BatchSummary> {
    let batch = BatchScan {
        delay: Duration::ZERO,
        ..BatchScan::from_config(config, 0)
    };
    let _handle = runner.spawn_batch(device, batch);

    let mut failure = None;
    let summary = loop {
        let Some(event) = runner.blocking_next() else {
            return Err(InerScanError::Device("scan worker stopped unexpectedly".into()));
        };
        if let TaskEvent::BatchFinished(summary) = event {
            break summary;
        }
        match editor.apply_event(event) {
            EditorUpdate::Scan(ScanOutcome::BlankSkipped) => info!("skipped a blank page"),
            EditorUpdate::Failed { error, .. } => {
                failure.get_or_insert(error);
            }
            _ => {}
        }
    };

    match (failure, summary.end) {
        (Some(error), _) => Err(error),
        (None, BatchEnd::DeviceError) => {
            Err(InerScanError::Device("input could not be read".into()))
        }
        (None, _) => Ok(summary),
    }
}

/// Apply the per-page options to the selected page.
fn edit_page(editor: &mut PageEditor, args: &ProcessArgs) -> Result<()> {
    if args.flatten {
        editor.flatten_perspective()?;
    }
    if args.deskew {
        editor.deskew()?;
    }
    if let Some(degrees) = args.rotate {
        editor.rotate(degrees)?;
    }
    if args.flip_h {
        editor.toggle_flip_h()?;
    }
    if args.flip_v {
        editor.toggle_flip_v()?;
    }
    if args.grayscale {
        editor.set_grayscale(true)?;
    }
    if let Some(factor) = args.brightness {
        editor.set_brightness(factor)?;
    }
    if let Some(factor) = args.contrast {
        editor.set_contrast(factor)?;
    }
    if args.clean {
        editor.enhance_text()?;
    }
    if args.redact {
        editor.redact_faces()?;
    }
    if let Some(threshold) = args.remove_bg {
        editor.remove_background(threshold)?;
    }
    if args.trim {
        editor.auto_crop_to_content()?;
    }
    if args.matte {
        editor.composite_on_color(Rgb::WHITE)?;
    }
    if let Some(paper) = &args.paper {
        let mode = if args.crop_center {
            ResizeMode::CropCenter
        } else {
            ResizeMode::Fit
        };
        editor.resize_to_paper(PaperSize::parse(paper)?, mode)?;
    }
    if let Some(text) = &args.watermark {
        let style = WatermarkStyle {
            text: text.clone(),
            position: args
                .watermark_position
                .as_deref()
                .map(WatermarkPosition::parse)
                .unwrap_or_default(),
            ..WatermarkStyle::default()
        };
        editor.add_watermark(&style)?;
    }
    if let Some(text) = &args.text {
        let position = text_origin(args.text_at.as_deref())?;
        editor.add_text(text, position, &TextStyle::default())?;
    }
    Ok(())
}

/// Apply the document-level options: split, interleave, reverse, collage.
fn arrange_pages(editor: &mut PageEditor, args: &ProcessArgs) -> Result<()> {
    if args.split {
        for index in (0..editor.len()).rev() {
            editor.select(index)?;
            editor.split_current()?;
        }
    }
    if args.interleave {
        editor.interleave_pages(true);
    }
    if args.reverse {
        editor.reverse_pages();
    }
    if let Some(layout) = &args.grid {
        editor.create_collage(GridLayout::parse(layout)?)?;
    }
    info!(pages = editor.len(), "document arranged");
    Ok(())
}

fn suggest_prefix(services: &AppServices, runner: &mut TaskRunner, editor: &PageEditor) -> Result<String> {
    let first = editor
        .pages()
        .first()
        .ok_or(InerScanError::NoPageSelected)?
        .processed()
        .clone();
    runner.spawn_remote(services.remote()?, RemoteKind::Filename, first);
    let name = wait_for_text(runner)?;
    info!(name, "remote file name suggestion");
    Ok(name)
}

fn text_origin(text_at: Option<&str>) -> Result<(i32, i32)> {
    text_at.map_or(Ok(DEFAULT_TEXT_POSITION), parse_position)
}

fn parse_position(spec: &str) -> Result<(i32, i32)> {
    let invalid = || InerScanError::InvalidParameter(format!("expected 'X,Y', got '{spec}'"));
    let (x, y) = spec.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse().map_err(|_| invalid())?;
    let y = y.trim().parse().map_err(|_| invalid())?;
    Ok((x, y))
}

fn print_record(record: &ExportRecord) {
    println!(
        "Wrote {} ({} {}, {} page(s), {} bytes, sha256 {})",
        record.path.display(),
        record.kind.label(),
        record.history_id.map_or("unlogged".to_string(), |id| format!("#{id}")),
        record.page_count,
        record.file_size,
        record.sha256
    );
}

// -- blank ----------------------------------------------------------------------

pub fn cmd_blank(services: &AppServices, input: &Path, threshold: Option<f64>) -> Result<()> {
    let threshold = threshold.unwrap_or(services.config().blank_variance_threshold);
    let variance = ScanEnhancer::from_dynamic(load_image(input)?).laplacian_variance();
    let verdict = if variance < threshold { "blank" } else { "content" };
    println!(
        "{}: {verdict} (variance {variance:.2}, threshold {threshold})",
        input.display()
    );
    Ok(())
}

// -- history --------------------------------------------------------------------

pub fn cmd_history(services: &AppServices, limit: u32, delete: Option<i64>, clear: bool) -> Result<()> {
    if clear {
        services.clear_history()?;
        println!("History cleared");
        return Ok(());
    }
    if let Some(id) = delete {
        if services.delete_history(id)? {
            println!("Deleted entry #{id}");
        } else {
            println!("No entry #{id}");
        }
        return Ok(());
    }

    let entries = services.recent_history(limit)?;
    if entries.is_empty() {
        println!("No exports recorded");
    }
    for entry in entries {
        println!(
            "#{:<5} {}  {:<4} {:>3}p {:>10}B  {}",
            entry.id, entry.scan_date, entry.file_type, entry.page_count, entry.file_size, entry.filepath
        );
    }
    Ok(())
}

// -- settings and config ----------------------------------------------------------

pub fn cmd_settings_list(services: &AppServices) -> Result<()> {
    for key in keys::ALL {
        let value = services.setting(key)?;
        if key == keys::OPENAI_API_KEY {
            let shown = if value.is_empty() { "(not set)" } else { "(set)" };
            println!("{key} = {shown}");
        } else {
            println!("{key} = {value}");
        }
    }
    Ok(())
}

pub fn cmd_settings_get(services: &AppServices, key: &str) -> Result<()> {
    println!("{}", services.setting(key)?);
    Ok(())
}

pub fn cmd_settings_set(services: &AppServices, key: &str, value: &str) -> Result<()> {
    services.set_setting(key, value)?;
    println!("{key} updated");
    Ok(())
}

pub fn cmd_config_show(services: &AppServices) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&services.config())?);
    Ok(())
}

pub fn cmd_config_reset(services: &AppServices) -> Result<()> {
    services.save_config(&AppConfig::default())?;
    println!("Default config written to {}", services.data_dir().display());
    Ok(())
}

// -- remote intelligence -----------------------------------------------------------

pub fn cmd_remote(services: &AppServices, kind: RemoteKind, input: &Path) -> Result<()> {
    let image = load_image(input)?;
    let runtime = Runtime::new()?;
    let mut runner = TaskRunner::new(runtime.handle().clone());
    runner.spawn_remote(services.remote()?, kind, image);
    println!("{}", wait_for_text(&mut runner)?);
    Ok(())
}

pub fn cmd_chat(services: &AppServices, message: String, image: Option<&Path>) -> Result<()> {
    let image = image.map(load_image).transpose()?;
    let runtime = Runtime::new()?;
    let mut runner = TaskRunner::new(runtime.handle().clone());
    runner.spawn_chat(services.remote()?, message, Vec::new(), image);
    println!("{}", wait_for_text(&mut runner)?);
    Ok(())
}

pub fn cmd_test_connection(services: &AppServices) -> Result<()> {
    let check = services.remote()?.test_connection();
    println!("{}", check.message);
    if check.ok {
        Ok(())
    } else {
        Err(InerScanError::Remote(check.message))
    }
}

/// Block until a remote call posts its text.
fn wait_for_text(runner: &mut TaskRunner) -> Result<String> {
    loop {
        match runner.blocking_next() {
            Some(TaskEvent::RemoteText { text, .. }) => return Ok(text),
            Some(TaskEvent::Failed { error, .. }) => return Err(error),
            Some(other) => warn!(?other, "ignoring unrelated task event"),
            None => return Err(InerScanError::Remote("remote worker stopped unexpectedly".into())),
        }
    }
}

fn load_image(path: &Path) -> Result<DynamicImage> {
    Ok(ImageProcessor::open(path)?.into_dynamic())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb as Px, RgbImage};

    fn write_page(path: &Path, blank: bool) {
        let img = if blank {
            GrayImage::from_pixel(60, 80, Luma([255]))
        } else {
            GrayImage::from_fn(60, 80, |x, y| Luma([if (x / 3 + y / 3) % 2 == 0 { 0 } else { 255 }]))
        };
        img.save(path).unwrap();
    }

    #[test]
    fn positions_parse() {
        assert_eq!(parse_position("12, 40").unwrap(), (12, 40));
        assert_eq!(parse_position("-5,3").unwrap(), (-5, 3));
        assert!(parse_position("12").is_err());
        assert!(parse_position("a,b").is_err());
        assert_eq!(text_origin(None).unwrap(), (50, 50));
        assert_eq!(text_origin(Some("7,8")).unwrap(), (7, 8));
    }

    #[test]
    fn process_skips_blank_pages_and_exports_pdf() {
        let input = tempfile::tempdir().unwrap();
        write_page(&input.path().join("01.png"), false);
        write_page(&input.path().join("02.png"), true);
        write_page(&input.path().join("03.png"), false);
        let out = tempfile::tempdir().unwrap();

        let services = AppServices::fallback().unwrap();
        let args = ProcessArgs {
            inputs: vec![input.path().to_path_buf()],
            rotate: Some(90),
            out: Some(out.path().to_path_buf()),
            prefix: Some("Batch".into()),
            ..ProcessArgs::default()
        };
        cmd_process(&services, args).unwrap();

        assert!(out.path().join("Batch.pdf").exists());
        let entries = services.recent_history(10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].page_count, 2);
    }

    #[test]
    fn process_jpeg_with_split_and_paper() {
        let input = tempfile::tempdir().unwrap();
        let page = input.path().join("page.png");
        RgbImage::from_fn(40, 20, |x, _| Px([(x * 6) as u8, 50, 90])).save(&page).unwrap();
        let out = tempfile::tempdir().unwrap();

        let services = AppServices::fallback().unwrap();
        let args = ProcessArgs {
            inputs: vec![page],
            keep_blank: true,
            split: true,
            paper: Some("30x30".into()),
            out: Some(out.path().to_path_buf()),
            prefix: Some("Half".into()),
            jpeg: true,
            ..ProcessArgs::default()
        };
        cmd_process(&services, args).unwrap();

        for name in ["Half_1.jpg", "Half_2.jpg"] {
            let img = image::open(out.path().join(name)).unwrap();
            assert_eq!((img.width(), img.height()), (15, 30));
        }
        assert!(!out.path().join("Half_3.jpg").exists());
    }

    #[test]
    fn unreadable_input_fails_without_export() {
        let input = tempfile::tempdir().unwrap();
        let bogus = input.path().join("broken.png");
        std::fs::write(&bogus, b"not an image").unwrap();
        let out = tempfile::tempdir().unwrap();

        let services = AppServices::fallback().unwrap();
        let args = ProcessArgs {
            inputs: vec![bogus],
            out: Some(out.path().to_path_buf()),
            ..ProcessArgs::default()
        };
        assert!(cmd_process(&services, args).is_err());
        assert_eq!(services.recent_history(10).unwrap().len(), 0);
    }
}
