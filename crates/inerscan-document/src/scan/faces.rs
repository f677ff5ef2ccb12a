// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Face detection and redaction.
//
// Detection evaluates a boosted Haar cascade stored in OpenCV's XML format
// (for example `haarcascade_frontalface_default.xml`) over an image pyramid,
// then merges overlapping hits. Redaction blurs each detected region.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};
use imageproc::filter::gaussian_blur_f32;
use inerscan_core::error::{InerScanError, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, info, instrument};

/// Blur strength applied to redacted regions.
const REDACTION_SIGMA: f32 = 30.0;
/// Relative tolerance used when merging neighbouring detections.
const GROUP_EPS: f64 = 0.2;

/// Places a stock frontal-face cascade is commonly installed.
const CASCADE_SEARCH_PATHS: &[&str] = &[
    "/usr/share/opencv4/haarcascades/haarcascade_frontalface_default.xml",
    "/usr/local/share/opencv4/haarcascades/haarcascade_frontalface_default.xml",
    "/usr/share/opencv/haarcascades/haarcascade_frontalface_default.xml",
    "/opt/homebrew/share/opencv4/haarcascades/haarcascade_frontalface_default.xml",
    "C:\\opencv\\build\\etc\\haarcascades\\haarcascade_frontalface_default.xml",
];

/// Axis-aligned detection box in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Anything that can locate faces in a grayscale image.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, gray: &GrayImage) -> Vec<FaceRect>;
}

/// Detector that never finds anything. Redaction with it is a no-op.
pub struct NoFaceDetector;

impl FaceDetector for NoFaceDetector {
    fn detect(&self, _gray: &GrayImage) -> Vec<FaceRect> {
        Vec::new()
    }
}

/// Blur every face `detector` finds. Output is RGB; pixels outside the
/// detected boxes are untouched.
#[instrument(skip_all)]
pub fn redact_faces(image: &DynamicImage, detector: &dyn FaceDetector) -> DynamicImage {
    let faces = detector.detect(&image.to_luma8());
    info!(count = faces.len(), "Faces detected");
    if faces.is_empty() {
        return image.clone();
    }

    let mut rgb = image.to_rgb8();
    let (img_w, img_h) = rgb.dimensions();
    for face in faces {
        let x = face.x.min(img_w);
        let y = face.y.min(img_h);
        let w = face.width.min(img_w - x);
        let h = face.height.min(img_h - y);
        if w == 0 || h == 0 {
            continue;
        }
        let region = imageops::crop_imm(&rgb, x, y, w, h).to_image();
        let blurred = gaussian_blur_f32(&region, REDACTION_SIGMA);
        imageops::replace(&mut rgb, &blurred, x as i64, y as i64);
    }
    DynamicImage::ImageRgb8(rgb)
}

/// Find a stock frontal-face cascade at a well-known install location.
pub fn locate_default_cascade() -> Option<PathBuf> {
    CASCADE_SEARCH_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

// -- Cascade model ------------------------------------------------------------

#[derive(Debug, Default)]
struct Node {
    left: i32,
    right: i32,
    feature: usize,
    threshold: f64,
}

#[derive(Debug, Default)]
struct WeakClassifier {
    nodes: Vec<Node>,
    leaves: Vec<f64>,
}

#[derive(Debug, Default)]
struct Stage {
    threshold: f64,
    classifiers: Vec<WeakClassifier>,
}

#[derive(Debug, Clone, Copy)]
struct WeightedRect {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    weight: f64,
}

#[derive(Debug, Default)]
struct Feature {
    rects: Vec<WeightedRect>,
}

/// A boosted cascade of Haar-like features.
#[derive(Debug)]
pub struct HaarCascade {
    window_w: u32,
    window_h: u32,
    stages: Vec<Stage>,
    features: Vec<Feature>,
    scale_factor: f64,
    min_neighbors: usize,
}

impl HaarCascade {
    /// Load a cascade from an OpenCV XML file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let xml = std::fs::read_to_string(path.as_ref())?;
        let cascade = Self::from_xml(&xml)?;
        info!(
            stages = cascade.stages.len(),
            features = cascade.features.len(),
            "Face cascade loaded"
        );
        Ok(cascade)
    }

    /// Parse a cascade from OpenCV's XML representation.
    pub fn from_xml(xml: &str) -> Result<Self> {
        parse_cascade(xml)
    }

    /// Every window the cascade accepts, before merging.
    pub fn detect_raw(&self, gray: &GrayImage) -> Vec<FaceRect> {
        let (img_w, img_h) = gray.dimensions();
        let mut hits = Vec::new();
        let mut factor = 1.0f64;

        loop {
            let scaled_w = (img_w as f64 / factor).round() as u32;
            let scaled_h = (img_h as f64 / factor).round() as u32;
            let win_w = (self.window_w as f64 * factor).round() as u32;
            let win_h = (self.window_h as f64 * factor).round() as u32;
            if scaled_w < self.window_w
                || scaled_h < self.window_h
                || win_w > img_w
                || win_h > img_h
            {
                break;
            }

            let scaled = if factor == 1.0 {
                gray.clone()
            } else {
                imageops::resize(gray, scaled_w, scaled_h, FilterType::Triangle)
            };
            let integral = IntegralImage::new(&scaled);
            let step = if factor > 2.0 { 1 } else { 2 };

            for y in (0..=scaled_h - self.window_h).step_by(step) {
                for x in (0..=scaled_w - self.window_w).step_by(step) {
                    if self.accepts(&integral, x, y) {
                        hits.push(FaceRect {
                            x: (x as f64 * factor).round() as u32,
                            y: (y as f64 * factor).round() as u32,
                            width: win_w,
                            height: win_h,
                        });
                    }
                }
            }
            factor *= self.scale_factor;
        }

        debug!(raw = hits.len(), "Cascade scan finished");
        hits
    }

    /// Run every stage on the window at (x, y); true if all pass.
    fn accepts(&self, integral: &IntegralImage, x: u32, y: u32) -> bool {
        let (nw, nh) = (self.window_w - 2, self.window_h - 2);
        let area = (nw * nh) as f64;
        let sum = integral.sum(x + 1, y + 1, nw, nh) as f64;
        let sq = integral.squared_sum(x + 1, y + 1, nw, nh) as f64;
        let variance = area * sq - sum * sum;
        let norm = if variance > 0.0 { variance.sqrt() } else { 1.0 };

        for stage in &self.stages {
            let mut total = 0.0;
            for classifier in &stage.classifiers {
                let mut idx: i32 = 0;
                loop {
                    let node = &classifier.nodes[idx as usize];
                    let value = self.feature_value(node.feature, integral, x, y) / norm;
                    idx = if value < node.threshold {
                        node.left
                    } else {
                        node.right
                    };
                    if idx <= 0 {
                        break;
                    }
                }
                total += classifier.leaves[(-idx) as usize];
            }
            if total < stage.threshold {
                return false;
            }
        }
        true
    }

    fn feature_value(&self, feature: usize, integral: &IntegralImage, x: u32, y: u32) -> f64 {
        self.features[feature]
            .rects
            .iter()
            .map(|r| r.weight * integral.sum(x + r.x, y + r.y, r.w, r.h) as f64)
            .sum()
    }
}

impl FaceDetector for HaarCascade {
    fn detect(&self, gray: &GrayImage) -> Vec<FaceRect> {
        group_rectangles(&self.detect_raw(gray), self.min_neighbors, GROUP_EPS)
    }
}

// -- Integral images ----------------------------------------------------------

/// Summed-area tables of pixel values and squared pixel values, each
/// `(width+1) x (height+1)` with a zero border.
struct IntegralImage {
    stride: usize,
    sum: Vec<u64>,
    squared: Vec<u64>,
}

impl IntegralImage {
    fn new(gray: &GrayImage) -> Self {
        let (w, h) = gray.dimensions();
        let stride = (w + 1) as usize;
        let mut sum = vec![0u64; stride * (h + 1) as usize];
        let mut squared = vec![0u64; stride * (h + 1) as usize];

        for y in 0..h {
            let mut row_sum = 0u64;
            let mut row_sq = 0u64;
            for x in 0..w {
                let v = gray.get_pixel(x, y)[0] as u64;
                row_sum += v;
                row_sq += v * v;
                let idx = (y + 1) as usize * stride + (x + 1) as usize;
                let above = y as usize * stride + (x + 1) as usize;
                sum[idx] = row_sum + sum[above];
                squared[idx] = row_sq + squared[above];
            }
        }
        Self {
            stride,
            sum,
            squared,
        }
    }

    fn sum(&self, x: u32, y: u32, w: u32, h: u32) -> u64 {
        Self::lookup(&self.sum, self.stride, x, y, w, h)
    }

    fn squared_sum(&self, x: u32, y: u32, w: u32, h: u32) -> u64 {
        Self::lookup(&self.squared, self.stride, x, y, w, h)
    }

    fn lookup(table: &[u64], stride: usize, x: u32, y: u32, w: u32, h: u32) -> u64 {
        let (x1, y1) = (x as usize, y as usize);
        let (x2, y2) = ((x + w) as usize, (y + h) as usize);
        (table[y2 * stride + x2] + table[y1 * stride + x1])
            - (table[y1 * stride + x2] + table[y2 * stride + x1])
    }
}

// -- Grouping -----------------------------------------------------------------

/// Merge clusters of similar boxes into their average, keeping clusters
/// with more than `threshold` members and dropping boxes nested inside a
/// stronger neighbour. A zero threshold returns the input unchanged.
fn group_rectangles(rects: &[FaceRect], threshold: usize, eps: f64) -> Vec<FaceRect> {
    if threshold == 0 || rects.is_empty() {
        return rects.to_vec();
    }

    let n = rects.len();
    let mut parent: Vec<usize> = (0..n).collect();
    fn root(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }
    for i in 0..n {
        for j in 0..i {
            if similar(&rects[i], &rects[j], eps) {
                let (a, b) = (root(&mut parent, i), root(&mut parent, j));
                if a != b {
                    parent[a] = b;
                }
            }
        }
    }

    // Per cluster: summed x, y, w, h and member count.
    let mut clusters: Vec<([f64; 4], usize)> = Vec::new();
    let mut cluster_of: Vec<Option<usize>> = vec![None; n];
    for i in 0..n {
        let r = root(&mut parent, i);
        let cls = match cluster_of[r] {
            Some(c) => c,
            None => {
                clusters.push(([0.0; 4], 0));
                cluster_of[r] = Some(clusters.len() - 1);
                clusters.len() - 1
            }
        };
        let rect = &rects[i];
        let entry = &mut clusters[cls];
        entry.0[0] += rect.x as f64;
        entry.0[1] += rect.y as f64;
        entry.0[2] += rect.width as f64;
        entry.0[3] += rect.height as f64;
        entry.1 += 1;
    }

    let averaged: Vec<(FaceRect, usize)> = clusters
        .iter()
        .map(|(s, count)| {
            let k = 1.0 / *count as f64;
            let rect = FaceRect {
                x: (s[0] * k).round() as u32,
                y: (s[1] * k).round() as u32,
                width: (s[2] * k).round() as u32,
                height: (s[3] * k).round() as u32,
            };
            (rect, *count)
        })
        .collect();

    let mut kept = Vec::new();
    for (i, &(r1, n1)) in averaged.iter().enumerate() {
        if n1 <= threshold {
            continue;
        }
        let swallowed = averaged.iter().enumerate().any(|(j, &(r2, n2))| {
            if j == i || n2 <= threshold {
                return false;
            }
            let dx = (r2.width as f64 * eps).round() as i64;
            let dy = (r2.height as f64 * eps).round() as i64;
            let (x1, y1, w1, h1) = (r1.x as i64, r1.y as i64, r1.width as i64, r1.height as i64);
            let (x2, y2, w2, h2) = (r2.x as i64, r2.y as i64, r2.width as i64, r2.height as i64);
            x1 >= x2 - dx
                && y1 >= y2 - dy
                && x1 + w1 <= x2 + w2 + dx
                && y1 + h1 <= y2 + h2 + dy
                && (n2 > n1.max(3) || n1 < 3)
        });
        if !swallowed {
            kept.push(r1);
        }
    }
    kept
}

fn similar(a: &FaceRect, b: &FaceRect, eps: f64) -> bool {
    let delta = eps * (a.width.min(b.width) + a.height.min(b.height)) as f64 * 0.5;
    let close = |p: u32, q: u32| (p as f64 - q as f64).abs() <= delta;
    close(a.x, b.x)
        && close(a.y, b.y)
        && close(a.x + a.width, b.x + b.width)
        && close(a.y + a.height, b.y + b.height)
}

// -- XML parsing --------------------------------------------------------------

fn parse_cascade(xml: &str) -> Result<HaarCascade> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut builder = CascadeBuilder::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "_" {
                    builder.open_item(path.last().map(String::as_str))?;
                }
                path.push(name);
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Text(e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                builder.text(&path, &text)?;
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(cascade_error(format!(
                    "XML error at byte {}: {err}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    builder.finish()
}

#[derive(Default)]
struct CascadeBuilder {
    window_w: u32,
    window_h: u32,
    stages: Vec<Stage>,
    features: Vec<Feature>,
}

impl CascadeBuilder {
    /// A `<_>` list item opened under `parent`.
    fn open_item(&mut self, parent: Option<&str>) -> Result<()> {
        match parent {
            Some("stages") => self.stages.push(Stage::default()),
            Some("weakClassifiers") => self
                .stages
                .last_mut()
                .ok_or_else(|| cascade_error("weak classifier outside a stage"))?
                .classifiers
                .push(WeakClassifier::default()),
            Some("features") => self.features.push(Feature::default()),
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, path: &[String], text: &str) -> Result<()> {
        let last = path.last().map(String::as_str);
        let parent = path.len().checked_sub(2).map(|i| path[i].as_str());

        match (parent, last) {
            (Some("cascade"), Some("featureType")) if text.trim() != "HAAR" => {
                Err(cascade_error(format!("unsupported feature type {}", text.trim())))
            }
            (Some("cascade"), Some("width")) => {
                self.window_w = parse_one(text)?;
                Ok(())
            }
            (Some("cascade"), Some("height")) => {
                self.window_h = parse_one(text)?;
                Ok(())
            }
            (_, Some("stageThreshold")) => {
                self.current_stage()?.threshold = parse_one(text)?;
                Ok(())
            }
            (_, Some("internalNodes")) => {
                let values: Vec<f64> = parse_numbers(text)?;
                if values.len() % 4 != 0 {
                    return Err(cascade_error("internal node list is not a multiple of 4"));
                }
                let nodes = values
                    .chunks_exact(4)
                    .map(|c| Node {
                        left: c[0] as i32,
                        right: c[1] as i32,
                        feature: c[2] as usize,
                        threshold: c[3],
                    })
                    .collect();
                self.current_classifier()?.nodes = nodes;
                Ok(())
            }
            (_, Some("leafValues")) => {
                self.current_classifier()?.leaves = parse_numbers(text)?;
                Ok(())
            }
            (Some("rects"), Some("_")) => {
                let v: Vec<f64> = parse_numbers(text)?;
                let &[x, y, w, h, weight] = v.as_slice() else {
                    return Err(cascade_error("feature rectangle needs 5 values"));
                };
                let feature = self
                    .features
                    .last_mut()
                    .ok_or_else(|| cascade_error("rectangle outside a feature"))?;
                feature.rects.push(WeightedRect {
                    x: x as u32,
                    y: y as u32,
                    w: w as u32,
                    h: h as u32,
                    weight,
                });
                Ok(())
            }
            (_, Some("tilted")) if text.trim() != "0" => {
                Err(cascade_error("tilted Haar features are not supported"))
            }
            _ => Ok(()),
        }
    }

    fn current_stage(&mut self) -> Result<&mut Stage> {
        self.stages
            .last_mut()
            .ok_or_else(|| cascade_error("stage data outside a stage"))
    }

    fn current_classifier(&mut self) -> Result<&mut WeakClassifier> {
        self.current_stage()?
            .classifiers
            .last_mut()
            .ok_or_else(|| cascade_error("classifier data outside a classifier"))
    }

    fn finish(self) -> Result<HaarCascade> {
        if self.window_w < 3 || self.window_h < 3 {
            return Err(cascade_error("missing or invalid detection window size"));
        }
        if self.stages.is_empty() {
            return Err(cascade_error("cascade has no stages"));
        }

        for classifier in self.stages.iter().flat_map(|s| &s.classifiers) {
            if classifier.nodes.is_empty() {
                return Err(cascade_error("weak classifier without nodes"));
            }
            for node in &classifier.nodes {
                if node.feature >= self.features.len() {
                    return Err(cascade_error(format!("feature index {} out of range", node.feature)));
                }
                for child in [node.left, node.right] {
                    let in_range = if child > 0 {
                        (child as usize) < classifier.nodes.len()
                    } else {
                        ((-child) as usize) < classifier.leaves.len()
                    };
                    if !in_range {
                        return Err(cascade_error("classifier tree points outside its tables"));
                    }
                }
            }
        }

        for rect in self.features.iter().flat_map(|f| &f.rects) {
            if rect.x + rect.w > self.window_w || rect.y + rect.h > self.window_h {
                return Err(cascade_error("feature rectangle exceeds detection window"));
            }
        }

        Ok(HaarCascade {
            window_w: self.window_w,
            window_h: self.window_h,
            stages: self.stages,
            features: self.features,
            scale_factor: 1.1,
            min_neighbors: 4,
        })
    }
}

fn parse_one<T: std::str::FromStr>(text: &str) -> Result<T> {
    text.trim()
        .parse()
        .map_err(|_| cascade_error(format!("bad number '{}'", text.trim())))
}

fn parse_numbers<T: std::str::FromStr>(text: &str) -> Result<Vec<T>> {
    text.split_whitespace().map(parse_one).collect()
}

fn cascade_error(detail: impl std::fmt::Display) -> InerScanError {
    InerScanError::ImageError(format!("invalid face cascade: {detail}"))
}
