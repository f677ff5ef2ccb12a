// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Collaborator trait definitions.
//
// Implementations run on background workers, so both traits require
// `Send + Sync` and take `&self`; stateful devices use interior mutability.

use image::DynamicImage;
use inerscan_core::error::Result;
use serde::{Deserialize, Serialize};

/// A source of page rasters.
pub trait ScannerDevice: Send + Sync {
    /// Human-readable device name for logs.
    fn name(&self) -> &str;

    /// Acquire one raster.
    ///
    /// `Ok(None)` means the user cancelled; it is not a failure. Device
    /// problems come back as `Device`, `DeviceBusy` or `DeviceAccessDenied`.
    fn acquire(&self) -> Result<Option<DynamicImage>>;
}

/// Which remote call produced a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteKind {
    Ocr,
    Filename,
    Analysis,
    Chat,
}

/// One turn of a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".into(), content: content.into() }
    }
}

/// Result of probing the remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionCheck {
    pub ok: bool,
    pub message: String,
}

/// Best-effort, string-typed remote analysis of page rasters.
///
/// No method fails across this boundary: a missing credential or a failed
/// call comes back as a descriptive string in place of the expected text.
pub trait RemoteIntelligence: Send + Sync {
    /// Verbatim text found on the page.
    fn ocr(&self, image: &DynamicImage) -> String;

    /// A short underscored filename token, without extension.
    fn suggest_filename(&self, image: &DynamicImage) -> String;

    /// Summary plus key fields (dates, names, amounts).
    fn analyze(&self, image: &DynamicImage) -> String;

    /// Free-form chat about the page, continuing `history`.
    fn chat(&self, message: &str, history: &[ChatMessage], image: Option<&DynamicImage>) -> String;

    /// Probe the endpoint with the configured credential.
    fn test_connection(&self) -> ConnectionCheck;

    /// Dispatch a single-image request by kind. Chat without a message is
    /// treated as an empty prompt.
    fn run(&self, kind: RemoteKind, image: &DynamicImage) -> String {
        match kind {
            RemoteKind::Ocr => self.ocr(image),
            RemoteKind::Filename => self.suggest_filename(image),
            RemoteKind::Analysis => self.analyze(image),
            RemoteKind::Chat => self.chat("", &[], Some(image)),
        }
    }
}
