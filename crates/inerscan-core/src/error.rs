// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for InerScan.

use thiserror::Error;

/// Top-level error type for all InerScan operations.
#[derive(Debug, Error)]
pub enum InerScanError {
    // -- Device errors --
    #[error("scanner error: {0}")]
    Device(String),

    #[error("scanner access denied: {0}")]
    DeviceAccessDenied(String),

    #[error("scanner is busy")]
    DeviceBusy,

    // -- Geometry / selection errors --
    #[error("selection {width}x{height} px is smaller than the {min}x{min} px minimum")]
    SelectionTooSmall { width: u32, height: u32, min: u32 },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    // -- Document errors --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Page list --
    #[error("no page selected")]
    NoPageSelected,

    #[error("page index {index} out of range (document has {len} pages)")]
    PageIndexOutOfRange { index: usize, len: usize },

    // -- Remote intelligence --
    #[error("remote service failed: {0}")]
    Remote(String),

    #[error("remote service credential is not configured")]
    MissingCredential,

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform --
    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, InerScanError>;
