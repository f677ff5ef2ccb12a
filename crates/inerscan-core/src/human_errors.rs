// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the scanning workstation.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The taxonomy uses three severity levels that drive how the error is shown.

use crate::error::InerScanError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Busy device, network blip, timeout — trying again may work.
    Transient,
    /// User must do something (power on scanner, fix a setting, pick a page).
    ActionRequired,
    /// Cannot be fixed by retrying — bad file, unsupported input.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether trying the same action again is worthwhile.
    pub retriable: bool,
    /// Severity level (drives icon/colour).
    pub severity: Severity,
}

/// Convert an `InerScanError` into a `HumanError`.
pub fn humanize_error(err: &InerScanError) -> HumanError {
    match err {
        // -- Device errors --
        InerScanError::Device(detail) => humanize_device_error(detail),

        InerScanError::DeviceAccessDenied(_) => HumanError {
            message: "Scanner access denied.".into(),
            suggestion: "Check that:\n1. The scanner is connected and powered on\n2. Scanner drivers are installed\n3. No other application is using the scanner\n4. Your account is allowed to use the device".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        InerScanError::DeviceBusy => HumanError {
            message: "The scanner is busy.".into(),
            suggestion: "Wait for the current scan to finish, or close other programs that use the scanner, then try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Geometry --
        InerScanError::SelectionTooSmall { min, .. } => HumanError {
            message: "The crop selection is too small.".into(),
            suggestion: format!("Drag a larger box, at least {min} by {min} pixels."),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        InerScanError::InvalidParameter(detail) => HumanError {
            message: "That setting isn't valid.".into(),
            suggestion: format!("Check the value and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Document errors --
        InerScanError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        InerScanError::PdfError(_) => HumanError {
            message: "The PDF couldn't be created.".into(),
            suggestion: "Try exporting again. If this keeps happening, export the pages as images instead.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Page list --
        InerScanError::NoPageSelected => HumanError {
            message: "No page selected.".into(),
            suggestion: "Scan a page first, or pick one from the page list.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        InerScanError::PageIndexOutOfRange { .. } => HumanError {
            message: "That page doesn't exist.".into(),
            suggestion: "Pick a page from the page list.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Remote intelligence --
        InerScanError::MissingCredential => HumanError {
            message: "The AI service isn't set up.".into(),
            suggestion: "Add an API key in the AI settings, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        InerScanError::Remote(detail) => HumanError {
            message: "The AI service didn't answer.".into(),
            suggestion: format!("Check your internet connection and API settings, then try again. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Storage --
        InerScanError::Database(_) => HumanError {
            message: "The app's data storage had a problem.".into(),
            suggestion: "Try closing and reopening the app. Your open pages are not affected.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        InerScanError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file or folder couldn't be found.".into(),
                    suggestion: "Check the output folder in the settings, then try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The app doesn't have permission to write there.".into(),
                    suggestion: "Choose a different output folder, for example inside your Documents.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        InerScanError::Serialization(_) => HumanError {
            message: "The app had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        InerScanError::PlatformUnavailable => HumanError {
            message: "This feature isn't available on your computer.".into(),
            suggestion: "No supported scanner interface was found.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

/// Parse device-driver error details into human-readable messages.
fn humanize_device_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("access is denied") || lower.contains("permission") {
        humanize_error(&InerScanError::DeviceAccessDenied(detail.to_string()))
    } else if lower.contains("busy") || lower.contains("in use") {
        humanize_error(&InerScanError::DeviceBusy)
    } else if lower.contains("not found") || lower.contains("no device") || lower.contains("offline") {
        HumanError {
            message: "No scanner was found.".into(),
            suggestion: "Reconnect the scanner, make sure it's switched on, then try again.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("paper") || lower.contains("feeder") {
        HumanError {
            message: "The scanner's document feeder has a problem.".into(),
            suggestion: "Check that paper is loaded straight and nothing is jammed.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        }
    } else {
        HumanError {
            message: "The scan failed.".into(),
            suggestion: format!("Try:\n1. Reconnect scanner\n2. Restart the application\n3. Check the scanner service is running\n(Detail: {detail})"),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}
