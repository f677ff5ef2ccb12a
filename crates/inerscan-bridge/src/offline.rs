// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Offline intelligence — used when no remote credential is configured.

use image::DynamicImage;

use crate::traits::{ChatMessage, ConnectionCheck, RemoteIntelligence};

pub const NOT_CONFIGURED: &str = "Error: API Key not configured.";
pub const FILENAME_NOT_CONFIGURED: &str = "Scan_Error";
pub const CLIENT_NOT_INITIALIZED: &str = "Client not initialized (Missing API Key)";

/// Answers every request with the "not configured" degradation result.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineIntelligence;

impl RemoteIntelligence for OfflineIntelligence {
    fn ocr(&self, _image: &DynamicImage) -> String {
        NOT_CONFIGURED.into()
    }

    fn suggest_filename(&self, _image: &DynamicImage) -> String {
        FILENAME_NOT_CONFIGURED.into()
    }

    fn analyze(&self, _image: &DynamicImage) -> String {
        NOT_CONFIGURED.into()
    }

    fn chat(&self, _message: &str, _history: &[ChatMessage], _image: Option<&DynamicImage>) -> String {
        NOT_CONFIGURED.into()
    }

    fn test_connection(&self) -> ConnectionCheck {
        ConnectionCheck {
            ok: false,
            message: CLIENT_NOT_INITIALIZED.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::RemoteKind;

    #[test]
    fn every_call_degrades_to_not_configured() {
        let img = DynamicImage::new_rgb8(2, 2);
        let offline = OfflineIntelligence;
        assert_eq!(offline.ocr(&img), NOT_CONFIGURED);
        assert_eq!(offline.analyze(&img), NOT_CONFIGURED);
        assert_eq!(offline.chat("hi", &[], None), NOT_CONFIGURED);
        assert_eq!(offline.run(RemoteKind::Filename, &img), "Scan_Error");
        assert!(!offline.test_connection().ok);
    }
}
