// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// inerscan-bridge — External collaborators of the page editor.
//
// A scanner device hands back one raster per call; a remote intelligence
// service turns a raster (and optional chat history) into text. Both sit
// behind traits so the editor and its tests never depend on hardware or the
// network.

pub mod folder;
pub mod offline;
pub mod openai;
pub mod stub;
pub mod traits;

pub use folder::FolderScanner;
pub use offline::OfflineIntelligence;
pub use openai::{OpenAiClient, RemoteSettings};
pub use stub::StubScanner;
pub use traits::{ChatMessage, ConnectionCheck, RemoteIntelligence, RemoteKind, ScannerDevice};

/// Pick the remote intelligence implementation for the given credentials.
///
/// An empty API key yields [`OfflineIntelligence`], which answers every call
/// with the "not configured" degradation strings.
pub fn remote_intelligence(
    settings: RemoteSettings,
    timeout_secs: u64,
) -> Box<dyn RemoteIntelligence> {
    if settings.api_key.trim().is_empty() {
        tracing::info!("no remote credential configured; using offline intelligence");
        Box::new(OfflineIntelligence)
    } else {
        Box::new(OpenAiClient::new(settings, timeout_secs))
    }
}
