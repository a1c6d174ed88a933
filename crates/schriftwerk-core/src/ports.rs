// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ports — the seams between use cases and the adapters that do the work.

use crate::config::AppConfig;
use crate::error::Result;
use crate::types::{ExportFormat, ImageInfo};

/// Recognises text in an image.
///
/// Implementations return the recognised lines in reading order. The caller
/// has already validated `image.path` against the read policy.
pub trait TextExtractor: Send + Sync {
    fn extract_lines(&self, image: &ImageInfo) -> Result<Vec<String>>;
}

/// Encodes text into a document format.
pub trait TextExporter: Send + Sync {
    fn encode(&self, text: &str, format: ExportFormat) -> Result<Vec<u8>>;
}

/// Loads and stores the application configuration.
pub trait ConfigRepository: Send + Sync {
    fn load(&self) -> AppConfig;
    fn save(&self, config: &AppConfig) -> Result<()>;
}
