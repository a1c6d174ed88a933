// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extract text from a single image.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use schriftwerk_core::error::Result;
use schriftwerk_core::ports::TextExtractor;
use schriftwerk_core::types::ExtractionResult;
use schriftwerk_document::image::probe;
use schriftwerk_security::{AuditLog, PolicyValidator, basename};
use tracing::{info, instrument};

use super::enforce;

/// Validate an image path, run OCR on it, and validate what came back.
///
/// Every call leaves at least one audit record: `INVALID_INPUT` when the
/// path is refused, otherwise `FILE_ACCESS` for the read and
/// `OCR_EXTRACTION` for the outcome.
pub struct ExtractTextUseCase {
    validator: Arc<PolicyValidator>,
    audit: Arc<AuditLog>,
    extractor: Arc<dyn TextExtractor>,
    paragraph_mode: bool,
}

impl ExtractTextUseCase {
    pub fn new(
        validator: Arc<PolicyValidator>,
        audit: Arc<AuditLog>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        Self {
            validator,
            audit,
            extractor,
            paragraph_mode: false,
        }
    }

    /// Join recognised lines with blank lines instead of single newlines.
    pub fn with_paragraph_mode(mut self, paragraph_mode: bool) -> Self {
        self.paragraph_mode = paragraph_mode;
        self
    }

    pub fn validator(&self) -> &Arc<PolicyValidator> {
        &self.validator
    }

    #[instrument(skip_all, fields(file = %basename(path)))]
    pub fn execute(&self, path: &Path) -> Result<ExtractionResult> {
        let started = Instant::now();

        enforce(
            &self.audit,
            "image",
            Some(path),
            self.validator.validate_read_path(path),
        )?;
        self.audit.file_access(path, "read");

        let text = match self.recognise(path) {
            Ok(text) => text,
            Err(e) => {
                self.audit.extraction(path, false, 0);
                return Err(e);
            }
        };

        let char_count = text.text.chars().count();
        self.audit.extraction(path, true, char_count);

        let processing_secs = started.elapsed().as_secs_f64();
        info!(chars = char_count, lines = text.line_count, processing_secs, "Text extracted");
        Ok(ExtractionResult {
            text: text.text,
            line_count: text.line_count,
            image_path: path.to_path_buf(),
            extracted_at: Local::now(),
            processing_secs,
        })
    }

    /// Probe, extract, join, and validate. Failures are audited by the caller.
    fn recognise(&self, path: &Path) -> Result<Recognised> {
        let info = probe(path)?;
        let lines = self.extractor.extract_lines(&info)?;
        let text = join_lines(&lines, self.paragraph_mode);
        enforce(
            &self.audit,
            "extracted_text",
            None,
            self.validator.validate_text(&text),
        )?;
        Ok(Recognised {
            text,
            line_count: lines.len(),
        })
    }
}

struct Recognised {
    text: String,
    line_count: usize,
}

fn join_lines(lines: &[String], paragraph_mode: bool) -> String {
    let separator = if paragraph_mode { "\n\n" } else { "\n" };
    lines
        .iter()
        .map(|line| line.trim_end())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}
