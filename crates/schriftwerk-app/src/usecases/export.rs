// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export text to a document on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use schriftwerk_core::error::{Result, SchriftwerkError};
use schriftwerk_core::ports::TextExporter;
use schriftwerk_core::types::{ExportFormat, PolicyCheck, Severity};
use schriftwerk_security::{AuditLog, PolicyValidator, basename, sanitize_filename};
use serde::Serialize;
use tracing::{info, instrument};

use super::{audit_write_failure, enforce};

/// What an export actually did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportReport {
    /// The file written, after its name was sanitised.
    pub path: PathBuf,
    pub format: ExportFormat,
    pub bytes_written: usize,
    /// The target existed and was replaced.
    pub overwritten: bool,
}

pub struct ExportTextUseCase {
    validator: Arc<PolicyValidator>,
    audit: Arc<AuditLog>,
    exporter: Arc<dyn TextExporter>,
}

impl ExportTextUseCase {
    pub fn new(
        validator: Arc<PolicyValidator>,
        audit: Arc<AuditLog>,
        exporter: Arc<dyn TextExporter>,
    ) -> Self {
        Self {
            validator,
            audit,
            exporter,
        }
    }

    /// Validate `text` and `path`, encode, write, and audit.
    ///
    /// The file name part of `path` is sanitised before anything else looks
    /// at it; the report carries the name that was really written.
    #[instrument(skip_all, fields(file = %basename(path), format = %format))]
    pub fn execute(&self, text: &str, path: &Path, format: ExportFormat) -> Result<ExportReport> {
        if text.trim().is_empty() {
            self.audit.invalid_input("export_text", "Text is empty");
            return Err(SchriftwerkError::Export("nothing to export".into()));
        }
        enforce(
            &self.audit,
            "export_text",
            None,
            self.validator.validate_text(text),
        )?;

        let target = sanitized_target(path);
        let notice = enforce(
            &self.audit,
            "export_path",
            Some(&target),
            self.validator
                .validate_write_path(&target, Some(format.extension())),
        )?;
        let overwritten = notice.is_some();
        if overwritten {
            self.audit
                .file_access_with(&target, "overwrite", Severity::Warning);
        }

        let bytes = match self.exporter.encode(text, format) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.audit.export(&target, format, false);
                return Err(e);
            }
        };
        if let Err(e) = std::fs::write(&target, &bytes) {
            self.audit.export(&target, format, false);
            audit_write_failure(&self.audit, &target, &e);
            return Err(e.into());
        }
        self.audit.export(&target, format, true);

        info!(bytes = bytes.len(), overwritten, "Text exported");
        Ok(ExportReport {
            path: target,
            format,
            bytes_written: bytes.len(),
            overwritten,
        })
    }

    /// Read a UTF-8 text file that is about to be exported or searched.
    ///
    /// The path goes through the read policy first, which also checks the
    /// size ceiling against the file metadata before the contents are loaded.
    #[instrument(skip_all, fields(file = %basename(path)))]
    pub fn read_source(&self, path: &Path) -> Result<String> {
        enforce(
            &self.audit,
            "text_file",
            Some(path),
            self.validator.validate_text_read_path(path),
        )?;

        let bytes = std::fs::read(path)?;
        enforce(
            &self.audit,
            "text_file",
            Some(path),
            self.validator.validate_text_bytes(&bytes),
        )?;
        self.audit.file_access(path, "read");
        String::from_utf8(bytes).map_err(|_| SchriftwerkError::Rejected {
            check: PolicyCheck::Encoding,
            reason: "Input must be valid UTF-8 text".into(),
        })
    }
}

/// `path` with its final component passed through `sanitize_filename`.
fn sanitized_target(path: &Path) -> PathBuf {
    let Some(name) = path.file_name() else {
        return path.to_path_buf();
    };
    let clean = sanitize_filename(&name.to_string_lossy());
    path.with_file_name(clean)
}
