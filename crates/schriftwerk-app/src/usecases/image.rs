// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edit an image before OCR: rotate, crop, brightness, contrast, grayscale.

use std::path::Path;
use std::sync::Arc;

use schriftwerk_core::error::{Result, SchriftwerkError};
use schriftwerk_core::types::{ImageInfo, Severity};
use schriftwerk_document::ImageOp;
use schriftwerk_document::image::{ImageProcessor, probe};
use schriftwerk_security::{AuditLog, PolicyValidator, basename};
use tracing::{info, instrument};

use super::{audit_write_failure, enforce};

pub struct EditImageUseCase {
    validator: Arc<PolicyValidator>,
    audit: Arc<AuditLog>,
}

impl EditImageUseCase {
    pub fn new(validator: Arc<PolicyValidator>, audit: Arc<AuditLog>) -> Self {
        Self { validator, audit }
    }

    /// Apply `ops` in order to `input` and save the result to `output`.
    ///
    /// `input` must pass the read policy and `output` the image write policy.
    /// Returns the dimensions of the saved image.
    #[instrument(skip_all, fields(input = %basename(input), output = %basename(output), ops = ops.len()))]
    pub fn execute(&self, input: &Path, output: &Path, ops: &[ImageOp]) -> Result<ImageInfo> {
        enforce(
            &self.audit,
            "image",
            Some(input),
            self.validator.validate_read_path(input),
        )?;
        let notice = enforce(
            &self.audit,
            "image_output",
            Some(output),
            self.validator.validate_image_write_path(output),
        )?;
        if notice.is_some() {
            self.audit
                .file_access_with(output, "overwrite", Severity::Warning);
        }

        self.audit.file_access(input, "read");
        let edited = match ImageProcessor::open(input) {
            Ok(processor) => processor.apply_all(ops),
            Err(e) => {
                self.audit
                    .file_access_with(input, "edit_failed", Severity::Error);
                return Err(e);
            }
        };
        if let Err(e) = edited.save(output) {
            self.audit_save_failure(output, &e);
            return Err(e);
        }
        self.audit.file_access(output, "write");

        let info = probe(output).inspect_err(|_| {
            self.audit
                .file_access_with(output, "edit_failed", Severity::Error);
        })?;
        info!(width = info.width, height = info.height, "Image edited");
        Ok(info)
    }

    fn audit_save_failure(&self, output: &Path, err: &SchriftwerkError) {
        match err {
            SchriftwerkError::Io(io) => audit_write_failure(&self.audit, output, io),
            _ => self
                .audit
                .file_access_with(output, "edit_failed", Severity::Error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::test_support::{audit_log, validator, write_png};
        use schriftwerk_core::types::PolicyCheck;
    use tempfile::TempDir;

    #[test]
    fn edits_and_audits() {
        let dir = TempDir::new().unwrap();
        let input = write_png(dir.path(), "scan.png");
        let output = dir.path().join("scan-fixed.jpg");
        let (audit, buffer) = audit_log();
        let uc = EditImageUseCase::new(validator(), audit);

        let info = uc
            .execute(&input, &output, &[ImageOp::Rotate(90.0), ImageOp::Grayscale])
            .unwrap();
        assert_eq!((info.width, info.height), (4, 8));
        assert_eq!(info.format, "Jpeg");

        let lines = buffer.lines();
        assert!(lines[0].contains("Action: read, File: scan.png"));
        assert!(lines[1].contains("Action: write, File: scan-fixed.jpg"));
    }

    #[test]
    fn output_must_be_an_image_extension() {
        let dir = TempDir::new().unwrap();
        let input = write_png(dir.path(), "scan.png");
        let (audit, buffer) = audit_log();
        let uc = EditImageUseCase::new(validator(), audit);

        let err = uc
            .execute(&input, &dir.path().join("scan.exe"), &[])
            .unwrap_err();
        assert!(matches!(
            err,
            SchriftwerkError::Rejected {
                check: PolicyCheck::Extension,
                ..
            }
        ));
        assert!(buffer.contents().contains("Type: image_output"));
        assert!(!dir.path().join("scan.exe").exists());
    }

    #[test]
    fn undecodable_input_leaves_an_error_record() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("broken.png");
        std::fs::write(&input, b"not a png at all").unwrap();
        let output = dir.path().join("fixed.png");
        let (audit, buffer) = audit_log();
        let uc = EditImageUseCase::new(validator(), audit);

        let err = uc.execute(&input, &output, &[ImageOp::Grayscale]).unwrap_err();
        assert!(matches!(err, SchriftwerkError::Image(_)));
        assert!(!output.exists());

        let lines = buffer.lines();
        assert!(lines[0].contains("INFO: FILE_ACCESS - Action: read, File: broken.png"));
        assert!(lines[1].contains("ERROR: FILE_ACCESS - Action: edit_failed, File: broken.png"));
        assert!(!buffer.contents().contains("Action: write,"));
    }

    #[test]
    fn overwriting_the_input_is_allowed_with_warning() {
        let dir = TempDir::new().unwrap();
        let input = write_png(dir.path(), "scan.png");
        let (audit, buffer) = audit_log();
        let uc = EditImageUseCase::new(validator(), audit);

        uc.execute(&input, &input, &[ImageOp::Brightness(20)]).unwrap();
        assert!(buffer.contents().contains("WARNING: FILE_ACCESS - Action: overwrite, File: scan.png"));
    }
}
