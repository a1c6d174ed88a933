// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Composition root — loads the configuration, opens the audit trail, builds
// the policy validator, and hands out use cases wired to them.
//
// Everything shared is behind an `Arc`, so use cases can be moved onto
// worker threads (batch extraction) without lifetime gymnastics.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use schriftwerk_core::config::{AppConfig, JsonConfigRepository};
use schriftwerk_core::error::Result;
use schriftwerk_core::ports::{ConfigRepository, TextExporter, TextExtractor};
use schriftwerk_document::{MultiFormatExporter, PdfWriter};
use schriftwerk_security::{AuditLog, PolicyValidator};
use tracing::{info, instrument, warn};

use super::data_dir;
use crate::usecases::{
    ConfigurationUseCase, EditImageUseCase, ExportTextUseCase, ExtractBatchUseCase,
    ExtractTextUseCase, UsageStore,
};

pub struct AppServices {
    data_dir: PathBuf,
    config: AppConfig,
    config_repo: Arc<JsonConfigRepository>,
    validator: Arc<PolicyValidator>,
    audit: Arc<AuditLog>,
    usage: Arc<UsageStore>,
    exporter: Arc<MultiFormatExporter>,
}

impl AppServices {
    /// Initialise all services. Call once at startup.
    ///
    /// A bad `config.json` falls back to defaults and an audit file that
    /// cannot be opened falls back to discarding records; both are logged.
    /// A policy that does not compile is an error.
    #[instrument(skip_all, fields(data_dir = %dir.display()))]
    pub fn init(dir: &Path) -> Result<Self> {
        data_dir::ensure(dir)?;

        let config_repo = Arc::new(JsonConfigRepository::in_dir(dir));
        let config = config_repo.load();

        let audit_path = dir.join(&config.audit.file_name);
        let audit = match AuditLog::open(&audit_path, config.audit.format) {
            Ok(log) => log,
            Err(e) => {
                warn!(error = %e, "audit log unavailable, records will be discarded");
                AuditLog::discard()
            }
        };
        let audit = Arc::new(audit);
        audit.file_access(config_repo.path(), "config_load");

        let validator = Arc::new(PolicyValidator::new(config.policy.clone())?);
        let usage = Arc::new(UsageStore::open(
            dir,
            Arc::clone(&validator),
            Arc::clone(&audit),
        ));

        let exporter = Arc::new(MultiFormatExporter::with_pdf_writer(PdfWriter::new(
            config.pdf_page_size,
        )));

        info!("app services initialised");
        Ok(Self {
            data_dir: dir.to_path_buf(),
            config,
            config_repo,
            validator,
            audit,
            usage,
            exporter,
        })
    }

    // -- Accessors -------------------------------------------------------------

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The configuration as loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn validator(&self) -> &Arc<PolicyValidator> {
        &self.validator
    }

    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    pub fn usage(&self) -> &Arc<UsageStore> {
        &self.usage
    }

    // -- Adapters --------------------------------------------------------------

    /// The OCR engine, with models loaded.
    ///
    /// Fails with `MissingDependency` when the binary was built without the
    /// `ocr` feature or the model files are missing.
    #[cfg(feature = "ocr")]
    pub fn extractor(&self) -> Result<Arc<dyn TextExtractor>> {
        use schriftwerk_document::ocr::{OcrConfig, OcrEngine};

        let config = OcrConfig::from_settings(self.config.ocr.model_dir.as_deref());
        Ok(Arc::new(OcrEngine::new(config)?))
    }

    #[cfg(not(feature = "ocr"))]
    pub fn extractor(&self) -> Result<Arc<dyn TextExtractor>> {
        Err(schriftwerk_core::error::SchriftwerkError::MissingDependency(
            "text recognition is not available in this build (enable the `ocr` feature)".into(),
        ))
    }

    // -- Use cases -------------------------------------------------------------

    pub fn extract_text(&self) -> Result<ExtractTextUseCase> {
        Ok(self.extract_text_with(self.extractor()?))
    }

    /// Same as `extract_text`, with a caller-supplied extractor.
    pub fn extract_text_with(&self, extractor: Arc<dyn TextExtractor>) -> ExtractTextUseCase {
        ExtractTextUseCase::new(
            Arc::clone(&self.validator),
            Arc::clone(&self.audit),
            extractor,
        )
        .with_paragraph_mode(self.config.ocr.paragraph_mode)
    }

    pub fn extract_batch(&self, max_concurrent: usize) -> Result<ExtractBatchUseCase> {
        Ok(ExtractBatchUseCase::new(Arc::new(self.extract_text()?))
            .with_max_concurrent(max_concurrent))
    }

    pub fn export_text(&self) -> ExportTextUseCase {
        let exporter: Arc<dyn TextExporter> = self.exporter.clone();
        ExportTextUseCase::new(Arc::clone(&self.validator), Arc::clone(&self.audit), exporter)
    }

    pub fn edit_image(&self) -> EditImageUseCase {
        EditImageUseCase::new(Arc::clone(&self.validator), Arc::clone(&self.audit))
    }

    pub fn configuration(&self) -> ConfigurationUseCase {
        let repo: Arc<dyn ConfigRepository> = self.config_repo.clone();
        ConfigurationUseCase::new(repo, Arc::clone(&self.audit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::test_support::{FakeExtractor, write_png};
    use schriftwerk_core::config::{AuditFormat, CONFIG_FILE, PageSize};
    use schriftwerk_core::types::ExportFormat;
    use tempfile::TempDir;

    #[test]
    fn init_creates_dir_and_audit_file() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("data");
        let services = AppServices::init(&dir).unwrap();

        assert_eq!(services.data_dir(), dir);
        let log = std::fs::read_to_string(dir.join("security.log")).unwrap();
        assert!(log.contains("INFO: FILE_ACCESS - Action: config_load, File: config.json"));
    }

    #[test]
    fn audit_settings_come_from_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{ "audit": { "file_name": "trail.jsonl", "format": "json-lines" } }"#,
        )
        .unwrap();

        let services = AppServices::init(dir.path()).unwrap();
        assert_eq!(services.audit().format(), AuditFormat::JsonLines);
        let log = std::fs::read_to_string(dir.path().join("trail.jsonl")).unwrap();
        assert!(log.starts_with('{'));
    }

    #[test]
    fn pdf_page_size_comes_from_config() {
        let dir = TempDir::new().unwrap();
        let services = AppServices::init(dir.path()).unwrap();
        assert_eq!(services.exporter.pdf_page_size(), PageSize::Letter);

        std::fs::write(dir.path().join(CONFIG_FILE), r#"{ "pdf_page_size": "a4" }"#).unwrap();
        let services = AppServices::init(dir.path()).unwrap();
        assert_eq!(services.exporter.pdf_page_size(), PageSize::A4);
    }

    #[test]
    fn invalid_policy_pattern_fails_init() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{ "policy": { "extra_denied_patterns": ["(unclosed"] } }"#,
        )
        .unwrap();
        assert!(AppServices::init(dir.path()).is_err());
    }

    #[cfg(not(feature = "ocr"))]
    #[test]
    fn extractor_is_a_missing_dependency_without_ocr() {
        use schriftwerk_core::error::SchriftwerkError;

        let dir = TempDir::new().unwrap();
        let services = AppServices::init(dir.path()).unwrap();
        assert!(matches!(
            services.extract_text(),
            Err(SchriftwerkError::MissingDependency(_))
        ));
    }

    #[test]
    fn use_cases_share_the_audit_trail() {
        let dir = TempDir::new().unwrap();
        let services = AppServices::init(dir.path()).unwrap();

        let image = write_png(dir.path(), "page.png");
        let extract = services.extract_text_with(Arc::new(FakeExtractor::returning(&["hi"])));
        extract.execute(&image).unwrap();
        services
            .export_text()
            .execute("hi", &dir.path().join("page.txt"), ExportFormat::Txt)
            .unwrap();

        let log = std::fs::read_to_string(dir.path().join("security.log")).unwrap();
        assert!(log.contains("OCR_EXTRACTION - File: page.png, Status: SUCCESS"));
        assert!(log.contains("TEXT_EXPORT - Format: txt, File: page.txt, Status: SUCCESS"));
    }
}
