// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Read and change the persisted application settings.

use std::path::Path;
use std::sync::Arc;

use schriftwerk_core::config::{AppConfig, CONFIG_FILE, PageSize, Theme};
use schriftwerk_core::error::Result;
use schriftwerk_core::ports::ConfigRepository;
use schriftwerk_core::types::ExportFormat;
use schriftwerk_security::AuditLog;
use tracing::{info, instrument};

pub struct ConfigurationUseCase {
    repo: Arc<dyn ConfigRepository>,
    audit: Arc<AuditLog>,
}

impl ConfigurationUseCase {
    pub fn new(repo: Arc<dyn ConfigRepository>, audit: Arc<AuditLog>) -> Self {
        Self { repo, audit }
    }

    /// The stored configuration, or the defaults.
    pub fn get(&self) -> AppConfig {
        self.repo.load()
    }

    /// Validate and persist `config`. An invalid config is never written.
    #[instrument(skip_all)]
    pub fn save(&self, config: &AppConfig) -> Result<()> {
        if let Err(e) = config.validate() {
            self.audit.invalid_input("config", &e.to_string());
            return Err(e);
        }
        self.repo.save(config)?;
        self.audit.file_access(Path::new(CONFIG_FILE), "config_save");
        info!("Configuration saved");
        Ok(())
    }

    pub fn set_theme(&self, theme: Theme) -> Result<AppConfig> {
        self.update(|config| config.theme = theme)
    }

    pub fn set_default_format(&self, format: ExportFormat) -> Result<AppConfig> {
        self.update(|config| config.default_export_format = format)
    }

    pub fn set_page_size(&self, page_size: PageSize) -> Result<AppConfig> {
        self.update(|config| config.pdf_page_size = page_size)
    }

    fn update(&self, change: impl FnOnce(&mut AppConfig)) -> Result<AppConfig> {
        let mut config = self.get();
        change(&mut config);
        self.save(&config)?;
        Ok(config)
    }
}
