// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration and its JSON persistence.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SchriftwerkError};
use crate::ports::ConfigRepository;
use crate::types::ExportFormat;

/// 50 MiB.
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 50 * 1024 * 1024;
/// 10 MiB.
pub const DEFAULT_MAX_TEXT_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_MAX_PATH_CHARS: usize = 260;

/// Colour theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl std::str::FromStr for Theme {
    type Err = SchriftwerkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(SchriftwerkError::Config(format!(
                "invalid theme {other:?}: must be 'light' or 'dark'"
            ))),
        }
    }
}

/// Page dimensions for exported PDFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    /// 215.9 x 279.4 mm
    #[default]
    Letter,
    /// 210 x 297 mm
    A4,
}

impl PageSize {
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match self {
            Self::Letter => (215.9, 279.4),
            Self::A4 => (210.0, 297.0),
        }
    }
}

impl std::str::FromStr for PageSize {
    type Err = SchriftwerkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "letter" => Ok(Self::Letter),
            "a4" => Ok(Self::A4),
            other => Err(SchriftwerkError::Config(format!(
                "invalid page size {other:?}: must be 'letter' or 'a4'"
            ))),
        }
    }
}

/// How audit records are rendered on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditFormat {
    /// `[timestamp] SEVERITY: EVENT_TYPE - detail`
    #[default]
    Text,
    /// One JSON object per line.
    JsonLines,
}

/// The security policy thresholds.
///
/// Every value here is overridable from `config.json`; the defaults are the
/// reference policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub max_image_bytes: u64,
    /// Ceiling on UTF-8 encoded text length (inclusive).
    pub max_text_bytes: usize,
    /// Ceiling on path length in characters (inclusive).
    pub max_path_chars: usize,
    /// Lower-case, dot-prefixed.
    pub image_extensions: BTreeSet<String>,
    /// Lower-case, dot-prefixed.
    pub export_extensions: BTreeSet<String>,
    /// Additional case-insensitive regexes rejected on top of the built-in
    /// traversal table.
    pub extra_denied_patterns: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            max_text_bytes: DEFAULT_MAX_TEXT_BYTES,
            max_path_chars: DEFAULT_MAX_PATH_CHARS,
            image_extensions: [".jpg", ".jpeg", ".png", ".bmp", ".gif", ".tiff", ".webp"]
                .into_iter()
                .map(String::from)
                .collect(),
            export_extensions: ExportFormat::ALL
                .iter()
                .map(|f| f.extension().to_string())
                .collect(),
            extra_denied_patterns: Vec::new(),
        }
    }
}

impl PolicyConfig {
    /// Lower-case the configured extensions. File extensions are compared
    /// lower-cased, so `.PNG` in a hand-edited config means `.png`.
    pub fn normalize(&mut self) {
        for set in [&mut self.image_extensions, &mut self.export_extensions] {
            *set = set.iter().map(|ext| ext.trim().to_ascii_lowercase()).collect();
        }
    }

    /// Reject values that would make the policy meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.max_image_bytes == 0 || self.max_text_bytes == 0 || self.max_path_chars == 0 {
            return Err(SchriftwerkError::Config(
                "policy ceilings must be greater than zero".into(),
            ));
        }
        if self.image_extensions.is_empty() || self.export_extensions.is_empty() {
            return Err(SchriftwerkError::Config(
                "allowed extension sets must not be empty".into(),
            ));
        }
        for ext in self.image_extensions.iter().chain(&self.export_extensions) {
            if !ext.starts_with('.') || ext.len() < 2 || *ext != ext.to_ascii_lowercase() {
                return Err(SchriftwerkError::Config(format!(
                    "extension {ext:?} must be lower-case and start with a dot"
                )));
            }
        }
        if let Some(ext) = self
            .export_extensions
            .iter()
            .find(|ext| ExportFormat::from_extension(ext).is_none())
        {
            return Err(SchriftwerkError::Config(format!(
                "no exporter exists for extension {ext:?}"
            )));
        }
        Ok(())
    }
}

/// OCR engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Directory holding the detection and recognition models. `None` means
    /// the engine's default cache directory.
    pub model_dir: Option<PathBuf>,
    /// Join recognised lines into blank-line separated paragraphs.
    pub paragraph_mode: bool,
}

/// Audit trail settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    /// File name inside the data directory.
    pub file_name: String,
    pub format: AuditFormat,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            file_name: "security.log".into(),
            format: AuditFormat::Text,
        }
    }
}

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub theme: Theme,
    pub default_export_format: ExportFormat,
    pub pdf_page_size: PageSize,
    /// Where exports go when no explicit directory is given.
    pub save_directory: Option<PathBuf>,
    pub ocr: OcrSettings,
    pub audit: AuditSettings,
    pub policy: PolicyConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            default_export_format: ExportFormat::Docx,
            pdf_page_size: PageSize::Letter,
            save_directory: None,
            ocr: OcrSettings::default(),
            audit: AuditSettings::default(),
            policy: PolicyConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.audit.file_name.trim().is_empty()
            || self.audit.file_name.contains(['/', '\\'])
        {
            return Err(SchriftwerkError::Config(
                "audit file name must be a plain file name".into(),
            ));
        }
        self.policy.validate()
    }
}

// -- JSON persistence ----------------------------------------------------------

pub const CONFIG_FILE: &str = "config.json";

/// `config.json` in a directory.
///
/// A missing or unreadable file yields the defaults; the application never
/// refuses to start over a bad config.
#[derive(Debug, Clone)]
pub struct JsonConfigRepository {
    path: PathBuf,
}

impl JsonConfigRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(CONFIG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigRepository for JsonConfigRepository {
    fn load(&self) -> AppConfig {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no config file, using defaults");
                return AppConfig::default();
            }
            Err(e) => {
                warn!(error = %e, "config unreadable, using defaults");
                return AppConfig::default();
            }
        };

        match serde_json::from_str::<AppConfig>(&data) {
            Ok(mut config) => {
                config.policy.normalize();
                match config.validate() {
                    Ok(()) => config,
                    Err(e) => {
                        warn!(error = %e, "config rejected, using defaults");
                        AppConfig::default()
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "config corrupt, using defaults");
                AppConfig::default()
            }
        }
    }

    fn save(&self, config: &AppConfig) -> Result<()> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), "config saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_policy_matches_reference() {
        let policy = PolicyConfig::default();
        assert_eq!(policy.max_image_bytes, 50 * 1024 * 1024);
        assert_eq!(policy.max_text_bytes, 10 * 1024 * 1024);
        assert_eq!(policy.max_path_chars, 260);
        assert_eq!(policy.image_extensions.len(), 7);
        assert!(policy.image_extensions.contains(".tiff"));
        assert!(policy.export_extensions.contains(".docx"));
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn policy_rejects_bad_extensions() {
        let mut policy = PolicyConfig::default();
        policy.image_extensions.insert("PNG".into());
        assert!(policy.validate().is_err());

        let mut policy = PolicyConfig::default();
        policy.image_extensions.insert(".PNG".into());
        assert!(policy.validate().is_err());

        let mut policy = PolicyConfig::default();
        policy.export_extensions.insert(".odt".into());
        assert!(policy.validate().is_err());

        let mut policy = PolicyConfig::default();
        policy.max_text_bytes = 0;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let repo = JsonConfigRepository::in_dir(dir.path());
        assert_eq!(repo.load(), AppConfig::default());
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let repo = JsonConfigRepository::in_dir(dir.path());
        std::fs::write(repo.path(), "{ not json").unwrap();
        assert_eq!(repo.load(), AppConfig::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let repo = JsonConfigRepository::in_dir(dir.path());
        std::fs::write(
            repo.path(),
            r#"{ "theme": "dark", "policy": { "max_path_chars": 120 } }"#,
        )
        .unwrap();

        let config = repo.load();
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.policy.max_path_chars, 120);
        assert_eq!(config.policy.max_image_bytes, DEFAULT_MAX_IMAGE_BYTES);
        assert_eq!(config.default_export_format, ExportFormat::Docx);
    }

    #[test]
    fn upper_case_extensions_are_lowered_on_load() {
        let dir = TempDir::new().unwrap();
        let repo = JsonConfigRepository::in_dir(dir.path());
        std::fs::write(
            repo.path(),
            r#"{ "policy": { "image_extensions": [".PNG", ".Jpg"], "max_path_chars": 99 } }"#,
        )
        .unwrap();

        let config = repo.load();
        assert_eq!(config.policy.max_path_chars, 99);
        assert_eq!(
            config.policy.image_extensions,
            [".jpg", ".png"].into_iter().map(String::from).collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn page_size_parsing_and_persistence() {
        assert_eq!("A4".parse::<PageSize>().unwrap(), PageSize::A4);
        assert!("legal".parse::<PageSize>().is_err());
        assert_eq!(AppConfig::default().pdf_page_size, PageSize::Letter);

        let dir = TempDir::new().unwrap();
        let repo = JsonConfigRepository::in_dir(dir.path());
        std::fs::write(repo.path(), r#"{ "pdf_page_size": "a4" }"#).unwrap();
        assert_eq!(repo.load().pdf_page_size, PageSize::A4);
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let repo = JsonConfigRepository::in_dir(dir.path());
        let mut config = AppConfig::default();
        config.default_export_format = ExportFormat::Pdf;
        config.audit.format = AuditFormat::JsonLines;
        repo.save(&config).unwrap();
        assert_eq!(repo.load(), config);
    }

    #[test]
    fn save_refuses_invalid_config() {
        let dir = TempDir::new().unwrap();
        let repo = JsonConfigRepository::in_dir(dir.path());
        let mut config = AppConfig::default();
        config.audit.file_name = "../escape.log".into();
        assert!(repo.save(&config).is_err());
        assert!(!repo.path().exists());
    }

    #[test]
    fn theme_parsing() {
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("blue".parse::<Theme>().is_err());
    }
}
