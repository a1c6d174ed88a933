// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Usage statistics and the recent-files list, persisted as `usage.json`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};
use schriftwerk_core::error::{Result, SchriftwerkError};
use schriftwerk_core::types::{AuditEventType, Severity};
use schriftwerk_security::{AuditLog, PolicyValidator, basename};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

pub const USAGE_FILE: &str = "usage.json";
pub const MAX_RECENT_FILES: usize = 10;

/// Running totals over every successful extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageStats {
    pub total_characters: u64,
    pub files_processed: u64,
    pub total_processing_secs: f64,
}

impl UsageStats {
    /// Mean seconds per file, 0 before the first extraction.
    pub fn average_secs(&self) -> f64 {
        if self.files_processed == 0 {
            0.0
        } else {
            self.total_processing_secs / self.files_processed as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentFile {
    pub path: PathBuf,
    pub char_count: usize,
    pub added_at: DateTime<Local>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct UsageData {
    stats: UsageStats,
    recent_files: Vec<RecentFile>,
}

/// Every mutation is written back to disk before it returns.
pub struct UsageStore {
    path: PathBuf,
    validator: Arc<PolicyValidator>,
    audit: Arc<AuditLog>,
    data: Mutex<UsageData>,
}

impl UsageStore {
    /// Load `usage.json` from `dir`. A missing or corrupt file starts empty.
    pub fn open(dir: &Path, validator: Arc<PolicyValidator>, audit: Arc<AuditLog>) -> Self {
        let path = dir.join(USAGE_FILE);
        let data = match std::fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!(error = %e, "usage file corrupt, starting fresh");
                UsageData::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => UsageData::default(),
            Err(e) => {
                warn!(error = %e, "usage file unreadable, starting fresh");
                UsageData::default()
            }
        };
        Self {
            path,
            validator,
            audit,
            data: Mutex::new(data),
        }
    }

    pub fn stats(&self) -> UsageStats {
        self.lock().stats.clone()
    }

    /// Newest first.
    pub fn recent(&self) -> Vec<RecentFile> {
        self.lock().recent_files.clone()
    }

    /// Fold one successful extraction into the totals.
    #[instrument(skip(self))]
    pub fn record_extraction(&self, char_count: usize, processing_secs: f64) -> Result<UsageStats> {
        if !processing_secs.is_finite() || processing_secs < 0.0 {
            self.audit
                .invalid_input("usage_stats", "Processing time must be a non-negative number");
            return Err(SchriftwerkError::Config(format!(
                "invalid processing time: {processing_secs}"
            )));
        }
        let mut data = self.lock();
        data.stats.total_characters += char_count as u64;
        data.stats.files_processed += 1;
        data.stats.total_processing_secs += processing_secs;
        self.persist(&data)?;
        Ok(data.stats.clone())
    }

    /// Put `path` at the top of the recent list.
    ///
    /// Returns `false` when the path fails the read policy; nothing is stored
    /// in that case.
    #[instrument(skip(self, path), fields(file = %basename(path)))]
    pub fn add_recent(&self, path: &Path, char_count: usize) -> Result<bool> {
        let outcome = self.validator.validate_read_path(path);
        if outcome.is_rejected() {
            self.audit.invalid_input("recent_file", outcome.reason());
            return Ok(false);
        }

        let mut data = self.lock();
        data.recent_files.retain(|entry| entry.path != path);
        data.recent_files.insert(
            0,
            RecentFile {
                path: path.to_path_buf(),
                char_count,
                added_at: Local::now(),
            },
        );
        data.recent_files.truncate(MAX_RECENT_FILES);
        self.persist(&data)?;
        self.audit.file_access(path, "recent_add");
        Ok(true)
    }

    pub fn clear_stats(&self) -> Result<()> {
        let mut data = self.lock();
        data.stats = UsageStats::default();
        self.persist(&data)
    }

    pub fn clear_recent(&self) -> Result<()> {
        let mut data = self.lock();
        data.recent_files.clear();
        self.persist(&data)?;
        self.audit.record(
            AuditEventType::FileAccess,
            Severity::Info,
            "Action: recent_cleared",
        );
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, UsageData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, data: &UsageData) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), "usage saved");
        Ok(())
    }
}
