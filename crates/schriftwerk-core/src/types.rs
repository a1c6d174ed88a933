// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Schriftwerk: validation outcomes, audit vocabulary,
// export formats, extraction results, and batch jobs.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SchriftwerkError;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// The policy check that produced a rejection.
///
/// Checks run in a fixed order and the first failure wins, so the variant
/// identifies exactly which rule the input broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyCheck {
    /// Input was empty.
    Empty,
    /// Input was not valid UTF-8 text.
    Encoding,
    /// Path exceeded the maximum length.
    Length,
    /// Path matched a traversal or system-root pattern.
    Pattern,
    /// Path does not exist.
    Existence,
    /// Path exists but is not a regular file (or, for writes, is a directory).
    FileType,
    /// Extension differs from the one the caller asked for.
    ExtensionMismatch,
    /// Extension is not in the allowed set.
    Extension,
    /// File has zero bytes.
    EmptyFile,
    /// File or text exceeds its size ceiling.
    Size,
    /// Parent directory of a write target does not exist.
    ParentDirectory,
    /// Text contains a forbidden control character.
    ControlCharacter,
    /// The filesystem could not be probed (permission denied, race, ...).
    Probe,
}

impl PolicyCheck {
    /// Short tag used as the category of an `INVALID_INPUT` audit record.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Encoding => "encoding",
            Self::Length => "length",
            Self::Pattern => "pattern",
            Self::Existence => "existence",
            Self::FileType => "file_type",
            Self::ExtensionMismatch => "extension_mismatch",
            Self::Extension => "extension",
            Self::EmptyFile => "empty_file",
            Self::Size => "size",
            Self::ParentDirectory => "parent_directory",
            Self::ControlCharacter => "control_character",
            Self::Probe => "probe",
        }
    }
}

impl std::fmt::Display for PolicyCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an input was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub check: PolicyCheck,
    /// Policy-level explanation, safe to show to the user.
    pub reason: String,
    /// OS-level detail for probe failures. Goes to the audit trail only,
    /// never into `reason`.
    pub diagnostic: Option<String>,
}

/// Result of a policy decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationOutcome {
    Accepted,
    /// Accepted, but the caller should surface the notice (e.g. overwrite).
    AcceptedWithWarning(String),
    Rejected(Rejection),
}

impl ValidationOutcome {
    /// Build a rejection without diagnostic detail.
    pub fn reject(check: PolicyCheck, reason: impl Into<String>) -> Self {
        Self::Rejected(Rejection {
            check,
            reason: reason.into(),
            diagnostic: None,
        })
    }

    /// Build a probe-failure rejection carrying an operator diagnostic.
    pub fn probe_failure(reason: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self::Rejected(Rejection {
            check: PolicyCheck::Probe,
            reason: reason.into(),
            diagnostic: Some(diagnostic.into()),
        })
    }

    pub fn is_accepted(&self) -> bool {
        !self.is_rejected()
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Human-readable reason. `"OK"` for a plain acceptance.
    pub fn reason(&self) -> &str {
        match self {
            Self::Accepted => "OK",
            Self::AcceptedWithWarning(notice) => notice,
            Self::Rejected(rejection) => &rejection.reason,
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            Self::AcceptedWithWarning(notice) => Some(notice),
            _ => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }

    /// Convert into a `Result` for call sites that must abort on rejection.
    ///
    /// `Ok` carries the warning notice, if any.
    pub fn into_result(self) -> Result<Option<String>, SchriftwerkError> {
        match self {
            Self::Accepted => Ok(None),
            Self::AcceptedWithWarning(notice) => Ok(Some(notice)),
            Self::Rejected(Rejection { check, reason, .. }) => {
                Err(SchriftwerkError::Rejected { check, reason })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Audit vocabulary
// ---------------------------------------------------------------------------

/// Category of an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    OcrExtraction,
    TextExport,
    InvalidInput,
    FileAccess,
    SecurityIncident,
}

impl AuditEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OcrExtraction => "OCR_EXTRACTION",
            Self::TextExport => "TEXT_EXPORT",
            Self::InvalidInput => "INVALID_INPUT",
            Self::FileAccess => "FILE_ACCESS",
            Self::SecurityIncident => "SECURITY_INCIDENT",
        }
    }
}

impl std::fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Document formats extracted text can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Txt,
    Docx,
    Pdf,
    Rtf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [Self::Txt, Self::Docx, Self::Pdf, Self::Rtf];

    /// File extension including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Txt => ".txt",
            Self::Docx => ".docx",
            Self::Pdf => ".pdf",
            Self::Rtf => ".rtf",
        }
    }

    /// Short tag used in audit records and on the command line.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
            Self::Rtf => "rtf",
        }
    }

    /// Infer the format from an extension, with or without the leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.');
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(Self::Txt),
            "docx" => Some(Self::Docx),
            "pdf" => Some(Self::Pdf),
            "rtf" => Some(Self::Rtf),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = SchriftwerkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s)
            .ok_or_else(|| SchriftwerkError::Config(format!("unknown export format: {s}")))
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Basic facts about an image submitted for extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Container format as detected from the file contents (e.g. "Png").
    pub format: String,
}


/// Text recovered from one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub text: String,
    /// Number of recognised lines before joining.
    pub line_count: usize,
    pub image_path: PathBuf,
    pub extracted_at: DateTime<Local>,
    pub processing_secs: f64,
}

impl ExtractionResult {
    /// Number of characters (Unicode scalar values) in the text.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

// ---------------------------------------------------------------------------
// Batch jobs
// ---------------------------------------------------------------------------

/// Unique identifier for a batch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub Uuid);

impl BatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a single image within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchTask {
    pub image_path: PathBuf,
    pub status: TaskStatus,
    pub result: Option<ExtractionResult>,
    /// Human-readable failure message.
    pub error: Option<String>,
}

impl BatchTask {
    pub fn new(image_path: impl Into<PathBuf>) -> Self {
        Self {
            image_path: image_path.into(),
            status: TaskStatus::Pending,
            result: None,
            error: None,
        }
    }
}

/// A set of images processed together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJob {
    pub id: BatchId,
    pub tasks: Vec<BatchTask>,
    pub created_at: DateTime<Local>,
    pub completed_at: Option<DateTime<Local>>,
}

impl BatchJob {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            id: BatchId::new(),
            tasks: paths.into_iter().map(BatchTask::new).collect(),
            created_at: Local::now(),
            completed_at: None,
        }
    }

    pub fn total_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn completed_tasks(&self) -> usize {
        self.count_status(TaskStatus::Completed)
    }

    pub fn failed_tasks(&self) -> usize {
        self.count_status(TaskStatus::Failed)
    }

    /// Percentage of tasks completed successfully (0.0 for an empty batch).
    pub fn progress(&self) -> f64 {
        if self.tasks.is_empty() {
            return 0.0;
        }
        self.completed_tasks() as f64 / self.total_tasks() as f64 * 100.0
    }

    fn count_status(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }
}
