// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Audit trail — append-only, one line per security-relevant event.
//
// Line format (text):
//   [2026-10-19T14:03:11.512904+02:00] WARNING: INVALID_INPUT - Type: image, Reason: File is empty
//
// Line format (json-lines):
//   {"timestamp":"...","event_type":"INVALID_INPUT","severity":"WARNING","detail":"..."}
//
// Paths never reach a record in full: every wrapper reduces them to the
// basename. Recording never fails from the caller's point of view; a sink
// error is reported on the tracing channel and the record is dropped.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Local, SecondsFormat};
use schriftwerk_core::config::AuditFormat;
use schriftwerk_core::error::Result;
use schriftwerk_core::types::{AuditEventType, ExportFormat, Severity};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// One immutable audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Local>,
    pub event_type: AuditEventType,
    pub severity: Severity,
    /// Single-line detail; embedded line breaks are escaped on construction.
    pub detail: String,
}

impl AuditRecord {
    pub fn new(event_type: AuditEventType, severity: Severity, detail: &str) -> Self {
        Self {
            timestamp: Local::now(),
            event_type,
            severity,
            detail: escape_line_breaks(detail),
        }
    }

    /// Render the record as one newline-terminated line.
    pub fn to_line(&self, format: AuditFormat) -> String {
        let mut line = match format {
            AuditFormat::Text => self.to_string(),
            // Serialising these four plain fields cannot fail; fall back to
            // the text form rather than lose the record.
            AuditFormat::JsonLines => {
                serde_json::to_string(self).unwrap_or_else(|_| self.to_string())
            }
        };
        line.push('\n');
        line
    }
}

impl std::fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}: {} - {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, false),
            self.severity,
            self.event_type,
            self.detail
        )
    }
}

/// Append-only audit sink shared by every component that records events.
///
/// The sink sits behind a mutex and each record is written with a single
/// `write_all` of the fully formatted line, so concurrent callers never
/// produce interleaved or partial lines.
pub struct AuditLog {
    sink: Mutex<Box<dyn Write + Send>>,
    format: AuditFormat,
    dropped: AtomicU64,
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog")
            .field("format", &self.format)
            .field("dropped", &self.dropped_records())
            .finish_non_exhaustive()
    }
}

impl AuditLog {
    /// Open (or create) the audit file at `path` in append mode.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, format: AuditFormat) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        debug!("audit log opened");
        Ok(Self::with_sink(file, format))
    }

    /// Record into any writer (a file, a pipe, a test buffer).
    pub fn with_sink(sink: impl Write + Send + 'static, format: AuditFormat) -> Self {
        Self {
            sink: Mutex::new(Box::new(sink)),
            format,
            dropped: AtomicU64::new(0),
        }
    }

    /// A log that accepts and discards every record.
    pub fn discard() -> Self {
        Self::with_sink(std::io::sink(), AuditFormat::Text)
    }

    pub fn format(&self) -> AuditFormat {
        self.format
    }

    /// Number of records lost to sink errors since construction.
    pub fn dropped_records(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Append one record. Never fails; sink errors are logged and counted.
    pub fn record(&self, event_type: AuditEventType, severity: Severity, detail: &str) {
        let record = AuditRecord::new(event_type, severity, detail);
        self.append(&record.to_line(self.format));
    }

    fn append(&self, line: &str) {
        // A panic while holding the lock cannot leave a half-written line
        // behind in our buffer, so a poisoned lock is safe to reuse.
        let mut sink = match self.sink.lock() {
            Ok(sink) => sink,
            Err(poisoned) => poisoned.into_inner(),
        };
        let written = sink.write_all(line.as_bytes()).and_then(|()| sink.flush());
        if let Err(e) = written {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(error = %e, "failed to append audit record");
        }
    }

    // -- Event wrappers -------------------------------------------------------

    /// Outcome of an OCR extraction.
    pub fn extraction(&self, image: impl AsRef<Path>, success: bool, char_count: usize) {
        let severity = if success { Severity::Info } else { Severity::Error };
        self.record(
            AuditEventType::OcrExtraction,
            severity,
            &format!(
                "File: {}, Status: {}, Chars: {char_count}",
                basename(image.as_ref()),
                status(success)
            ),
        );
    }

    /// Outcome of a text export.
    pub fn export(&self, target: impl AsRef<Path>, format: ExportFormat, success: bool) {
        let severity = if success { Severity::Info } else { Severity::Error };
        self.record(
            AuditEventType::TextExport,
            severity,
            &format!(
                "Format: {format}, File: {}, Status: {}",
                basename(target.as_ref()),
                status(success)
            ),
        );
    }

    /// A rejected input. `category` names what kind of input it was.
    pub fn invalid_input(&self, category: &str, reason: &str) {
        self.record(
            AuditEventType::InvalidInput,
            Severity::Warning,
            &format!("Type: {category}, Reason: {reason}"),
        );
    }

    /// A file was read, written, or otherwise touched.
    pub fn file_access(&self, path: impl AsRef<Path>, action: &str) {
        self.file_access_with(path, action, Severity::Info);
    }

    /// [`file_access`](Self::file_access) at a chosen severity.
    pub fn file_access_with(&self, path: impl AsRef<Path>, action: &str, severity: Severity) {
        self.record(
            AuditEventType::FileAccess,
            severity,
            &format!("Action: {action}, File: {}", basename(path.as_ref())),
        );
    }

    /// Something that should not happen in normal use. Always CRITICAL.
    pub fn security_incident(&self, category: &str, detail: &str) {
        self.record(
            AuditEventType::SecurityIncident,
            Severity::Critical,
            &format!("{category}: {detail}"),
        );
    }
}

/// Final path component, splitting on both `/` and `\`.
///
/// Returns `"unknown"` when nothing is left.
pub fn basename(path: &Path) -> String {
    let raw = path.to_string_lossy();
    raw.trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

fn status(success: bool) -> &'static str {
    if success { "SUCCESS" } else { "FAILED" }
}

fn escape_line_breaks(detail: &str) -> String {
    if !detail.contains(['\n', '\r']) {
        return detail.to_string();
    }
    detail.replace('\r', "\\r").replace('\n', "\\n")
}
