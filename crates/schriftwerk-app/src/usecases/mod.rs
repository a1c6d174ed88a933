// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Use cases — one struct per user-facing operation.
//
// Collaborators arrive through the constructor; nothing here looks anything
// up by name. Every use case passes its inputs through the `PolicyValidator`
// before touching them and leaves an audit record for what it did.

pub mod batch;
pub mod configuration;
pub mod export;
pub mod extraction;
pub mod image;
pub mod usage;

#[cfg(test)]
pub(crate) mod test_support;

use std::path::Path;

use schriftwerk_core::error::Result;
use schriftwerk_core::types::{Severity, ValidationOutcome};
use schriftwerk_security::AuditLog;

pub use batch::ExtractBatchUseCase;
pub use configuration::ConfigurationUseCase;
pub use export::{ExportReport, ExportTextUseCase};
pub use extraction::ExtractTextUseCase;
pub use image::EditImageUseCase;
pub use usage::{RecentFile, UsageStats, UsageStore};

/// Turn a policy decision into control flow.
///
/// Audits the decision (see [`audit_outcome`]) and returns the overwrite
/// notice, if any, on acceptance.
pub(crate) fn enforce(
    audit: &AuditLog,
    category: &str,
    path: Option<&Path>,
    outcome: ValidationOutcome,
) -> Result<Option<String>> {
    audit_outcome(audit, category, path, &outcome);
    outcome.into_result()
}

/// A rejection is audited as `INVALID_INPUT` under `category`; a probe
/// failure additionally leaves an ERROR `FILE_ACCESS` record carrying the OS
/// diagnostic. Acceptances leave no record here.
pub(crate) fn audit_outcome(
    audit: &AuditLog,
    category: &str,
    path: Option<&Path>,
    outcome: &ValidationOutcome,
) {
    if let ValidationOutcome::Rejected(rejection) = outcome {
        audit.invalid_input(category, &rejection.reason);
        if let Some(diagnostic) = &rejection.diagnostic {
            let target = path.unwrap_or(Path::new(""));
            audit.file_access_with(target, &format!("probe_failed ({diagnostic})"), Severity::Error);
        }
    }
}

/// Audit an I/O failure while writing user output as an ERROR `FILE_ACCESS`
/// record. Permission problems are also escalated to a security incident.
pub(crate) fn audit_write_failure(audit: &AuditLog, path: &Path, err: &std::io::Error) {
    audit.file_access_with(path, &format!("write_failed ({})", err.kind()), Severity::Error);
    if err.kind() == std::io::ErrorKind::PermissionDenied {
        audit.security_incident(
            "WRITE_PERMISSION_DENIED",
            &schriftwerk_security::basename(path),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::test_support::audit_log;
    use schriftwerk_security::PolicyValidator;
    use std::io::{Error, ErrorKind};

    #[test]
    fn write_failures_are_always_recorded() {
        let (audit, buffer) = audit_log();

        let full = Error::from(ErrorKind::StorageFull);
        audit_write_failure(&audit, Path::new("/out/full.pdf"), &full);
        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("ERROR: FILE_ACCESS - Action: write_failed"));
        assert!(lines[0].ends_with("File: full.pdf"));

        audit_write_failure(
            &audit,
            Path::new("/out/locked.pdf"),
            &Error::from(ErrorKind::PermissionDenied),
        );
        let lines = buffer.lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("ERROR: FILE_ACCESS - Action: write_failed"));
        assert!(lines[2].ends_with("SECURITY_INCIDENT - WRITE_PERMISSION_DENIED: locked.pdf"));
        assert!(lines[2].contains("CRITICAL"));
    }

    #[test]
    fn only_rejections_are_audited_as_invalid_input() {
        let (audit, buffer) = audit_log();
        audit_outcome(&audit, "check_path", None, &ValidationOutcome::Accepted);
        assert!(buffer.contents().is_empty());

        let outcome = PolicyValidator::default().validate_read_path(Path::new("../etc/passwd"));
        audit_outcome(&audit, "check_path", None, &outcome);
        assert!(buffer.contents().contains("WARNING: INVALID_INPUT - Type: check_path"));
    }
}

