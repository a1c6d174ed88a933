// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Schriftwerk.

use thiserror::Error;

use crate::types::PolicyCheck;

/// Top-level error type for all Schriftwerk operations.
///
/// Expected policy refusals travel as `ValidationOutcome` values; they only
/// become `Rejected` at the point where an operation has to abort.
#[derive(Debug, Error)]
pub enum SchriftwerkError {
    // -- Policy --
    #[error("rejected by policy ({check}): {reason}")]
    Rejected { check: PolicyCheck, reason: String },

    // -- Extraction / documents --
    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("export failed: {0}")]
    Export(String),

    // -- Configuration / wiring --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("required component unavailable: {0}")]
    MissingDependency(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SchriftwerkError>;
