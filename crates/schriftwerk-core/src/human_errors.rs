// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every error is mapped to a plain-English message with a suggestion. Raw OS
// and library error text never reaches these strings: it can carry internal
// paths the user did not type.

use crate::error::SchriftwerkError;
use crate::types::PolicyCheck;

/// What the user can do about an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    /// Trying again may work.
    Transient,
    /// The user has to change something (pick another file, fix a setting).
    ActionRequired,
    /// Retrying or user action will not help in this build/environment.
    Permanent,
}

/// A human-readable error with a message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    pub message: String,
    pub suggestion: String,
    pub urgency: Urgency,
}

impl std::fmt::Display for HumanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.message, self.suggestion)
    }
}

/// Convert a `SchriftwerkError` into a `HumanError`.
pub fn humanize_error(err: &SchriftwerkError) -> HumanError {
    match err {
        SchriftwerkError::Rejected { check, reason } => humanize_rejection(*check, reason),

        SchriftwerkError::Ocr(_) => HumanError {
            message: "Text recognition didn't work on this image.".into(),
            suggestion: "Try a sharper image with more contrast, or crop it to the text area."
                .into(),
            urgency: Urgency::Transient,
        },

        SchriftwerkError::Image(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The file may be damaged or in an unusual format. Try saving it as PNG or JPEG first.".into(),
            urgency: Urgency::ActionRequired,
        },

        SchriftwerkError::Export(detail) if detail.contains("nothing to export") => HumanError {
            message: "There is no text to export.".into(),
            suggestion: "Extract text from an image first, or check that the input is not blank."
                .into(),
            urgency: Urgency::ActionRequired,
        },

        SchriftwerkError::Export(_) => HumanError {
            message: "The document couldn't be created.".into(),
            suggestion: "Try a different export format, or export as plain text.".into(),
            urgency: Urgency::Transient,
        },

        SchriftwerkError::Config(_) => HumanError {
            message: "A setting has an invalid value.".into(),
            suggestion: "Check config.json, or delete it to go back to the defaults.".into(),
            urgency: Urgency::ActionRequired,
        },

        SchriftwerkError::MissingDependency(what) => HumanError {
            message: "This feature isn't available.".into(),
            suggestion: format!("A required component is missing: {what}."),
            urgency: Urgency::Permanent,
        },

        SchriftwerkError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "The file couldn't be found.".into(),
                suggestion: "It may have been moved or deleted. Try choosing the file again."
                    .into(),
                urgency: Urgency::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Schriftwerk doesn't have permission to use that file.".into(),
                suggestion: "Check the file permissions, or choose a different folder.".into(),
                urgency: Urgency::ActionRequired,
            },
            _ => HumanError {
                message: "There was a problem reading or writing a file.".into(),
                suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                urgency: Urgency::Transient,
            },
        },

        SchriftwerkError::Serialization(_) => HumanError {
            message: "Saved data couldn't be read.".into(),
            suggestion: "The settings file may be damaged. Delete it to restore defaults."
                .into(),
            urgency: Urgency::ActionRequired,
        },
    }
}

/// Policy rejections already carry a display-safe reason; add the suggestion.
fn humanize_rejection(check: PolicyCheck, reason: &str) -> HumanError {
    let suggestion = match check {
        PolicyCheck::Empty | PolicyCheck::Existence => "Choose an existing file.",
        PolicyCheck::Encoding => "Use a file name without unusual characters.",
        PolicyCheck::Length => "Move the file to a folder with a shorter path.",
        PolicyCheck::Pattern => "Use a plain path inside your own folders.",
        PolicyCheck::FileType => "Choose a file, not a folder.",
        PolicyCheck::ExtensionMismatch | PolicyCheck::Extension => {
            "Choose a file with one of the supported extensions."
        }
        PolicyCheck::EmptyFile => "The file has no content. Choose another one.",
        PolicyCheck::Size => "Use a smaller file.",
        PolicyCheck::ParentDirectory => "Create the destination folder first.",
        PolicyCheck::ControlCharacter => "Remove invisible control characters from the text.",
        PolicyCheck::Probe => "Check the file permissions and try again.",
    };
    let mut message = reason.to_string();
    if !message.ends_with(['.', '!', '?']) {
        message.push('.');
    }
    HumanError {
        message,
        suggestion: suggestion.into(),
        urgency: if check == PolicyCheck::Probe {
            Urgency::Transient
        } else {
            Urgency::ActionRequired
        },
    }
}
