// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Input policy — decides whether a path or text payload may be acted on.
//
// Every path-accepting or text-accepting operation goes through here first.
// Checks run in a fixed order and stop at the first failure:
//
//   read:  empty → length → pattern → existence → type → extension → size
//   write: empty → length → pattern → extension-match → extension-allowed
//          → parent-exists → (overwrite notice)
//   text:  size → control characters
//
// The validator holds no mutable state. The only I/O it performs is reading
// filesystem metadata, so it can be shared freely across threads.

use std::io::ErrorKind;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use schriftwerk_core::config::PolicyConfig;
use schriftwerk_core::error::{Result, SchriftwerkError};
use schriftwerk_core::types::{ExportFormat, PolicyCheck, ValidationOutcome};
use tracing::{debug, instrument};

/// Longest file name `sanitize_filename` produces, in characters.
pub const MAX_FILENAME_CHARS: usize = 255;
/// Substituted for every dangerous character.
pub const REPLACEMENT_CHAR: char = '_';
/// Returned when nothing usable is left of a file name.
pub const FALLBACK_FILENAME: &str = "file";

const MIB: u64 = 1024 * 1024;

/// Generic reason for probe failures. The OS error goes to `diagnostic`.
const PROBE_FAILED: &str = "Could not inspect the file";

/// Built-in traversal and system-root table, matched case-insensitively
/// against the raw path before any filesystem access.
static BUILTIN_PATTERNS: LazyLock<Vec<DeniedPattern>> = LazyLock::new(|| {
    [
        (r"\.\./", "parent directory segment (../)"),
        (r"\.\.\\", r"parent directory segment (..\)"),
        (r"(^|[/\\])\.\.$", "trailing parent directory segment (..)"),
        (r"^~([/\\]|$)", "home directory shortcut (~/)"),
        (r"^/(etc|proc|sys|dev|boot)(/|$)", "system directory"),
        (r"^[a-z]:[/\\]windows([/\\]|$)", r"Windows system directory (C:\Windows)"),
        (r"[\x00-\x1f]", "control character"),
    ]
    .into_iter()
    .map(|(pattern, label)| DeniedPattern {
        regex: compile(pattern).expect("built-in policy pattern must compile"),
        label: label.to_string(),
    })
    .collect()
});

fn compile(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

#[derive(Debug, Clone)]
struct DeniedPattern {
    regex: Regex,
    label: String,
}

/// Stateless gatekeeper for paths and text.
///
/// Never panics and never returns an error for a policy decision: every
/// outcome, including filesystem probe failures, is a `ValidationOutcome`.
#[derive(Debug, Clone)]
pub struct PolicyValidator {
    policy: PolicyConfig,
    extra_patterns: Vec<DeniedPattern>,
}

impl Default for PolicyValidator {
    fn default() -> Self {
        Self {
            policy: PolicyConfig::default(),
            extra_patterns: Vec::new(),
        }
    }
}

impl PolicyValidator {
    /// Build a validator from a policy table.
    ///
    /// Fails if the table is inconsistent or an extra pattern is not a valid
    /// regular expression.
    pub fn new(policy: PolicyConfig) -> Result<Self> {
        policy.validate()?;
        let extra_patterns = policy
            .extra_denied_patterns
            .iter()
            .map(|pattern| {
                compile(pattern)
                    .map(|regex| DeniedPattern {
                        regex,
                        label: format!("custom rule {pattern:?}"),
                    })
                    .map_err(|e| {
                        SchriftwerkError::Config(format!("invalid denied pattern {pattern:?}: {e}"))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            policy,
            extra_patterns,
        })
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    // -- Paths ----------------------------------------------------------------

    /// Decide whether `path` may be read as an input image.
    #[instrument(level = "debug", skip_all)]
    pub fn validate_read_path(&self, path: impl AsRef<Path>) -> ValidationOutcome {
        let raw = match self.check_path_text(path.as_ref()) {
            Ok(raw) => raw,
            Err(outcome) => return outcome,
        };

        let (resolved, metadata) = match stat_regular_file(raw) {
            Ok(found) => found,
            Err(outcome) => return outcome,
        };

        let ext = extension_of(&resolved);
        if !self.policy.image_extensions.contains(&ext) {
            return reject(
                PolicyCheck::Extension,
                format!(
                    "Extension not allowed: {} (allowed: {})",
                    display_ext(&ext),
                    join_set(self.policy.image_extensions.iter())
                ),
            );
        }

        let size = metadata.len();
        if size == 0 {
            return reject(PolicyCheck::EmptyFile, "File is empty");
        }
        if size > self.policy.max_image_bytes {
            return reject(
                PolicyCheck::Size,
                format!(
                    "File is too large (max {})",
                    format_bytes(self.policy.max_image_bytes)
                ),
            );
        }

        ValidationOutcome::Accepted
    }

    /// Decide whether `path` may be read as a UTF-8 text source.
    ///
    /// Same string checks, existence and regular-file checks as
    /// [`validate_read_path`](Self::validate_read_path), with no extension
    /// restriction and the text byte ceiling instead of the image one. An
    /// empty file is accepted.
    #[instrument(level = "debug", skip_all)]
    pub fn validate_text_read_path(&self, path: impl AsRef<Path>) -> ValidationOutcome {
        let raw = match self.check_path_text(path.as_ref()) {
            Ok(raw) => raw,
            Err(outcome) => return outcome,
        };
        let (_, metadata) = match stat_regular_file(raw) {
            Ok(found) => found,
            Err(outcome) => return outcome,
        };

        let max = self.policy.max_text_bytes as u64;
        if metadata.len() > max {
            return reject(
                PolicyCheck::Size,
                format!("File is too large (max {})", format_bytes(max)),
            );
        }
        ValidationOutcome::Accepted
    }

    /// Decide whether `path` may be written as an export target.
    ///
    /// `expected_extension` may be given with or without the leading dot.
    /// An existing target is accepted with an overwrite notice.
    #[instrument(level = "debug", skip_all)]
    pub fn validate_write_path(
        &self,
        path: impl AsRef<Path>,
        expected_extension: Option<&str>,
    ) -> ValidationOutcome {
        let raw = match self.check_path_text(path.as_ref()) {
            Ok(raw) => raw,
            Err(outcome) => return outcome,
        };

        let ext = extension_of(Path::new(raw));
        if let Some(expected) = expected_extension.filter(|e| !e.trim().is_empty()) {
            let expected = normalize_ext(expected);
            if ext != expected {
                return reject(
                    PolicyCheck::ExtensionMismatch,
                    format!("Extension mismatch: expected {expected}, got {}", display_ext(&ext)),
                );
            }
        }
        if !self.policy.export_extensions.contains(&ext) {
            return reject(
                PolicyCheck::Extension,
                format!(
                    "Extension not allowed for export: {} (allowed: {})",
                    display_ext(&ext),
                    join_set(self.policy.export_extensions.iter())
                ),
            );
        }

        check_destination(raw)
    }

    /// Decide whether `path` may be written as an edited image.
    ///
    /// Same string checks and parent check as [`validate_write_path`](Self::validate_write_path),
    /// but the extension must be an allowed image extension.
    #[instrument(level = "debug", skip_all)]
    pub fn validate_image_write_path(&self, path: impl AsRef<Path>) -> ValidationOutcome {
        let raw = match self.check_path_text(path.as_ref()) {
            Ok(raw) => raw,
            Err(outcome) => return outcome,
        };
        let ext = extension_of(Path::new(raw));
        if !self.policy.image_extensions.contains(&ext) {
            return reject(
                PolicyCheck::Extension,
                format!(
                    "Extension not allowed: {} (allowed: {})",
                    display_ext(&ext),
                    join_set(self.policy.image_extensions.iter())
                ),
            );
        }
        check_destination(raw)
    }

    /// Checks shared by every path direction. No filesystem access.
    fn check_path_text<'a>(&self, path: &'a Path) -> std::result::Result<&'a str, ValidationOutcome> {
        let Some(raw) = path.to_str() else {
            return Err(reject(PolicyCheck::Encoding, "Path must be valid text"));
        };
        if raw.trim().is_empty() {
            return Err(reject(PolicyCheck::Empty, "Path is empty"));
        }
        if raw.chars().count() > self.policy.max_path_chars {
            return Err(reject(
                PolicyCheck::Length,
                format!(
                    "Path is too long (max {} characters)",
                    self.policy.max_path_chars
                ),
            ));
        }
        if let Some(hit) = BUILTIN_PATTERNS
            .iter()
            .chain(&self.extra_patterns)
            .find(|p| p.regex.is_match(raw))
        {
            debug!(pattern = %hit.label, "path matched a denied pattern");
            return Err(reject(
                PolicyCheck::Pattern,
                format!("Path contains a forbidden pattern: {}", hit.label),
            ));
        }
        Ok(raw)
    }

    // -- Text -----------------------------------------------------------------

    /// Validate text against the configured byte ceiling.
    pub fn validate_text(&self, text: &str) -> ValidationOutcome {
        validate_text_with_limit(text, self.policy.max_text_bytes)
    }

    /// Validate raw bytes that are supposed to be text.
    pub fn validate_text_bytes(&self, bytes: &[u8]) -> ValidationOutcome {
        match std::str::from_utf8(bytes) {
            Ok(text) => self.validate_text(text),
            Err(_) => reject(PolicyCheck::Encoding, "Input must be valid UTF-8 text"),
        }
    }

    // -- Extension helpers ----------------------------------------------------

    /// Whether the path's extension is an allowed image extension. No I/O.
    pub fn is_allowed_image(&self, path: impl AsRef<Path>) -> bool {
        self.policy
            .image_extensions
            .contains(&extension_of(path.as_ref()))
    }

    /// The export format implied by the path's extension, if it is allowed.
    pub fn export_format_for(&self, path: impl AsRef<Path>) -> Option<ExportFormat> {
        let ext = extension_of(path.as_ref());
        if self.policy.export_extensions.contains(&ext) {
            ExportFormat::from_extension(&ext)
        } else {
            None
        }
    }
}

/// Parent must be an existing directory; an existing target is accepted
/// with an overwrite notice unless it is a directory.
fn check_destination(raw: &str) -> ValidationOutcome {
    let absolute = match std::path::absolute(raw) {
        Ok(absolute) => absolute,
        Err(e) => return probe_failure(&e),
    };
    let parent_ok = match absolute.parent() {
        Some(parent) => match std::fs::metadata(parent) {
            Ok(metadata) => metadata.is_dir(),
            Err(e) if is_missing(e.kind()) => false,
            Err(e) => return probe_failure(&e),
        },
        None => false,
    };
    if !parent_ok {
        return reject(PolicyCheck::ParentDirectory, "Destination folder does not exist");
    }

    match std::fs::metadata(&absolute) {
        Ok(metadata) if metadata.is_dir() => {
            reject(PolicyCheck::FileType, "Destination is a folder, not a file")
        }
        Ok(_) => ValidationOutcome::AcceptedWithWarning(
            "File already exists and will be overwritten".into(),
        ),
        Err(e) if is_missing(e.kind()) => ValidationOutcome::Accepted,
        Err(e) => probe_failure(&e),
    }
}

/// Validate text against an explicit byte ceiling (inclusive).
///
/// Rejects text whose UTF-8 length exceeds `max_bytes`, then text containing
/// an ASCII control character other than tab, newline, or carriage return.
pub fn validate_text_with_limit(text: &str, max_bytes: usize) -> ValidationOutcome {
    if text.len() > max_bytes {
        return reject(
            PolicyCheck::Size,
            format!("Text is too large (max {})", format_bytes(max_bytes as u64)),
        );
    }
    if text.chars().any(is_forbidden_control) {
        return reject(
            PolicyCheck::ControlCharacter,
            "Text contains invalid control characters",
        );
    }
    ValidationOutcome::Accepted
}

fn is_forbidden_control(c: char) -> bool {
    (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r')
}

/// Make `name` safe to use as a single file name.
///
/// Dangerous characters become `_`, the stem is truncated so the whole name
/// fits in [`MAX_FILENAME_CHARS`] with the extension intact, and a name with
/// nothing meaningful left becomes [`FALLBACK_FILENAME`]. Idempotent.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if is_dangerous(c) { REPLACEMENT_CHAR } else { c })
        .collect();

    let truncated = truncate_keeping_extension(&replaced, MAX_FILENAME_CHARS);

    if truncated
        .chars()
        .all(|c| c == REPLACEMENT_CHAR || c == '.')
    {
        return FALLBACK_FILENAME.to_string();
    }
    truncated
}

fn is_dangerous(c: char) -> bool {
    matches!(c, '<' | '>' | ':' | '"' | '|' | '?' | '*' | '/' | '\\') || (c as u32) < 0x20
}

fn truncate_keeping_extension(name: &str, max_chars: usize) -> String {
    let total = name.chars().count();
    if total <= max_chars {
        return name.to_string();
    }
    let (stem, ext) = split_extension(name);
    let ext_chars = ext.chars().count();
    if ext_chars >= max_chars {
        return name.chars().take(max_chars).collect();
    }
    let mut out: String = stem.chars().take(max_chars - ext_chars).collect();
    out.push_str(ext);
    out
}

/// Split at the last dot, ignoring leading dots (`.bashrc` has no extension).
fn split_extension(name: &str) -> (&str, &str) {
    let first_non_dot = name.find(|c| c != '.').unwrap_or(name.len());
    match name.rfind('.') {
        Some(idx) if idx > first_non_dot => name.split_at(idx),
        _ => (name, ""),
    }
}

// -- Helpers ------------------------------------------------------------------

/// Resolve `raw` and require an existing regular file behind it.
fn stat_regular_file(raw: &str) -> std::result::Result<(PathBuf, Metadata), ValidationOutcome> {
    let resolved = match std::fs::canonicalize(raw) {
        Ok(resolved) => resolved,
        Err(e) if is_missing(e.kind()) => {
            return Err(reject(PolicyCheck::Existence, "File does not exist"));
        }
        Err(e) => return Err(probe_failure(&e)),
    };

    // Re-stat the resolved target: the file may vanish between calls.
    let metadata = match std::fs::metadata(&resolved) {
        Ok(metadata) => metadata,
        Err(e) if is_missing(e.kind()) => {
            return Err(reject(PolicyCheck::Existence, "File does not exist"));
        }
        Err(e) => return Err(probe_failure(&e)),
    };
    if !metadata.is_file() {
        return Err(reject(PolicyCheck::FileType, "Path is not a regular file"));
    }
    Ok((resolved, metadata))
}

fn reject(check: PolicyCheck, reason: impl Into<String>) -> ValidationOutcome {
    let outcome = ValidationOutcome::reject(check, reason);
    debug!(%check, reason = outcome.reason(), "input rejected");
    outcome
}

fn probe_failure(err: &std::io::Error) -> ValidationOutcome {
    debug!(kind = ?err.kind(), "filesystem probe failed");
    ValidationOutcome::probe_failure(PROBE_FAILED, format!("{:?}", err.kind()))
}

fn is_missing(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::NotFound | ErrorKind::NotADirectory)
}

/// Lower-case extension with leading dot, or `""` when there is none.
fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

fn normalize_ext(ext: &str) -> String {
    format!(".{}", ext.trim().trim_start_matches('.').to_lowercase())
}

fn display_ext(ext: &str) -> &str {
    if ext.is_empty() { "(none)" } else { ext }
}

fn join_set<'a>(items: impl Iterator<Item = &'a String>) -> String {
    items.map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn format_bytes(bytes: u64) -> String {
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MiB", bytes / MIB)
    } else {
        format!("{bytes} bytes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn check_of(outcome: &ValidationOutcome) -> PolicyCheck {
        outcome.rejection().expect("expected a rejection").check
    }

    // -- read ---------------------------------------------------------------

    #[test]
    fn accepts_small_image() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "scan.PNG", b"not really a png");
        let outcome = PolicyValidator::default().validate_read_path(&path);
        assert_eq!(outcome, ValidationOutcome::Accepted);
        assert_eq!(outcome.reason(), "OK");
    }

    #[test]
    fn accepts_every_allowed_extension() {
        let dir = TempDir::new().unwrap();
        let validator = PolicyValidator::default();
        for ext in ["jpg", "jpeg", "png", "bmp", "gif", "tiff", "webp"] {
            let path = write_file(&dir, &format!("img.{ext}"), b"x");
            assert!(validator.validate_read_path(&path).is_accepted(), "{ext}");
        }
    }

    #[test]
    fn traversal_rejected_before_touching_disk() {
        let dir = TempDir::new().unwrap();
        let real = write_file(&dir, "real.png", b"data");
        // A traversal that still resolves to an existing file.
        let dir_name = dir.path().file_name().unwrap().to_str().unwrap();
        let sneaky = format!("{}/../{dir_name}/real.png", dir.path().display());
        let validator = PolicyValidator::default();

        for path in [
            sneaky.as_str(),
            "../secret.png",
            r"..\secret.png",
            "images/..",
            "~/Pictures/a.png",
            r"~\Pictures\a.png",
            "/etc/passwd.png",
            "/ETC/shadow.png",
            "/proc/self/environ.png",
            r"C:\Windows\System32\a.png",
            "c:/windows/a.png",
        ] {
            let outcome = validator.validate_read_path(path);
            assert_eq!(check_of(&outcome), PolicyCheck::Pattern, "{path}");
            assert!(outcome.reason().contains("forbidden pattern"), "{path}");

            let outcome = validator.validate_write_path(path, None);
            assert_eq!(check_of(&outcome), PolicyCheck::Pattern, "{path}");
        }
        assert!(validator.validate_read_path(&real).is_accepted());
    }

    #[test]
    fn empty_and_overlong_paths() {
        let validator = PolicyValidator::default();
        assert_eq!(check_of(&validator.validate_read_path("")), PolicyCheck::Empty);
        assert_eq!(check_of(&validator.validate_read_path("   ")), PolicyCheck::Empty);

        let long = format!("{}.png", "a".repeat(300));
        let outcome = validator.validate_read_path(&long);
        assert_eq!(check_of(&outcome), PolicyCheck::Length);
        assert!(outcome.reason().contains("260"));
    }

    #[test]
    fn length_limit_is_inclusive_and_counts_characters() {
        let mut policy = PolicyConfig::default();
        policy.max_path_chars = 10;
        let validator = PolicyValidator::new(policy).unwrap();
        // 10 characters, more than 10 bytes: passes the length check and
        // fails later on existence.
        let outcome = validator.validate_read_path("ääääää.png");
        assert_eq!(check_of(&outcome), PolicyCheck::Existence);
        let outcome = validator.validate_read_path("ääääääa.png");
        assert_eq!(check_of(&outcome), PolicyCheck::Length);
    }

    #[test]
    fn missing_file() {
        let dir = TempDir::new().unwrap();
        let outcome = PolicyValidator::default().validate_read_path(dir.path().join("nope.png"));
        assert_eq!(check_of(&outcome), PolicyCheck::Existence);
    }

    #[test]
    fn directory_is_not_a_file() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("folder.png");
        std::fs::create_dir(&sub).unwrap();
        let outcome = PolicyValidator::default().validate_read_path(&sub);
        assert_eq!(check_of(&outcome), PolicyCheck::FileType);
    }

    #[test]
    fn disallowed_extension() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "payload.exe", b"MZ");
        let outcome = PolicyValidator::default().validate_read_path(&path);
        assert_eq!(check_of(&outcome), PolicyCheck::Extension);
        assert!(outcome.reason().contains(".exe"));

        let path = write_file(&dir, "noext", b"data");
        let outcome = PolicyValidator::default().validate_read_path(&path);
        assert!(outcome.reason().contains("(none)"));
    }

    #[test]
    fn empty_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "blank.jpg", b"");
        let outcome = PolicyValidator::default().validate_read_path(&path);
        assert_eq!(check_of(&outcome), PolicyCheck::EmptyFile);
        assert!(outcome.reason().to_lowercase().contains("empty"));
    }

    #[test]
    fn oversized_file_rejected_by_default_policy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("huge.png");
        // Sparse file: no real disk usage.
        File::create(&path)
            .unwrap()
            .set_len(DEFAULT_LIMIT + 1)
            .unwrap();
        let outcome = PolicyValidator::default().validate_read_path(&path);
        assert_eq!(check_of(&outcome), PolicyCheck::Size);
        assert!(outcome.reason().contains("50 MiB"));
    }

    const DEFAULT_LIMIT: u64 = 50 * 1024 * 1024;

    #[test]
    fn size_limit_is_inclusive() {
        let mut policy = PolicyConfig::default();
        policy.max_image_bytes = 8;
        let validator = PolicyValidator::new(policy).unwrap();
        let dir = TempDir::new().unwrap();
        let at_limit = write_file(&dir, "a.png", &[1u8; 8]);
        let over = write_file(&dir, "b.png", &[1u8; 9]);
        assert!(validator.validate_read_path(&at_limit).is_accepted());
        let outcome = validator.validate_read_path(&over);
        assert_eq!(check_of(&outcome), PolicyCheck::Size);
        assert!(outcome.reason().contains("8 bytes"));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_to_directory_rejected() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("real_dir");
        std::fs::create_dir(&target).unwrap();
        let link = dir.path().join("link.png");
        std::os::unix::fs::symlink(&target, &link).unwrap();
        let outcome = PolicyValidator::default().validate_read_path(&link);
        assert_eq!(check_of(&outcome), PolicyCheck::FileType);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_path_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;
        let path = Path::new(OsStr::from_bytes(b"bad\xff.png"));
        let outcome = PolicyValidator::default().validate_read_path(path);
        assert_eq!(check_of(&outcome), PolicyCheck::Encoding);
    }

    #[test]
    fn extra_patterns_apply() {
        let mut policy = PolicyConfig::default();
        policy.extra_denied_patterns = vec![r"private".into()];
        let validator = PolicyValidator::new(policy).unwrap();
        let outcome = validator.validate_read_path("Private/photo.png");
        assert_eq!(check_of(&outcome), PolicyCheck::Pattern);
        assert!(outcome.reason().contains("custom rule"));
    }

    #[test]
    fn invalid_extra_pattern_fails_construction() {
        let mut policy = PolicyConfig::default();
        policy.extra_denied_patterns = vec!["(unclosed".into()];
        assert!(PolicyValidator::new(policy).is_err());
    }

    // -- text read ----------------------------------------------------------

    #[test]
    fn text_source_needs_no_image_extension() {
        let dir = TempDir::new().unwrap();
        let validator = PolicyValidator::default();
        for name in ["notes.txt", "README", "empty.md"] {
            let bytes: &[u8] = if name == "empty.md" { b"" } else { b"hello" };
            let path = write_file(&dir, name, bytes);
            assert!(validator.validate_text_read_path(&path).is_accepted(), "{name}");
        }
    }

    #[test]
    fn text_source_traversal_rejected_even_when_it_resolves() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "secret.txt", b"top secret");
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let sneaky = dir.path().join("sub").join("..").join("secret.txt");
        assert!(sneaky.exists());

        let outcome = PolicyValidator::default().validate_text_read_path(&sneaky);
        assert_eq!(check_of(&outcome), PolicyCheck::Pattern);
        let outcome = PolicyValidator::default().validate_text_read_path("/etc/passwd");
        assert_eq!(check_of(&outcome), PolicyCheck::Pattern);
    }

    #[test]
    fn text_source_must_be_an_existing_regular_file() {
        let dir = TempDir::new().unwrap();
        let validator = PolicyValidator::default();
        let missing = validator.validate_text_read_path(dir.path().join("gone.txt"));
        assert_eq!(check_of(&missing), PolicyCheck::Existence);
        let folder = validator.validate_text_read_path(dir.path());
        assert_eq!(check_of(&folder), PolicyCheck::FileType);
    }

    #[test]
    fn text_source_uses_the_text_ceiling() {
        let mut policy = PolicyConfig::default();
        policy.max_text_bytes = 4;
        let validator = PolicyValidator::new(policy).unwrap();
        let dir = TempDir::new().unwrap();
        let at_limit = write_file(&dir, "a.txt", b"abcd");
        let over = write_file(&dir, "b.txt", b"abcde");
        assert!(validator.validate_text_read_path(&at_limit).is_accepted());
        let outcome = validator.validate_text_read_path(&over);
        assert_eq!(check_of(&outcome), PolicyCheck::Size);
        assert!(outcome.reason().contains("4 bytes"));
    }

    // -- write --------------------------------------------------------------

    #[test]
    fn write_to_existing_parent_accepted() {
        let dir = TempDir::new().unwrap();
        let outcome = PolicyValidator::default()
            .validate_write_path(dir.path().join("out.docx"), Some(".docx"));
        assert_eq!(outcome, ValidationOutcome::Accepted);
    }

    #[test]
    fn relative_write_path_uses_current_directory() {
        let outcome = PolicyValidator::default().validate_write_path("out.docx", Some(".docx"));
        assert!(outcome.is_accepted(), "{}", outcome.reason());
    }

    #[test]
    fn write_extension_mismatch() {
        let outcome = PolicyValidator::default().validate_write_path("out.exe", Some(".docx"));
        assert_eq!(check_of(&outcome), PolicyCheck::ExtensionMismatch);
        assert!(outcome.reason().contains(".docx"));
    }

    #[test]
    fn expected_extension_without_dot_and_mixed_case() {
        let dir = TempDir::new().unwrap();
        let outcome = PolicyValidator::default()
            .validate_write_path(dir.path().join("Report.PDF"), Some("pdf"));
        assert!(outcome.is_accepted());
    }

    #[test]
    fn write_extension_not_allowed() {
        let dir = TempDir::new().unwrap();
        let outcome =
            PolicyValidator::default().validate_write_path(dir.path().join("out.exe"), None);
        assert_eq!(check_of(&outcome), PolicyCheck::Extension);
    }

    #[test]
    fn write_missing_parent() {
        let dir = TempDir::new().unwrap();
        let outcome = PolicyValidator::default()
            .validate_write_path(dir.path().join("missing").join("out.txt"), Some(".txt"));
        assert_eq!(check_of(&outcome), PolicyCheck::ParentDirectory);
    }

    #[test]
    fn overwrite_is_accepted_with_warning() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "out.txt", b"old");
        let outcome = PolicyValidator::default().validate_write_path(&path, Some(".txt"));
        assert!(outcome.is_accepted());
        assert!(outcome.warning().unwrap().contains("overwritten"));
    }

    #[test]
    fn write_onto_directory_rejected() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("out.txt");
        std::fs::create_dir(&sub).unwrap();
        let outcome = PolicyValidator::default().validate_write_path(&sub, Some(".txt"));
        assert_eq!(check_of(&outcome), PolicyCheck::FileType);
    }

    #[test]
    fn image_write_path_requires_image_extension() {
        let dir = TempDir::new().unwrap();
        let validator = PolicyValidator::default();
        assert!(validator
            .validate_image_write_path(dir.path().join("edited.png"))
            .is_accepted());
        let outcome = validator.validate_image_write_path(dir.path().join("edited.docx"));
        assert_eq!(check_of(&outcome), PolicyCheck::Extension);
    }

    // -- text ---------------------------------------------------------------

    #[test]
    fn text_size_boundary_is_inclusive() {
        let text = "a".repeat(16);
        assert!(validate_text_with_limit(&text, 16).is_accepted());
        let outcome = validate_text_with_limit(&text, 15);
        assert_eq!(check_of(&outcome), PolicyCheck::Size);
    }

    #[test]
    fn text_size_counts_utf8_bytes() {
        // Four characters, eight bytes.
        assert!(validate_text_with_limit("ßßßß", 8).is_accepted());
        assert!(validate_text_with_limit("ßßßß", 7).is_rejected());
    }

    #[test]
    fn default_text_ceiling() {
        let validator = PolicyValidator::default();
        let big = "A".repeat(11_000_000);
        let outcome = validator.validate_text(&big);
        assert_eq!(check_of(&outcome), PolicyCheck::Size);
        assert!(outcome.reason().contains("10 MiB"));

        let exact = "A".repeat(10 * 1024 * 1024);
        assert!(validator.validate_text(&exact).is_accepted());
    }

    #[test]
    fn control_characters() {
        for code in (0u32..9).chain([11, 12]).chain(14..32) {
            let c = char::from_u32(code).unwrap();
            let text = format!("hello{c}world");
            let outcome = validate_text_with_limit(&text, 1024);
            assert_eq!(check_of(&outcome), PolicyCheck::ControlCharacter, "code {code}");
        }
        assert!(validate_text_with_limit("tab\there\r\nnext line ¿ñ? 漢字", 1024).is_accepted());
        assert!(validate_text_with_limit("", 1024).is_accepted());
    }

    #[test]
    fn text_bytes_must_be_utf8() {
        let validator = PolicyValidator::default();
        let outcome = validator.validate_text_bytes(&[0x66, 0xff, 0x66]);
        assert_eq!(check_of(&outcome), PolicyCheck::Encoding);
        assert!(validator.validate_text_bytes(b"plain").is_accepted());
    }

    // -- sanitize -----------------------------------------------------------

    #[test]
    fn sanitize_replaces_dangerous_characters() {
        let out = sanitize_filename("a<>:\"|?*b.txt");
        assert_eq!(out, "a_______b.txt");
        assert!(out.ends_with(".txt"));

        assert_eq!(sanitize_filename("dir/sub\\name.pdf"), "dir_sub_name.pdf");
        assert_eq!(sanitize_filename("bell\u{7}tab\t.rtf"), "bell_tab_.rtf");
    }

    #[test]
    fn sanitize_fallbacks() {
        assert_eq!(sanitize_filename(""), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename("?"), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename(".."), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename("._."), FALLBACK_FILENAME);
    }

    #[test]
    fn sanitize_truncates_stem_and_keeps_extension() {
        let long = format!("{}.docx", "x".repeat(400));
        let out = sanitize_filename(&long);
        assert_eq!(out.chars().count(), MAX_FILENAME_CHARS);
        assert!(out.ends_with(".docx"));

        let dotfile = format!(".{}", "y".repeat(300));
        assert_eq!(sanitize_filename(&dotfile).chars().count(), MAX_FILENAME_CHARS);
    }

    #[test]
    fn sanitize_is_idempotent() {
        let samples = [
            String::new(),
            "_".into(),
            "normal.png".into(),
            "a<>:\"|?*b.txt".into(),
            "..".into(),
            ".hidden".into(),
            "trailing.".into(),
            "\u{0}\u{1f}".into(),
            format!("{}a", "_".repeat(300)),
            format!("{}.{}", "x".repeat(300), "e".repeat(300)),
            format!("{}.txt", "ñ".repeat(500)),
            "con:out?.rtf".into(),
        ];
        for sample in samples {
            let once = sanitize_filename(&sample);
            assert_eq!(sanitize_filename(&once), once, "input {sample:?}");
        }
    }

    // -- helpers ------------------------------------------------------------

    #[test]
    fn extension_helpers() {
        let validator = PolicyValidator::default();
        assert!(validator.is_allowed_image("photo.JPG"));
        assert!(!validator.is_allowed_image("notes.txt"));
        assert_eq!(validator.export_format_for("a.RTF"), Some(ExportFormat::Rtf));
        assert_eq!(validator.export_format_for("a.png"), None);
    }

    #[test]
    fn concurrent_validation_is_safe() {
        let dir = TempDir::new().unwrap();
        let good = write_file(&dir, "ok.png", b"data");
        let validator = PolicyValidator::default();
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..50 {
                        assert!(validator.validate_read_path(&good).is_accepted());
                        assert!(validator.validate_read_path("../x.png").is_rejected());
                        assert!(validator.validate_text("fine").is_accepted());
                    }
                });
            }
        });
    }
}
