// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory resolution.

use std::path::{Path, PathBuf};

use schriftwerk_core::error::Result;

const APP_DIR: &str = "schriftwerk";

/// The explicit directory if given, otherwise the conventional location.
pub fn resolve(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| dirs_fallback().join(APP_DIR))
}

/// Create `dir` (and its parents) if it does not exist yet.
pub fn ensure(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

fn dirs_fallback() -> PathBuf {
    // Try XDG data dir, then fallback to home
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        if !xdg.is_empty() {
            return PathBuf::from(xdg);
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    // Last resort
    std::env::temp_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_dir_wins() {
        assert_eq!(resolve(Some("/srv/sw".into())), PathBuf::from("/srv/sw"));
    }

    #[test]
    fn default_ends_with_app_name() {
        assert!(resolve(None).ends_with(APP_DIR));
    }

    #[test]
    fn ensure_creates_nested_dirs() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure(&nested).unwrap();
        assert!(nested.is_dir());
        ensure(&nested).unwrap();
    }
}
