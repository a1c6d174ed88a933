// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixtures shared by the use-case tests.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use image::{Rgb, RgbImage};
use schriftwerk_core::config::AuditFormat;
use schriftwerk_core::error::{Result, SchriftwerkError};
use schriftwerk_core::ports::TextExtractor;
use schriftwerk_core::types::ImageInfo;
use schriftwerk_security::{AuditLog, PolicyValidator, basename};

/// Audit sink that can be read back after the log has taken it.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(String::from).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub fn audit_log() -> (Arc<AuditLog>, SharedBuffer) {
    let buffer = SharedBuffer::default();
    (
        Arc::new(AuditLog::with_sink(buffer.clone(), AuditFormat::Text)),
        buffer,
    )
}

pub fn validator() -> Arc<PolicyValidator> {
    Arc::new(PolicyValidator::default())
}

/// Returns canned lines, or fails when `fail_on` is part of the file name.
#[derive(Default)]
pub struct FakeExtractor {
    pub lines: Vec<String>,
    pub fail_on: Option<String>,
    pub calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn returning(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_on = Some(marker.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextExtractor for FakeExtractor {
    fn extract_lines(&self, image: &ImageInfo) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = basename(&image.path);
        if let Some(marker) = &self.fail_on {
            if name.contains(marker.as_str()) {
                return Err(SchriftwerkError::Ocr("model produced no output".into()));
            }
        }
        Ok(self.lines.clone())
    }
}

/// Write a small real PNG into `dir`.
pub fn write_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(8, 4, Rgb([250, 250, 250]))
        .save(&path)
        .unwrap();
    path
}
