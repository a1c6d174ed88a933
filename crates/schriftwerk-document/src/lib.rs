// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// schriftwerk-document — everything that turns pixels into text and text
// into files.
//
// Provides the multi-format exporter (TXT, DOCX, PDF, RTF), the image editing
// pipeline (rotate, crop, brightness/contrast, grayscale), search/replace and
// statistics over extracted text, and, behind the `ocr` feature, the OCR
// engine.
//
// Nothing in this crate validates paths. Callers pass inputs that have already
// been through the security policy.

pub mod export;
pub mod image;
pub mod text_tools;

#[cfg(feature = "ocr")]
pub mod ocr;

// Re-export the primary structs so callers can use `schriftwerk_document::MultiFormatExporter` etc.
pub use export::{MultiFormatExporter, PdfWriter};
pub use image::processor::{ImageOp, ImageProcessor};
pub use text_tools::{SearchOptions, TextStats, find_matches, replace_all};

#[cfg(feature = "ocr")]
pub use ocr::OcrEngine;
