// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export module — encode extracted text as TXT, DOCX, PDF, or RTF.
//
// Encoders produce bytes only; writing them to disk (and validating the
// destination) is the caller's job.

pub mod docx;
pub mod pdf;
pub mod rtf;

use schriftwerk_core::error::{Result, SchriftwerkError};
use schriftwerk_core::ports::TextExporter;
use schriftwerk_core::types::ExportFormat;
use tracing::{debug, instrument};

pub use pdf::{PageSize, PdfWriter};

/// Encodes text into every supported [`ExportFormat`].
#[derive(Debug, Clone, Default)]
pub struct MultiFormatExporter {
    pdf: PdfWriter,
}

impl MultiFormatExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific PDF writer (page size).
    pub fn with_pdf_writer(pdf: PdfWriter) -> Self {
        Self { pdf }
    }

    pub fn pdf_page_size(&self) -> PageSize {
        self.pdf.page_size()
    }
}

impl TextExporter for MultiFormatExporter {
    /// Refuses empty or whitespace-only text for every format.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    fn encode(&self, text: &str, format: ExportFormat) -> Result<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(SchriftwerkError::Export("nothing to export".into()));
        }

        let bytes = match format {
            ExportFormat::Txt => text.as_bytes().to_vec(),
            ExportFormat::Docx => docx::encode(text)?,
            ExportFormat::Pdf => self.pdf.create_from_text(text)?,
            ExportFormat::Rtf => rtf::encode(text).into_bytes(),
        };
        debug!(out_len = bytes.len(), "Text encoded");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_refused_for_every_format() {
        let exporter = MultiFormatExporter::new();
        for format in ExportFormat::ALL {
            for text in ["", "   ", "\n\t\n"] {
                let err = exporter.encode(text, format).unwrap_err();
                assert!(matches!(err, SchriftwerkError::Export(ref m) if m == "nothing to export"));
            }
        }
    }

    #[test]
    fn txt_is_verbatim_utf8() {
        let exporter = MultiFormatExporter::new();
        let text = "Grüße\nzweite Zeile";
        assert_eq!(exporter.encode(text, ExportFormat::Txt).unwrap(), text.as_bytes());
    }

    #[test]
    fn every_format_produces_its_magic() {
        let exporter = MultiFormatExporter::new();
        let text = "Invoice 42\nTotal: 13.37";
        assert!(exporter.encode(text, ExportFormat::Docx).unwrap().starts_with(b"PK"));
        assert!(exporter.encode(text, ExportFormat::Pdf).unwrap().starts_with(b"%PDF"));
        assert!(exporter.encode(text, ExportFormat::Rtf).unwrap().starts_with(b"{\\rtf1"));
    }
}
