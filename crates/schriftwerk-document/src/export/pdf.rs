// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — lay extracted text out on pages using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem,
};
pub use schriftwerk_core::config::PageSize;
use schriftwerk_core::error::Result;
use tracing::{debug, info, instrument};

const FONT_SIZE_PT: f32 = 11.0;
const LINE_HEIGHT_PT: f32 = 15.0;
const MARGIN_MM: f32 = 15.0;
/// Title metadata embedded in the PDF /Info dictionary.
const PDF_TITLE: &str = "Schriftwerk Export";

/// Creates PDF documents from plain text.
#[derive(Debug, Clone)]
pub struct PdfWriter {
    page_size: PageSize,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new(PageSize::default())
    }
}

impl PdfWriter {
    pub fn new(page_size: PageSize) -> Self {
        Self { page_size }
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.page_size.dimensions_mm();
        (Mm(w_mm), Mm(h_mm))
    }

    /// Lines per page and characters per line for the current page size.
    fn layout(&self) -> (usize, usize) {
        let (page_w, page_h) = self.page_dimensions();
        let usable_width_mm = page_w.0 - 2.0 * MARGIN_MM;

        // Average Helvetica glyph width is roughly 0.50 * font_size in pt,
        // converted to mm (1pt = 0.3528mm).
        let avg_char_width_mm = 0.50 * FONT_SIZE_PT * 0.3528;
        let chars_per_line = (usable_width_mm / avg_char_width_mm) as usize;

        let usable_height_pt = page_h.into_pt().0 - 2.0 * Mm(MARGIN_MM).into_pt().0;
        let lines_per_page = (usable_height_pt / LINE_HEIGHT_PT) as usize;
        (lines_per_page.max(1), chars_per_line.max(1))
    }

    /// Create a PDF from plain text content.
    ///
    /// Helvetica 11pt, top-to-bottom flow. Long lines are wrapped at an
    /// estimated character width and pages break automatically.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub fn create_from_text(&self, text: &str) -> Result<Vec<u8>> {
        let (page_w, page_h) = self.page_dimensions();
        let (lines_per_page, chars_per_line) = self.layout();
        info!(page = ?self.page_size, "Creating text PDF");

        let margin_pt = Mm(MARGIN_MM).into_pt().0;
        let page_h_pt = page_h.into_pt().0;
        let wrapped_lines = wrap_text(text, chars_per_line);

        let mut pages: Vec<PdfPage> = wrapped_lines
            .chunks(lines_per_page)
            .map(|chunk| {
                let mut ops = Vec::with_capacity(chunk.len() * 5);
                for (line_idx, line) in chunk.iter().enumerate() {
                    let y_pt = page_h_pt - margin_pt - (line_idx as f32 * LINE_HEIGHT_PT);
                    ops.push(Op::StartTextSection);
                    ops.push(Op::SetTextCursor {
                        pos: Point {
                            x: Pt(margin_pt),
                            y: Pt(y_pt),
                        },
                    });
                    ops.push(Op::SetFontSizeBuiltinFont {
                        size: Pt(FONT_SIZE_PT),
                        font: BuiltinFont::Helvetica,
                    });
                    ops.push(Op::WriteTextBuiltinFont {
                        items: vec![TextItem::Text(line.clone())],
                        font: BuiltinFont::Helvetica,
                    });
                    ops.push(Op::EndTextSection);
                }
                PdfPage::new(page_w, page_h, ops)
            })
            .collect();

        if pages.is_empty() {
            pages.push(PdfPage::new(page_w, page_h, Vec::new()));
        }

        let mut doc = PdfDocument::new(PDF_TITLE);
        doc.with_pages(pages);
        debug!(
            total_lines = wrapped_lines.len(),
            pages = doc.pages.len(),
            "Text layout complete"
        );

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        Ok(doc.save(&PdfSaveOptions::default(), &mut warnings))
    }
}

// -- Text wrapping helper -----------------------------------------------------

/// Wrap a multi-line string so that no line exceeds `max_width` characters.
///
/// Splits on existing newlines first, then performs simple word-wrap within each
/// paragraph. Words longer than `max_width` are force-broken on character
/// boundaries.
pub(crate) fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    let mut result = Vec::new();

    for paragraph in text.lines() {
        let mut current_line = String::new();
        let mut current_len = 0usize;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if word_len > max_width {
                if !current_line.is_empty() {
                    result.push(std::mem::take(&mut current_line));
                }
                let chars: Vec<char> = word.chars().collect();
                let mut chunks = chars.chunks(max_width).peekable();
                while let Some(chunk) = chunks.next() {
                    let piece: String = chunk.iter().collect();
                    if chunks.peek().is_some() {
                        result.push(piece);
                    } else {
                        current_len = chunk.len();
                        current_line = piece;
                    }
                }
            } else if current_line.is_empty() {
                current_line.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= max_width {
                current_line.push(' ');
                current_line.push_str(word);
                current_len += 1 + word_len;
            } else {
                result.push(std::mem::replace(&mut current_line, word.to_string()));
                current_len = word_len;
            }
        }

        // Blank source lines stay blank in the output.
        result.push(current_line);
    }

    result
}
