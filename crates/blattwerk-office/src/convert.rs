// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion entry points wiring the office-format readers and writers to
// the PDF text writer. Office→PDF conversions are text renditions: layout,
// images, and styling are not carried over.

use blattwerk_core::error::{BlattwerkError, Result};
use blattwerk_document::PdfWriter;
use tracing::{info, instrument};

use crate::{docx, pptx, xlsx};

/// Longest line emitted for a spreadsheet row; wider rows are cut so a single
/// row cannot dominate the page.
const MAX_ROW_CHARS: usize = 120;

/// Convert a DOCX upload to a PDF of its paragraph text.
#[instrument(skip_all, fields(bytes_len = data.len()))]
pub fn word_to_pdf(data: &[u8]) -> Result<Vec<u8>> {
    let text = docx::extract_text(data)?;
    info!(chars = text.len(), "DOCX text extracted, rendering PDF");
    PdfWriter::a4().with_title("Converted document").create_from_text(&text)
}

/// Convert an XLSX upload to a PDF row dump of its first worksheet.
///
/// One line per row, cells joined with ` | `, paginated by the writer.
#[instrument(skip_all, fields(bytes_len = data.len()))]
pub fn excel_to_pdf(data: &[u8]) -> Result<Vec<u8>> {
    let sheet = xlsx::first_sheet(data)?;
    info!(sheet = %sheet.name, rows = sheet.rows.len(), "Worksheet read, rendering PDF");

    let mut lines = String::new();
    lines.push_str(&sheet.name);
    lines.push('\n');
    lines.push('\n');
    for row in &sheet.rows {
        let joined = row.join(" | ");
        let mut line: String = joined.chars().take(MAX_ROW_CHARS).collect();
        if joined.chars().count() > MAX_ROW_CHARS {
            line.push('…');
        }
        lines.push_str(&line);
        lines.push('\n');
    }

    PdfWriter::letter()
        .with_title("Spreadsheet export")
        .create_from_text(&lines)
}

/// Convert a PPTX upload to a PDF, one page per slide.
#[instrument(skip_all, fields(bytes_len = data.len()))]
pub fn ppt_to_pdf(data: &[u8]) -> Result<Vec<u8>> {
    let slides = pptx::extract_slides(data)?;
    info!(slides = slides.len(), "Slides extracted, rendering PDF");

    let sections: Vec<String> = slides
        .iter()
        .enumerate()
        .map(|(index, text)| format!("Slide {}\n\n{}", index + 1, text))
        .collect();

    PdfWriter::letter()
        .with_title("Presentation export")
        .create_from_sections(&sections)
}

/// Convert a PDF upload to a DOCX of its extracted text.
///
/// Extraction uses pdf-extract; scanned PDFs without a text layer come out
/// empty (OCR is a separate endpoint).
#[instrument(skip_all, fields(bytes_len = data.len()))]
pub fn pdf_to_word(data: &[u8]) -> Result<Vec<u8>> {
    let text = pdf_extract::extract_text_from_mem(data)
        .map_err(|err| BlattwerkError::Office(format!("PDF text extraction failed: {err}")))?;
    info!(chars = text.len(), "PDF text extracted, building DOCX");
    docx::from_text(text.trim())
}

/// Generate a one-slide PPTX deck from a topic and detail text.
#[instrument(skip_all, fields(topic_len = topic.len()))]
pub fn generate_deck(topic: &str, details: &str) -> Result<Vec<u8>> {
    pptx::generate(topic, details)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_pdf(bytes: &[u8]) -> bool {
        bytes.starts_with(b"%PDF-")
    }

    #[test]
    fn word_to_pdf_renders_extracted_text() {
        let package = docx::from_text("alpha\nbeta").expect("build docx");
        let pdf = word_to_pdf(&package).expect("convert");
        assert!(is_pdf(&pdf));
        assert!(lopdf_page_count(&pdf) >= 1);
    }

    #[test]
    fn excel_to_pdf_renders_rows() {
        let workbook = xlsx::minimal_workbook(&[&["h1", "h2"], &["v1", "v2"]]);
        let pdf = excel_to_pdf(&workbook).expect("convert");
        assert!(is_pdf(&pdf));
    }

    #[test]
    fn ppt_to_pdf_gives_one_page_per_slide() {
        let deck = pptx::generate("Topic", "one\ntwo").expect("build deck");
        let pdf = ppt_to_pdf(&deck).expect("convert");
        assert_eq!(lopdf_page_count(&pdf), 1);
    }

    #[test]
    fn pdf_to_word_produces_a_package() {
        let pdf = PdfWriter::a4()
            .create_from_text("text to carry over")
            .expect("build pdf");
        let package = pdf_to_word(&pdf).expect("convert");
        assert_eq!(&package[..2], b"PK");
    }

    #[test]
    fn pdf_to_word_rejects_garbage() {
        assert!(pdf_to_word(b"not a pdf").is_err());
    }

    #[test]
    fn generated_deck_is_a_package() {
        let deck = generate_deck("Launch plan", "ship it").expect("generate");
        assert_eq!(&deck[..2], b"PK");
    }

    fn lopdf_page_count(bytes: &[u8]) -> usize {
        lopdf::Document::load_mem(bytes)
            .expect("reload pdf")
            .get_pages()
            .len()
    }
}
