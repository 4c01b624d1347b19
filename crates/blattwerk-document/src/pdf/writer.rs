// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — create new PDF documents from text or images using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use blattwerk_core::error::{BlattwerkError, Result};
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, RawImage,
    RawImageData, RawImageFormat, TextItem, XObjectTransform,
};
use tracing::{debug, info, instrument};

use crate::image::processor::ImageProcessor;

/// Body font size in points.
const FONT_SIZE_PT: f32 = 11.0;

/// Line spacing in points.
const LINE_HEIGHT_PT: f32 = 14.0;

/// Page margin in millimetres.
const MARGIN_MM: f32 = 20.0;

/// Nominal placement resolution for embedded images.
const IMAGE_DPI: f32 = 150.0;

/// Creates new PDF documents from text content or raster images.
pub struct PdfWriter {
    page_width: Mm,
    page_height: Mm,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl PdfWriter {
    /// Create a writer with an explicit page size.
    pub fn new(page_width: Mm, page_height: Mm) -> Self {
        Self {
            page_width,
            page_height,
            title: "Blattwerk Document".to_string(),
        }
    }

    /// A4 pages (210 x 297 mm).
    pub fn a4() -> Self {
        Self::new(Mm(210.0), Mm(297.0))
    }

    /// US Letter pages (215.9 x 279.4 mm).
    pub fn letter() -> Self {
        Self::new(Mm(215.9), Mm(279.4))
    }

    /// Set the title recorded in the document metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    // -- Text to PDF ----------------------------------------------------------

    /// Create a PDF from plain text.
    ///
    /// The text is laid out top-to-bottom in Helvetica, word-wrapped at an
    /// estimated character width, with automatic page breaks.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub fn create_from_text(&self, text: &str) -> Result<Vec<u8>> {
        info!(title = %self.title, "Creating text PDF");
        let pages = self.layout_text(text);
        self.finish(pages)
    }

    /// Create a PDF where each section starts on a fresh page.
    ///
    /// Sections longer than a page still break onto continuation pages.
    #[instrument(skip(self, sections), fields(section_count = sections.len()))]
    pub fn create_from_sections(&self, sections: &[String]) -> Result<Vec<u8>> {
        info!(
            title = %self.title,
            sections = sections.len(),
            "Creating sectioned text PDF"
        );

        let mut pages: Vec<PdfPage> = Vec::new();
        for section in sections {
            pages.extend(self.layout_text(section));
        }
        if pages.is_empty() {
            pages.push(PdfPage::new(self.page_width, self.page_height, Vec::new()));
        }
        self.finish(pages)
    }

    // -- Images to PDF --------------------------------------------------------

    /// Create a PDF with one page per input image.
    ///
    /// Each image is scaled to fit within the page margins, centred, aspect
    /// ratio preserved, never upscaled.
    #[instrument(skip(self, images), fields(image_count = images.len()))]
    pub fn create_from_images(&self, images: &[Vec<u8>]) -> Result<Vec<u8>> {
        if images.is_empty() {
            return Err(BlattwerkError::InvalidRequest(
                "at least one image is required".to_string(),
            ));
        }

        info!(title = %self.title, images = images.len(), "Creating image PDF");

        let mut doc = PdfDocument::new(&self.title);
        let mut pages = Vec::with_capacity(images.len());

        for (index, bytes) in images.iter().enumerate() {
            let decoded = ImageProcessor::from_bytes(bytes)
                .map_err(|err| {
                    BlattwerkError::Image(format!("failed to decode image #{}: {err}", index + 1))
                })?
                .into_dynamic();

            let img_width = decoded.width() as usize;
            let img_height = decoded.height() as usize;
            let rgb = decoded.to_rgb8();

            let raw = RawImage {
                pixels: RawImageData::U8(rgb.into_raw()),
                width: img_width,
                height: img_height,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            pages.push(self.image_page(xobject_id, img_width, img_height));
        }

        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        Ok(doc.save(&PdfSaveOptions::default(), &mut warnings))
    }

    // -- Layout helpers -------------------------------------------------------

    /// Lay out a text block into one or more pages of operations.
    fn layout_text(&self, text: &str) -> Vec<PdfPage> {
        let margin_pt = Mm(MARGIN_MM).into_pt().0;
        let page_h_pt = self.page_height.into_pt().0;
        let usable_width_mm = self.page_width.0 - 2.0 * MARGIN_MM;

        // Approximate characters per line for Helvetica: average glyph width
        // is roughly 0.50 * font size in pt (1 pt = 0.3528 mm).
        let avg_char_width_mm = 0.50 * FONT_SIZE_PT * 0.3528;
        let max_chars_per_line = (usable_width_mm / avg_char_width_mm) as usize;

        let usable_height_pt = page_h_pt - 2.0 * margin_pt;
        let lines_per_page = (usable_height_pt / LINE_HEIGHT_PT).max(1.0) as usize;

        let wrapped = wrap_text(text, max_chars_per_line);
        let mut pages = Vec::new();

        for chunk in wrapped.chunks(lines_per_page.max(1)) {
            let mut ops: Vec<Op> = Vec::with_capacity(chunk.len() * 5);

            for (line_idx, line) in chunk.iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
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

            pages.push(PdfPage::new(self.page_width, self.page_height, ops));
        }

        // An empty section still occupies one blank page.
        if pages.is_empty() {
            pages.push(PdfPage::new(self.page_width, self.page_height, Vec::new()));
        }

        debug!(
            lines = wrapped.len(),
            pages = pages.len(),
            "Text layout complete"
        );
        pages
    }

    /// Build the page that displays one embedded image.
    fn image_page(&self, xobject_id: printpdf::XObjectId, width: usize, height: usize) -> PdfPage {
        let image_margin_mm: f32 = 15.0;
        let usable_w_pt = Mm(self.page_width.0 - 2.0 * image_margin_mm).into_pt().0;
        let usable_h_pt = Mm(self.page_height.0 - 2.0 * image_margin_mm).into_pt().0;

        let img_w_pt = width as f32 / IMAGE_DPI * 72.0;
        let img_h_pt = height as f32 / IMAGE_DPI * 72.0;

        // Scale to fit while preserving aspect ratio; never upscale.
        let scale = (usable_w_pt / img_w_pt)
            .min(usable_h_pt / img_h_pt)
            .min(1.0);

        let rendered_w_pt = img_w_pt * scale;
        let rendered_h_pt = img_h_pt * scale;

        let margin_pt = Mm(image_margin_mm).into_pt().0;
        let x_offset = margin_pt + (usable_w_pt - rendered_w_pt) / 2.0;
        let y_offset = margin_pt + (usable_h_pt - rendered_h_pt) / 2.0;

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(x_offset)),
                translate_y: Some(Pt(y_offset)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_DPI),
                rotate: None,
            },
        }];

        PdfPage::new(self.page_width, self.page_height, ops)
    }

    /// Attach pages and serialise.
    fn finish(&self, pages: Vec<PdfPage>) -> Result<Vec<u8>> {
        let mut doc = PdfDocument::new(&self.title);
        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        Ok(doc.save(&PdfSaveOptions::default(), &mut warnings))
    }
}

// -- Text wrapping helper -----------------------------------------------------

/// Wrap a multi-line string so that no line exceeds `max_width` characters.
///
/// Splits on existing newlines first, then word-wraps each paragraph. Words
/// longer than `max_width` are force-broken.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    let mut result = Vec::new();

    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            result.push(String::new());
            continue;
        }

        let mut current = String::with_capacity(max_width);
        for word in words {
            if word.len() > max_width {
                if !current.is_empty() {
                    result.push(std::mem::take(&mut current));
                }
                let mut remaining = word;
                while remaining.len() > max_width {
                    let (chunk, rest) = remaining.split_at(max_width);
                    result.push(chunk.to_string());
                    remaining = rest;
                }
                current.push_str(remaining);
            } else if current.is_empty() {
                current.push_str(word);
            } else if current.len() + 1 + word.len() <= max_width {
                current.push(' ');
                current.push_str(word);
            } else {
                result.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        if !current.is_empty() {
            result.push(current);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encode a tiny solid-colour PNG in memory.
    fn tiny_png() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(8, 8, image::Rgb([120, 40, 200]));
        let mut buffer = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, image::ImageFormat::Png)
            .expect("encode png");
        buffer.into_inner()
    }

    #[test]
    fn text_pdf_has_header_and_loads() {
        let bytes = PdfWriter::a4()
            .create_from_text("hello world")
            .expect("create");
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(lopdf::Document::load_mem(&bytes).is_ok());
    }

    #[test]
    fn long_text_breaks_onto_multiple_pages() {
        let text = "a line of text\n".repeat(300);
        let bytes = PdfWriter::a4().create_from_text(&text).expect("create");
        let doc = lopdf::Document::load_mem(&bytes).expect("reload");
        assert!(doc.get_pages().len() > 1);
    }

    #[test]
    fn empty_text_still_yields_one_page() {
        let bytes = PdfWriter::a4().create_from_text("").expect("create");
        let doc = lopdf::Document::load_mem(&bytes).expect("reload");
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn sections_start_on_separate_pages() {
        let sections = vec!["first".to_string(), "second".to_string()];
        let bytes = PdfWriter::letter()
            .create_from_sections(&sections)
            .expect("create");
        let doc = lopdf::Document::load_mem(&bytes).expect("reload");
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn one_page_per_image() {
        let images = vec![tiny_png(), tiny_png(), tiny_png()];
        let bytes = PdfWriter::a4()
            .create_from_images(&images)
            .expect("create");
        let doc = lopdf::Document::load_mem(&bytes).expect("reload");
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn images_require_at_least_one_input() {
        let result = PdfWriter::a4().create_from_images(&[]);
        assert!(result.is_err());
    }

    #[test]
    fn undecodable_image_is_reported() {
        let result = PdfWriter::a4().create_from_images(&[b"not an image".to_vec()]);
        assert!(matches!(result, Err(BlattwerkError::Image(_))));
    }

    #[test]
    fn wrap_breaks_long_words() {
        let wrapped = wrap_text("abcdefghij", 4);
        assert_eq!(wrapped, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn wrap_preserves_blank_lines() {
        let wrapped = wrap_text("one\n\ntwo", 80);
        assert_eq!(wrapped, vec!["one", "", "two"]);
    }
}
