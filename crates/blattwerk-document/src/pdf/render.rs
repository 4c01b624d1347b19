// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF rasterisation via pdfium.
//
// pdfium is bound dynamically at runtime: the system library is tried first,
// then a copy next to the executable. Binding failure is an operation error,
// not a startup failure — endpoints that never render keep working on hosts
// without libpdfium.

use blattwerk_core::error::{BlattwerkError, Result};
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, instrument};

/// Renders PDF pages to raster images.
///
/// Construction binds the pdfium library; keep the rasterizer around and
/// reuse it rather than rebinding per page.
pub struct PdfRasterizer {
    pdfium: Pdfium,
}

impl PdfRasterizer {
    /// Bind pdfium — system library first, then `./` next to the executable.
    pub fn new() -> Result<Self> {
        let bindings = Pdfium::bind_to_system_library()
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            })
            .map_err(|err| {
                BlattwerkError::Render(format!("failed to bind pdfium library: {err}"))
            })?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Number of pages in the document.
    pub fn page_count(&self, pdf: &[u8]) -> Result<u16> {
        let document = self.load(pdf)?;
        Ok(document.pages().len())
    }

    /// Render a single page (0-indexed) at the given scale factor
    /// (1.0 = 72 dpi nominal page size).
    #[instrument(skip(self, pdf), fields(bytes_len = pdf.len(), page_index, scale))]
    pub fn render_page(&self, pdf: &[u8], page_index: u16, scale: f32) -> Result<DynamicImage> {
        let document = self.load(pdf)?;
        let page = document.pages().get(page_index).map_err(|err| {
            BlattwerkError::Render(format!("page {page_index} not available: {err}"))
        })?;
        rasterise_page(&page, page_index, scale)
    }

    /// Render every page at the given scale factor, in page order.
    ///
    /// The document is parsed once and kept alive across all pages.
    #[instrument(skip(self, pdf), fields(bytes_len = pdf.len(), scale))]
    pub fn render_all(&self, pdf: &[u8], scale: f32) -> Result<Vec<DynamicImage>> {
        let document = self.load(pdf)?;
        let mut rendered = Vec::with_capacity(document.pages().len() as usize);

        for (index, page) in document.pages().iter().enumerate() {
            rendered.push(rasterise_page(&page, index as u16, scale)?);
        }

        debug!(pages = rendered.len(), "All pages rendered");
        Ok(rendered)
    }

    fn load<'a>(&'a self, pdf: &'a [u8]) -> Result<PdfDocument<'a>> {
        self.pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|err| BlattwerkError::Render(format!("failed to parse PDF: {err}")))
    }
}

/// Render one page to an RGBA image at `scale` times its nominal size.
fn rasterise_page(page: &PdfPage<'_>, index: u16, scale: f32) -> Result<DynamicImage> {
    let width = (page.width().value * scale) as i32;
    let height = (page.height().value * scale) as i32;

    let bitmap = page
        .render_with_config(
            &PdfRenderConfig::new()
                .set_target_width(width)
                .set_target_height(height),
        )
        .map_err(|err| BlattwerkError::Render(format!("failed to render page {index}: {err}")))?;

    let rgba = bitmap.as_rgba_bytes();
    let image = image::RgbaImage::from_raw(width as u32, height as u32, rgba)
        .map(DynamicImage::ImageRgba8)
        .ok_or_else(|| {
            BlattwerkError::Render(format!(
                "rendered buffer does not match {width}x{height} for page {index}"
            ))
        })?;

    debug!(width, height, "Page rendered");
    Ok(image)
}
