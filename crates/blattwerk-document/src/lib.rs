// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// blattwerk-document — Document processing for the Blattwerk converter.
//
// Provides PDF operations (merge, split, rotate, compress, watermark,
// password protection, page rendering), image processing (decode, resize,
// JPEG/PNG encoding), PDF generation from text and images, and OCR.

pub mod image;
pub mod pdf;

#[cfg(feature = "ocr")]
pub mod ocr;

// Re-export the primary structs so callers can use `blattwerk_document::PdfReader` etc.
pub use image::processor::ImageProcessor;
pub use pdf::reader::PdfReader;
pub use pdf::render::PdfRasterizer;
pub use pdf::writer::PdfWriter;

#[cfg(feature = "ocr")]
pub use ocr::OcrEngine;
