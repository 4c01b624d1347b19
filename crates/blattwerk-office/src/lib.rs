// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// blattwerk-office — Office-format conversions for the Blattwerk converter.
//
// DOCX/XLSX/PPTX are OOXML zip packages; extraction reads the relevant XML
// parts directly (zip + quick-xml), generation goes through docx-rs for Word
// documents and a hand-assembled minimal package for presentations. The PDF
// side of every conversion is the blattwerk-document text writer.

pub mod convert;
pub mod docx;
pub mod pptx;
pub mod xlsx;

pub use convert::{excel_to_pdf, generate_deck, pdf_to_word, ppt_to_pdf, word_to_pdf};
