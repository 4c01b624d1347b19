// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF compression — recompress content streams and drop unreferenced objects.

use blattwerk_core::error::{BlattwerkError, Result};
use lopdf::Document;
use tracing::{debug, instrument};

use crate::pdf::reader::save_to_bytes;

/// Recompress a PDF.
///
/// Parses the document, garbage-collects objects that nothing references,
/// and re-deflates every stream. Output size depends entirely on how the
/// input was produced — already-optimised files shrink little or not at all.
#[instrument(skip_all, fields(input_bytes = data.len()))]
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut doc = Document::load_mem(data)
        .map_err(|err| BlattwerkError::Pdf(format!("failed to load PDF: {err}")))?;

    let pruned = doc.prune_objects();
    doc.compress();

    let output = save_to_bytes(&mut doc, "compressed document")?;
    debug!(
        pruned_objects = pruned.len(),
        input_bytes = data.len(),
        output_bytes = output.len(),
        "Compression pass complete"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::reader::PdfReader;
    use crate::pdf::writer::PdfWriter;

    #[test]
    fn compressed_output_is_a_loadable_pdf() {
        let original = PdfWriter::a4()
            .create_from_text("compressible content\n".repeat(400).as_str())
            .expect("generate");

        let compressed = compress(&original).expect("compress");
        let reader = PdfReader::from_bytes(&compressed).expect("reload");
        assert_eq!(
            reader.page_count(),
            PdfReader::from_bytes(&original).unwrap().page_count()
        );
    }

    #[test]
    fn compress_rejects_non_pdf_input() {
        assert!(compress(b"definitely not a pdf").is_err());
    }
}
