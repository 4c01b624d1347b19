// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open, inspect, merge, split, and rotate existing PDF documents
// using the `lopdf` crate.

use std::collections::BTreeMap;

use blattwerk_core::error::{BlattwerkError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, info, instrument};

/// Reads and manipulates existing PDF files.
///
/// Wraps `lopdf::Document` and provides the structural operations the service
/// exposes: page extraction, whole-document rotation, and multi-document
/// merging.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data)
            .map_err(|err| BlattwerkError::Pdf(format!("failed to load PDF: {err}")))?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    // -- Extraction -----------------------------------------------------------

    /// Extract a single page (0-indexed) into a standalone PDF.
    ///
    /// Returns the serialised bytes of the single-page document.
    #[instrument(skip(self), fields(page_index))]
    pub fn extract_page(&self, page_index: usize) -> Result<Vec<u8>> {
        let total = self.page_count();
        if page_index >= total {
            return Err(BlattwerkError::InvalidRequest(format!(
                "page index {page_index} out of range (document has {total} pages)"
            )));
        }

        // lopdf pages are keyed by 1-indexed page number; delete everything
        // except the requested page, then drop the now-unreferenced objects.
        let keep = page_index as u32 + 1;
        let delete: Vec<u32> = (1..=total as u32).filter(|n| *n != keep).collect();

        let mut doc = self.document.clone();
        doc.delete_pages(&delete);
        doc.prune_objects();

        let output = save_to_bytes(&mut doc, "extracted page")?;
        debug!(page_index, output_bytes = output.len(), "Page extracted");
        Ok(output)
    }

    // -- Rotation -------------------------------------------------------------

    /// Rotate every page by `degrees` (must be a multiple of 90).
    ///
    /// The rotation is added to each page's existing `/Rotate` value, modulo
    /// 360. Returns the full document as bytes.
    #[instrument(skip(self), fields(degrees))]
    pub fn rotate_all(&self, degrees: i32) -> Result<Vec<u8>> {
        if degrees % 90 != 0 {
            return Err(BlattwerkError::InvalidRequest(format!(
                "rotation must be a multiple of 90, got {degrees}"
            )));
        }

        let mut doc = self.document.clone();
        let page_ids: Vec<ObjectId> = doc.get_pages().values().copied().collect();

        for page_id in &page_ids {
            let existing = doc
                .get_object(*page_id)
                .ok()
                .and_then(|obj| obj.as_dict().ok())
                .and_then(|dict| dict.get(b"Rotate").ok())
                .and_then(|rotate| rotate.as_i64().ok())
                .unwrap_or(0);

            let updated = (existing + degrees as i64).rem_euclid(360);

            if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(*page_id) {
                dict.set("Rotate", updated);
            }
        }

        info!(pages = page_ids.len(), degrees, "Rotated all pages");
        save_to_bytes(&mut doc, "rotated document")
    }

    // -- Merging --------------------------------------------------------------

    /// Merge two or more PDFs into one document, pages in upload order.
    ///
    /// Objects from each input are renumbered into a shared id space, every
    /// page is re-parented under a single rebuilt `/Pages` node, and the
    /// result is compressed before serialisation.
    #[instrument(skip_all, fields(input_count = inputs.len()))]
    pub fn merge(inputs: &[Vec<u8>]) -> Result<Vec<u8>> {
        if inputs.len() < 2 {
            return Err(BlattwerkError::InvalidRequest(format!(
                "merge requires at least two documents, got {}",
                inputs.len()
            )));
        }

        let mut max_id = 1;
        let mut collected_pages: Vec<(ObjectId, Object)> = Vec::new();
        let mut collected_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

        for (index, bytes) in inputs.iter().enumerate() {
            let mut doc = Document::load_mem(bytes).map_err(|err| {
                BlattwerkError::Pdf(format!("failed to load input #{}: {err}", index + 1))
            })?;

            doc.renumber_objects_with(max_id);
            max_id = doc.max_id + 1;

            for (_, page_id) in doc.get_pages() {
                let page = doc.get_object(page_id).map_err(|err| {
                    BlattwerkError::Pdf(format!("unreadable page object {page_id:?}: {err}"))
                })?;
                collected_pages.push((page_id, page.to_owned()));
            }
            collected_objects.append(&mut doc.objects);
        }

        info!(
            documents = inputs.len(),
            total_pages = collected_pages.len(),
            "Merging PDFs"
        );

        // Keep one Catalog and one Pages node; everything else is carried over
        // verbatim. Page objects are inserted afterwards with their /Parent
        // patched to the unified Pages node.
        let mut merged = Document::with_version("1.5");
        let mut catalog: Option<(ObjectId, Dictionary)> = None;
        let mut pages_node: Option<(ObjectId, Dictionary)> = None;

        for (object_id, object) in collected_objects {
            match object.type_name().unwrap_or(b"") {
                b"Catalog" => {
                    if catalog.is_none()
                        && let Ok(dict) = object.as_dict()
                    {
                        catalog = Some((object_id, dict.clone()));
                    }
                }
                b"Pages" => {
                    if let Ok(dict) = object.as_dict() {
                        pages_node = Some(match pages_node.take() {
                            // Fold attributes of later Pages nodes under the
                            // first node's id, first node's entries winning,
                            // so inheritable keys (MediaBox, Resources) survive.
                            Some((first_id, first)) => {
                                let mut folded = dict.clone();
                                folded.extend(&first);
                                (first_id, folded)
                            }
                            None => (object_id, dict.clone()),
                        });
                    }
                }
                // Page objects are re-inserted below with a fixed /Parent.
                b"Page" => {}
                // Outlines refer into single source documents; drop them.
                b"Outlines" | b"Outline" => {}
                _ => {
                    merged.objects.insert(object_id, object);
                }
            }
        }

        let (catalog_id, mut catalog_dict) = catalog
            .ok_or_else(|| BlattwerkError::Pdf("no catalog found in any input".to_string()))?;
        let (pages_id, mut pages_dict) = pages_node
            .ok_or_else(|| BlattwerkError::Pdf("no page tree found in any input".to_string()))?;

        for (page_id, page) in &collected_pages {
            if let Ok(dict) = page.as_dict() {
                let mut dict = dict.clone();
                dict.set("Parent", pages_id);
                merged.objects.insert(*page_id, Object::Dictionary(dict));
            }
        }

        pages_dict.set("Count", collected_pages.len() as i64);
        pages_dict.set(
            "Kids",
            Object::Array(
                collected_pages
                    .iter()
                    .map(|(page_id, _)| Object::Reference(*page_id))
                    .collect(),
            ),
        );
        merged
            .objects
            .insert(pages_id, Object::Dictionary(pages_dict));

        catalog_dict.set("Pages", pages_id);
        catalog_dict.remove(b"Outlines");
        merged
            .objects
            .insert(catalog_id, Object::Dictionary(catalog_dict));

        merged.trailer.set("Root", catalog_id);
        merged.max_id = max_id;
        merged.renumber_objects();
        merged.compress();

        let output = save_to_bytes(&mut merged, "merged document")?;
        debug!(output_bytes = output.len(), "Merge complete");
        Ok(output)
    }
}

/// Serialise a document into a byte buffer.
pub(crate) fn save_to_bytes(doc: &mut Document, what: &str) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|err| BlattwerkError::Pdf(format!("failed to serialise {what}: {err}")))?;
    Ok(output)
}
