// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Watermarking — stamp a text string onto every page of an existing PDF.
//
// The stamp is appended as an extra content stream per page, drawn in light
// gray at a 45 degree angle, and a shared Helvetica font object is registered
// in each page's resource dictionary under a private key.

use blattwerk_core::error::{BlattwerkError, Result};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use tracing::{info, instrument};

use crate::pdf::reader::save_to_bytes;

/// Resource key under which the stamp font is registered.
///
/// Deliberately unusual so it cannot shadow a font the document already uses.
const STAMP_FONT_KEY: &str = "BwStampF";

/// Font size of the stamp text in points.
const STAMP_FONT_SIZE: i64 = 50;

/// Gray level of the stamp (0 = black, 1 = white).
const STAMP_GRAY: f32 = 0.85;

/// cos(45°) = sin(45°), the rotation coefficients of the text matrix.
const DIAGONAL: f32 = 0.7071;

/// Stamp `text` diagonally onto every page of the document.
#[instrument(skip(data), fields(bytes_len = data.len(), text))]
pub fn stamp_text(data: &[u8], text: &str) -> Result<Vec<u8>> {
    if text.trim().is_empty() {
        return Err(BlattwerkError::InvalidRequest(
            "watermark text must not be empty".to_string(),
        ));
    }

    let mut doc = Document::load_mem(data)
        .map_err(|err| BlattwerkError::Pdf(format!("failed to load PDF: {err}")))?;

    // One font object shared by every page's stamp.
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let page_ids: Vec<ObjectId> = doc.get_pages().values().copied().collect();
    if page_ids.is_empty() {
        return Err(BlattwerkError::Pdf("document has no pages".to_string()));
    }

    for page_id in &page_ids {
        let stream_id = doc.add_object(stamp_stream(text)?);
        register_stamp_font(&mut doc, *page_id, font_id)?;
        append_content(&mut doc, *page_id, stream_id)?;
    }

    info!(pages = page_ids.len(), "Watermark applied");
    save_to_bytes(&mut doc, "watermarked document")
}

/// Build the content stream that draws one stamp.
fn stamp_stream(text: &str) -> Result<Object> {
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("g", vec![STAMP_GRAY.into()]),
            Operation::new(
                "Tf",
                vec![STAMP_FONT_KEY.into(), STAMP_FONT_SIZE.into()],
            ),
            // Rotate 45° anticlockwise and translate into the lower page area,
            // so the text runs diagonally up the sheet.
            Operation::new(
                "Tm",
                vec![
                    DIAGONAL.into(),
                    DIAGONAL.into(),
                    (-DIAGONAL).into(),
                    DIAGONAL.into(),
                    96_i64.into(),
                    160_i64.into(),
                ],
            ),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ],
    };

    let encoded = content
        .encode()
        .map_err(|err| BlattwerkError::Pdf(format!("failed to encode stamp stream: {err}")))?;

    Ok(Object::Stream(Stream::new(dictionary! {}, encoded)))
}

/// Make the stamp font reachable from the page's `/Resources/Font` dictionary.
///
/// Resources (and the nested Font dictionary) may live inline on the page, be
/// indirect references, or be absent entirely (inherited from the page tree);
/// all three shapes are handled.
fn register_stamp_font(doc: &mut Document, page_id: ObjectId, font_id: ObjectId) -> Result<()> {
    // Locate the resources dictionary, noting whether it is indirect.
    let resources_ref = {
        let page = doc
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(|err| BlattwerkError::Pdf(format!("unreadable page {page_id:?}: {err}")))?;
        match page.get(b"Resources") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        }
    };

    match resources_ref {
        Some(resources_id) => {
            let font_dict_ref = {
                let resources = doc
                    .get_object(resources_id)
                    .and_then(Object::as_dict)
                    .map_err(|err| {
                        BlattwerkError::Pdf(format!("unreadable resources: {err}"))
                    })?;
                match resources.get(b"Font") {
                    Ok(Object::Reference(id)) => Some(*id),
                    _ => None,
                }
            };

            match font_dict_ref {
                Some(fonts_id) => {
                    if let Ok(Object::Dictionary(fonts)) = doc.get_object_mut(fonts_id) {
                        fonts.set(STAMP_FONT_KEY, font_id);
                    }
                }
                None => {
                    if let Ok(Object::Dictionary(resources)) = doc.get_object_mut(resources_id) {
                        set_font_entry(resources, font_id);
                    }
                }
            }
        }
        None => {
            if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
                let inline = matches!(page.get(b"Resources"), Ok(Object::Dictionary(_)));
                if inline {
                    if let Ok(Object::Dictionary(resources)) = page.get_mut(b"Resources") {
                        set_font_entry(resources, font_id);
                    }
                } else {
                    // No resources at all — create the minimal chain.
                    page.set(
                        "Resources",
                        dictionary! {
                            "Font" => dictionary! { STAMP_FONT_KEY => font_id },
                        },
                    );
                }
            }
        }
    }

    Ok(())
}

/// Insert the stamp font into an inline resources dictionary.
fn set_font_entry(resources: &mut lopdf::Dictionary, font_id: ObjectId) {
    let has_font_dict = matches!(resources.get(b"Font"), Ok(Object::Dictionary(_)));
    if has_font_dict {
        if let Ok(Object::Dictionary(fonts)) = resources.get_mut(b"Font") {
            fonts.set(STAMP_FONT_KEY, font_id);
        }
    } else {
        resources.set("Font", dictionary! { STAMP_FONT_KEY => font_id });
    }
}

/// Append the stamp stream to the page's `/Contents`.
///
/// `/Contents` may be a single stream reference, an array of references, or
/// missing on degenerate pages.
fn append_content(doc: &mut Document, page_id: ObjectId, stream_id: ObjectId) -> Result<()> {
    enum Shape {
        Array,
        Single(ObjectId),
        Missing,
    }

    let shape = {
        let page = doc
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(|err| BlattwerkError::Pdf(format!("unreadable page {page_id:?}: {err}")))?;
        match page.get(b"Contents") {
            Ok(Object::Array(_)) => Shape::Array,
            Ok(Object::Reference(existing)) => Shape::Single(*existing),
            _ => Shape::Missing,
        }
    };

    if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
        match shape {
            Shape::Array => {
                if let Ok(Object::Array(streams)) = page.get_mut(b"Contents") {
                    streams.push(Object::Reference(stream_id));
                }
            }
            Shape::Single(existing) => page.set(
                "Contents",
                Object::Array(vec![
                    Object::Reference(existing),
                    Object::Reference(stream_id),
                ]),
            ),
            Shape::Missing => page.set("Contents", Object::Reference(stream_id)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::reader::PdfReader;
    use crate::pdf::writer::PdfWriter;

    fn sample_pdf() -> Vec<u8> {
        PdfWriter::a4()
            .create_from_text("body text\n".repeat(300).as_str())
            .expect("generate sample PDF")
    }

    #[test]
    fn stamped_document_still_loads_with_same_page_count() {
        let original = sample_pdf();
        let pages_before = PdfReader::from_bytes(&original).unwrap().page_count();

        let stamped = stamp_text(&original, "CONFIDENTIAL").expect("stamp");
        let pages_after = PdfReader::from_bytes(&stamped).unwrap().page_count();
        assert_eq!(pages_before, pages_after);
    }

    #[test]
    fn every_page_gains_a_content_stream() {
        let stamped = stamp_text(&sample_pdf(), "DRAFT").expect("stamp");
        let doc = Document::load_mem(&stamped).expect("reload");

        for (_, page_id) in doc.get_pages() {
            let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
            match page.get(b"Contents").unwrap() {
                // Original single stream plus the stamp.
                Object::Array(streams) => assert!(streams.len() >= 2),
                other => panic!("expected a contents array, got {other:?}"),
            }
        }
    }

    #[test]
    fn empty_watermark_text_is_rejected() {
        let result = stamp_text(&sample_pdf(), "   ");
        assert!(matches!(result, Err(BlattwerkError::InvalidRequest(_))));
    }
}
