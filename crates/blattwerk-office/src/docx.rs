// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DOCX handling — text extraction from `word/document.xml` and plain-text
// document authoring via docx-rs.

use std::io::{Cursor, Read};

use blattwerk_core::error::{BlattwerkError, Result};
use docx_rs::{Docx, Paragraph, Run};
use quick_xml::Reader as XmlReader;
use quick_xml::events::Event;
use tracing::{debug, instrument};

/// Extract the paragraph text of a DOCX document.
///
/// Reads `word/document.xml` out of the package and collects every `w:t` run,
/// emitting one output line per `w:p` paragraph. Formatting, tables, headers
/// and footers are ignored — this extraction feeds a plain-text PDF
/// rendition.
#[instrument(skip_all, fields(bytes_len = data.len()))]
pub fn extract_text(data: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|err| BlattwerkError::Office(format!("not a DOCX package: {err}")))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|err| BlattwerkError::Office(format!("no word/document.xml: {err}")))?
        .read_to_string(&mut xml)
        .map_err(|err| BlattwerkError::Office(format!("unreadable document part: {err}")))?;

    let text = collect_runs(&xml, b"w:t", b"w:p")?;
    debug!(chars = text.len(), "DOCX text extracted");
    Ok(text)
}

/// Build a DOCX from plain text, one paragraph per input line.
#[instrument(skip_all, fields(text_len = text.len()))]
pub fn from_text(text: &str) -> Result<Vec<u8>> {
    let mut docx = Docx::new();

    let mut wrote_any = false;
    for line in text.lines() {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)));
        wrote_any = true;
    }
    if !wrote_any {
        docx = docx.add_paragraph(Paragraph::new());
    }

    let mut cursor = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut cursor)
        .map_err(|err| BlattwerkError::Office(format!("failed to pack DOCX: {err}")))?;

    debug!(bytes = cursor.get_ref().len(), "DOCX generated");
    Ok(cursor.into_inner())
}

/// Collect the character content of every `run_tag` element, breaking lines
/// at each closing `paragraph_tag`. Shared between the DOCX and PPTX readers.
pub(crate) fn collect_runs(xml: &str, run_tag: &[u8], paragraph_tag: &[u8]) -> Result<String> {
    let mut reader = XmlReader::from_str(xml);
    let mut output = String::new();
    let mut in_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == run_tag => in_run = true,
            Ok(Event::End(e)) => {
                let name = e.name();
                if name.as_ref() == run_tag {
                    in_run = false;
                } else if name.as_ref() == paragraph_tag {
                    output.push('\n');
                }
            }
            Ok(Event::Text(t)) if in_run => {
                let fragment = t
                    .unescape()
                    .map_err(|err| BlattwerkError::Office(format!("bad XML text: {err}")))?;
                output.push_str(&fragment);
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(BlattwerkError::Office(format!("malformed XML: {err}")));
            }
            _ => {}
        }
    }

    // Drop the trailing newline the final paragraph produced.
    while output.ends_with('\n') {
        output.pop();
    }
    Ok(output)
}
