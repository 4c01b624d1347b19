// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Password protection — encrypt and decrypt PDFs via lopdf's encryption
// support. The user and owner password are set to the same value, matching
// the upstream service behaviour; 128-bit keys throughout.

use blattwerk_core::error::{BlattwerkError, Result};
use lopdf::Document;
use lopdf::encryption::{EncryptionState, EncryptionVersion, Permissions};
use tracing::{info, instrument};

use crate::pdf::reader::save_to_bytes;

/// Encrypt a PDF with the given password.
///
/// The password is applied as both user and owner password with full
/// permissions — the service offers password protection, not permission
/// management.
#[instrument(skip_all, fields(bytes_len = data.len()))]
pub fn protect(data: &[u8], password: &str) -> Result<Vec<u8>> {
    if password.is_empty() {
        return Err(BlattwerkError::InvalidRequest(
            "password must not be empty".to_string(),
        ));
    }

    let mut doc = Document::load_mem(data)
        .map_err(|err| BlattwerkError::Pdf(format!("failed to load PDF: {err}")))?;

    if doc.is_encrypted() {
        return Err(BlattwerkError::Encryption(
            "document is already password-protected".to_string(),
        ));
    }

    let state = {
        let version = EncryptionVersion::V2 {
            document: &doc,
            owner_password: password,
            user_password: password,
            key_length: 128,
            permissions: Permissions::all(),
        };
        EncryptionState::try_from(version).map_err(|err| {
            BlattwerkError::Encryption(format!("failed to derive encryption keys: {err}"))
        })?
    };

    doc.encrypt(&state)
        .map_err(|err| BlattwerkError::Encryption(format!("failed to encrypt: {err}")))?;

    info!("Document encrypted");
    save_to_bytes(&mut doc, "protected document")
}

/// Decrypt a password-protected PDF.
///
/// A wrong password surfaces as [`BlattwerkError::Decryption`]; callers treat
/// that as a client error.
#[instrument(skip_all, fields(bytes_len = data.len()))]
pub fn unlock(data: &[u8], password: &str) -> Result<Vec<u8>> {
    let mut doc = Document::load_mem(data)
        .map_err(|err| BlattwerkError::Pdf(format!("failed to load PDF: {err}")))?;

    if !doc.is_encrypted() {
        return Err(BlattwerkError::InvalidRequest(
            "document is not password-protected".to_string(),
        ));
    }

    doc.decrypt(password).map_err(|err| {
        BlattwerkError::Decryption(format!("wrong password or unsupported encryption: {err}"))
    })?;

    // decrypt() strips the /Encrypt dictionary; make sure nothing stale is
    // left behind before re-serialising.
    doc.trailer.remove(b"Encrypt");

    info!("Document decrypted");
    save_to_bytes(&mut doc, "unlocked document")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::reader::PdfReader;
    use crate::pdf::writer::PdfWriter;

    fn sample_pdf() -> Vec<u8> {
        PdfWriter::a4()
            .create_from_text("secret contents")
            .expect("generate sample PDF")
    }

    #[test]
    fn protect_marks_document_encrypted() {
        let protected = protect(&sample_pdf(), "hunter2").expect("protect");
        let doc = Document::load_mem(&protected).expect("reload");
        assert!(doc.is_encrypted());
    }

    #[test]
    fn protect_requires_a_password() {
        let result = protect(&sample_pdf(), "");
        assert!(matches!(result, Err(BlattwerkError::InvalidRequest(_))));
    }

    #[test]
    fn roundtrip_protect_then_unlock() {
        let original = sample_pdf();
        let pages = PdfReader::from_bytes(&original).unwrap().page_count();

        let protected = protect(&original, "hunter2").expect("protect");
        let unlocked = unlock(&protected, "hunter2").expect("unlock");

        let doc = Document::load_mem(&unlocked).expect("reload");
        assert!(!doc.is_encrypted());
        assert_eq!(doc.get_pages().len(), pages);
    }

    #[test]
    fn unlock_with_wrong_password_fails() {
        let protected = protect(&sample_pdf(), "correct").expect("protect");
        let result = unlock(&protected, "incorrect");
        assert!(matches!(result, Err(BlattwerkError::Decryption(_))));
    }

    #[test]
    fn unlock_rejects_unencrypted_documents() {
        let result = unlock(&sample_pdf(), "whatever");
        assert!(matches!(result, Err(BlattwerkError::InvalidRequest(_))));
    }
}
