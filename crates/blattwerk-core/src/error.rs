// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Blattwerk.

use thiserror::Error;

/// Top-level error type for all Blattwerk operations.
#[derive(Debug, Error)]
pub enum BlattwerkError {
    // -- Request errors --
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("missing upload field: {0}")]
    MissingUpload(String),

    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("page rendering failed: {0}")]
    Render(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("office conversion failed: {0}")]
    Office(String),

    // -- Password protection --
    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    // -- Ambient --
    #[error("internal error: {0}")]
    Internal(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BlattwerkError {
    /// Whether the failure originates in the client's request rather than in
    /// the conversion itself. Drives the HTTP status at the API boundary.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_)
                | Self::MissingUpload(_)
                | Self::UnsupportedDocument(_)
                | Self::Decryption(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BlattwerkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_errors_are_client_errors() {
        assert!(BlattwerkError::MissingUpload("file".into()).is_client_error());
        assert!(BlattwerkError::InvalidRequest("page out of range".into()).is_client_error());
        assert!(BlattwerkError::Decryption("wrong password".into()).is_client_error());
    }

    #[test]
    fn operation_errors_are_server_errors() {
        assert!(!BlattwerkError::Pdf("truncated xref".into()).is_client_error());
        assert!(!BlattwerkError::Ocr("models missing".into()).is_client_error());
    }
}
