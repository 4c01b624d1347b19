// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP request handlers — one per conversion endpoint.
//
// The shape of every conversion handler is the same: collect the multipart
// form, run the library call on the blocking pool, stage the artifact in the
// temp store, stream it back with an attachment header. Errors become
// `{"error": ...}` JSON with 400 for request problems, 500 otherwise.

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Multipart, Path as UrlPath, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, error, warn};

use blattwerk_core::error::BlattwerkError;
use blattwerk_core::types::DocumentType;
use blattwerk_document::ocr::{self, OcrConfig};
use blattwerk_document::pdf::{compress as pdf_compress, security, watermark as pdf_watermark};
use blattwerk_document::{ImageProcessor, OcrEngine, PdfRasterizer, PdfReader, PdfWriter};

use crate::AppState;

/// JPEG quality for rendered page downloads.
const PDF2JPG_QUALITY: u8 = 85;

/// Tools with a dedicated endpoint; the catch-all bounces these back.
const SUPPORTED_TOOLS: &[&str] = &[
    "merge", "split", "compress", "rotate", "watermark", "protect", "unlock", "img2pdf",
    "pdf2jpg", "pdf2word", "word2pdf", "excel2pdf", "ppt2pdf", "ppt_gen", "ocr",
];

// ---------------------------------------------------------------------------
// Error and response plumbing
// ---------------------------------------------------------------------------

/// Standard error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Wrapper making [`BlattwerkError`] usable as an axum rejection.
pub struct ApiError(BlattwerkError);

impl From<BlattwerkError> for ApiError {
    fn from(err: BlattwerkError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            warn!(error = %self.0, "request rejected");
            StatusCode::BAD_REQUEST
        } else {
            error!(error = %self.0, "conversion failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult = Result<Response, ApiError>;

/// Run a CPU-bound conversion on the blocking pool.
async fn run_blocking<T, F>(job: F) -> Result<T, BlattwerkError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, BlattwerkError> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|err| BlattwerkError::Internal(format!("conversion task failed: {err}")))?
}

/// Stage the artifact, then stream it back as a binary attachment.
///
/// The file stays in the temp store after delivery; the sweep reclaims it.
async fn deliver(state: &AppState, bytes: Vec<u8>, doc_type: DocumentType) -> ApiResult {
    let path = state.store.write_artifact(&bytes, doc_type)?;
    let payload = tokio::fs::read(&path).await.map_err(BlattwerkError::from)?;

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("artifact{}", doc_type.extension()));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, doc_type.mime_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        payload,
    )
        .into_response())
}

// ---------------------------------------------------------------------------
// Multipart form collection
// ---------------------------------------------------------------------------

/// One uploaded file part.
pub struct Upload {
    pub field: String,
    pub bytes: Vec<u8>,
}

/// The collected multipart form: file parts plus plain text fields.
#[derive(Default)]
pub struct UploadForm {
    files: Vec<Upload>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// All file uploads posted under `name` (also accepts `name[]`).
    fn files(&self, name: &str) -> Vec<&Upload> {
        let bracketed = format!("{name}[]");
        self.files
            .iter()
            .filter(|upload| upload.field == name || upload.field == bracketed)
            .collect()
    }

    /// The single file upload posted under `name`.
    fn file(&self, name: &str) -> Result<&Upload, BlattwerkError> {
        self.files(name)
            .into_iter()
            .next()
            .ok_or_else(|| BlattwerkError::MissingUpload(name.to_string()))
    }

    /// A text field, or `default` when absent.
    fn text_or(&self, name: &str, default: &str) -> String {
        self.fields
            .get(name)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    /// A numeric text field, or `default` when absent. Unparseable input is
    /// a client error, not a silent default.
    fn number_or<T: std::str::FromStr>(&self, name: &str, default: T) -> Result<T, BlattwerkError> {
        match self.fields.get(name) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| {
                BlattwerkError::InvalidRequest(format!("field '{name}' is not a number: {raw}"))
            }),
        }
    }
}

/// Drain the multipart stream into an [`UploadForm`].
///
/// Parts carrying a filename are treated as uploads, everything else as text
/// fields. Each upload's digest is logged for traceability.
async fn collect_form(multipart: &mut Multipart) -> Result<UploadForm, BlattwerkError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        BlattwerkError::InvalidRequest(format!("malformed multipart body: {err}"))
    })? {
        let name = field.name().unwrap_or_default().to_string();

        if field.file_name().is_some() {
            let bytes = field
                .bytes()
                .await
                .map_err(|err| {
                    BlattwerkError::InvalidRequest(format!("unreadable upload '{name}': {err}"))
                })?
                .to_vec();

            let digest = hex::encode(Sha256::digest(&bytes));
            debug!(field = %name, bytes = bytes.len(), %digest, "upload received");

            form.files.push(Upload { field: name, bytes });
        } else {
            let value = field.text().await.map_err(|err| {
                BlattwerkError::InvalidRequest(format!("unreadable field '{name}': {err}"))
            })?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

// ---------------------------------------------------------------------------
// Service endpoints
// ---------------------------------------------------------------------------

/// Service index — the operations this deployment exposes.
pub async fn index() -> impl IntoResponse {
    Json(json!({
        "service": "blattwerk",
        "version": env!("CARGO_PKG_VERSION"),
        "operations": SUPPORTED_TOOLS,
    }))
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `POST /api/merge` — concatenate two or more PDFs, pages in upload order.
pub async fn merge(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult {
    let form = collect_form(&mut multipart).await?;
    let inputs: Vec<Vec<u8>> = form
        .files("files")
        .into_iter()
        .map(|upload| upload.bytes.clone())
        .collect();
    if inputs.is_empty() {
        return Err(BlattwerkError::MissingUpload("files".to_string()).into());
    }

    let merged = run_blocking(move || PdfReader::merge(&inputs)).await?;
    deliver(&state, merged, DocumentType::Pdf).await
}

/// `POST /api/split` — extract one page (`page`, 0-based, default 0).
pub async fn split(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult {
    let form = collect_form(&mut multipart).await?;
    let data = form.file("file")?.bytes.clone();
    let page: usize = form.number_or("page", 0)?;

    let extracted =
        run_blocking(move || PdfReader::from_bytes(&data)?.extract_page(page)).await?;
    deliver(&state, extracted, DocumentType::Pdf).await
}

/// `POST /api/compress` — recompress streams and prune unused objects.
pub async fn compress(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult {
    let form = collect_form(&mut multipart).await?;
    let data = form.file("file")?.bytes.clone();

    let compressed = run_blocking(move || pdf_compress::compress(&data)).await?;
    deliver(&state, compressed, DocumentType::Pdf).await
}

/// `POST /api/rotate` — rotate every page by `direction` degrees (default 90).
pub async fn rotate(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult {
    let form = collect_form(&mut multipart).await?;
    let data = form.file("file")?.bytes.clone();
    let direction: i32 = form.number_or("direction", 90)?;

    let rotated =
        run_blocking(move || PdfReader::from_bytes(&data)?.rotate_all(direction)).await?;
    deliver(&state, rotated, DocumentType::Pdf).await
}

/// `POST /api/watermark` — stamp `text` on every page.
pub async fn watermark(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult {
    let form = collect_form(&mut multipart).await?;
    let data = form.file("file")?.bytes.clone();
    let text = form.text_or("text", "CONFIDENTIAL");

    let stamped = run_blocking(move || pdf_watermark::stamp_text(&data, &text)).await?;
    deliver(&state, stamped, DocumentType::Pdf).await
}

/// `POST /api/protect` — encrypt with `password`.
pub async fn protect(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult {
    let form = collect_form(&mut multipart).await?;
    let data = form.file("file")?.bytes.clone();
    let password = form.text_or("password", "");

    let protected = run_blocking(move || security::protect(&data, &password)).await?;
    deliver(&state, protected, DocumentType::Pdf).await
}

/// `POST /api/unlock` — decrypt with `password`.
pub async fn unlock(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult {
    let form = collect_form(&mut multipart).await?;
    let data = form.file("file")?.bytes.clone();
    let password = form.text_or("password", "");

    let unlocked = run_blocking(move || security::unlock(&data, &password)).await?;
    deliver(&state, unlocked, DocumentType::Pdf).await
}

/// `POST /api/img2pdf` — one PDF page per uploaded image.
pub async fn img2pdf(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult {
    let form = collect_form(&mut multipart).await?;
    let images: Vec<Vec<u8>> = form
        .files("files")
        .into_iter()
        .map(|upload| upload.bytes.clone())
        .collect();
    if images.is_empty() {
        return Err(BlattwerkError::MissingUpload("files".to_string()).into());
    }

    let pdf = run_blocking(move || {
        PdfWriter::a4()
            .with_title("Image album")
            .create_from_images(&images)
    })
    .await?;
    deliver(&state, pdf, DocumentType::Pdf).await
}

/// `POST /api/pdf2jpg` — JPEG of the first page.
pub async fn pdf2jpg(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult {
    let form = collect_form(&mut multipart).await?;
    let data = form.file("file")?.bytes.clone();

    let jpeg = run_blocking(move || {
        let rasterizer = PdfRasterizer::new()?;
        let page = rasterizer.render_page(&data, 0, 1.0)?;
        ImageProcessor::from_dynamic(page).to_jpeg_bytes(PDF2JPG_QUALITY)
    })
    .await?;
    deliver(&state, jpeg, DocumentType::Jpeg).await
}

/// `POST /api/pdf2word` — DOCX of the PDF's extracted text.
pub async fn pdf2word(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult {
    let form = collect_form(&mut multipart).await?;
    let data = form.file("file")?.bytes.clone();

    let package = run_blocking(move || blattwerk_office::pdf_to_word(&data)).await?;
    deliver(&state, package, DocumentType::Docx).await
}

/// `POST /api/word2pdf` — PDF rendition of the DOCX's paragraph text.
pub async fn word2pdf(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult {
    let form = collect_form(&mut multipart).await?;
    let data = form.file("file")?.bytes.clone();

    let pdf = run_blocking(move || blattwerk_office::word_to_pdf(&data)).await?;
    deliver(&state, pdf, DocumentType::Pdf).await
}

/// `POST /api/excel2pdf` — PDF row dump of the first worksheet.
pub async fn excel2pdf(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult {
    let form = collect_form(&mut multipart).await?;
    let data = form.file("file")?.bytes.clone();

    let pdf = run_blocking(move || blattwerk_office::excel_to_pdf(&data)).await?;
    deliver(&state, pdf, DocumentType::Pdf).await
}

/// `POST /api/ppt2pdf` — PDF with one page per slide.
pub async fn ppt2pdf(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult {
    let form = collect_form(&mut multipart).await?;
    let data = form.file("file")?.bytes.clone();

    let pdf = run_blocking(move || blattwerk_office::ppt_to_pdf(&data)).await?;
    deliver(&state, pdf, DocumentType::Pdf).await
}

/// `POST /api/ppt_gen` — generate a one-slide deck from `topic` and `details`.
pub async fn ppt_gen(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult {
    let form = collect_form(&mut multipart).await?;
    let topic = form.text_or("topic", "Untitled presentation");
    let details = form.text_or("details", "");

    let deck = run_blocking(move || blattwerk_office::generate_deck(&topic, &details)).await?;
    deliver(&state, deck, DocumentType::Pptx).await
}

/// `POST /api/ocr` — plain-text recognition of every page.
///
/// Model loading dominates the request; the engine is built per request so a
/// deployment without models fails the endpoint, not the process.
pub async fn ocr(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult {
    let form = collect_form(&mut multipart).await?;
    let data = form.file("file")?.bytes.clone();
    let model_dir = state.config.ocr_model_dir.clone();

    let text = run_blocking(move || {
        let config = match &model_dir {
            Some(dir) => OcrConfig::from_dir(dir),
            None => OcrConfig::default(),
        };
        let engine = OcrEngine::new(config)?;
        let rasterizer = PdfRasterizer::new()?;
        ocr::pdf_to_text(&engine, &rasterizer, &data)
    })
    .await?;
    deliver(&state, text.into_bytes(), DocumentType::PlainText).await
}

/// Catch-all for `/api/{tool}` — known tools are bounced to their dedicated
/// endpoint, unknown ones get a placeholder acknowledgement.
pub async fn tool_placeholder(UrlPath(tool): UrlPath<String>) -> Response {
    if SUPPORTED_TOOLS.contains(&tool.as_str()) {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("'{tool}' has a dedicated endpoint at /api/{tool}"),
            }),
        )
            .into_response()
    } else {
        (
            StatusCode::OK,
            Json(json!({
                "message": format!("'{tool}' is not implemented on this server"),
            })),
        )
            .into_response()
    }
}
