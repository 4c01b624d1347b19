// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR (Optical Character Recognition) for uploaded PDFs.
//
// Text extraction uses the `ocrs` crate, a pure-Rust OCR engine backed by
// neural network models executed via `rten`. Pages are rasterised with
// pdfium first, then recognised one at a time.
//
// # Feature Gate
//
// This module is only available when the `ocr` feature is enabled (the
// server binary enables it).
//
// # Model Setup
//
// The engine needs two model files, `text-detection.rten` and
// `text-recognition.rten`, from the ocrs-models releases. Running `ocrs-cli`
// once downloads them into `~/.cache/ocrs/`, which is also the default
// location used here. Missing models surface as an OCR error at request
// time, never as a startup failure.

use std::path::{Path, PathBuf};

use blattwerk_core::error::{BlattwerkError, Result};
use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams};
use rten::Model;
use tracing::{debug, info, instrument};

use crate::image::processor::ImageProcessor;
use crate::pdf::render::PdfRasterizer;

/// Well-known filenames for the detection and recognition models.
const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Scale factor for rasterising pages before recognition (2.0 ≈ 144 dpi).
const OCR_RENDER_SCALE: f32 = 2.0;

/// Upper bound on the pixel width fed to the recogniser.
const OCR_MAX_DIMENSION: u32 = 2048;

/// Default directory for cached OCR model files.
///
/// Follows the XDG Base Directory spec: `$XDG_CACHE_HOME/ocrs`, falling back
/// to `~/.cache/ocrs` when `XDG_CACHE_HOME` is unset.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Configuration for constructing an [`OcrEngine`].
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Path to the text-detection model file (`.rten`).
    pub detection_model_path: PathBuf,
    /// Path to the text-recognition model file (`.rten`).
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    /// Config pointing at a directory expected to contain both model files.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<()> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(BlattwerkError::Ocr(format!(
                    "OCR model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// OCR engine — extracts text from rendered document pages.
///
/// Model loading is the expensive step; construct once and reuse across
/// pages. Debug builds of `ocrs`/`rten` are drastically slower than release
/// builds.
pub struct OcrEngine {
    engine: OcrsEngine,
}

impl OcrEngine {
    /// Load the models named by `config` and initialise the engine.
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: OcrConfig) -> Result<Self> {
        config.validate()?;

        info!("Loading OCR detection model");
        let detection_model = Model::load_file(&config.detection_model_path).map_err(|err| {
            BlattwerkError::Ocr(format!(
                "failed to load detection model from {}: {err}",
                config.detection_model_path.display()
            ))
        })?;

        info!("Loading OCR recognition model");
        let recognition_model =
            Model::load_file(&config.recognition_model_path).map_err(|err| {
                BlattwerkError::Ocr(format!(
                    "failed to load recognition model from {}: {err}",
                    config.recognition_model_path.display()
                ))
            })?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| BlattwerkError::Ocr(format!("failed to initialise OCR engine: {err}")))?;

        info!("OCR engine initialised");
        Ok(Self { engine })
    }

    /// Extract all text from one page image.
    ///
    /// Returns the recognised text with lines separated by newlines.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn recognize_text(&self, image: &DynamicImage) -> Result<String> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            BlattwerkError::Ocr(format!(
                "failed to create image source ({width}x{height}): {err}"
            ))
        })?;

        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| BlattwerkError::Ocr(format!("OCR preprocessing failed: {err}")))?;

        let text = self
            .engine
            .get_text(&input)
            .map_err(|err| BlattwerkError::Ocr(format!("OCR recognition failed: {err}")))?;

        debug!(
            line_count = text.lines().count(),
            char_count = text.len(),
            "Page recognised"
        );
        Ok(text)
    }
}

/// OCR every page of a PDF, joining page texts with a blank line.
///
/// Pages are rasterised at [`OCR_RENDER_SCALE`], grayscaled, and capped at
/// [`OCR_MAX_DIMENSION`] pixels before recognition.
#[instrument(skip_all, fields(bytes_len = pdf.len()))]
pub fn pdf_to_text(engine: &OcrEngine, rasterizer: &PdfRasterizer, pdf: &[u8]) -> Result<String> {
    let pages = rasterizer.render_all(pdf, OCR_RENDER_SCALE)?;
    info!(pages = pages.len(), "Running OCR over rendered pages");

    let mut texts = Vec::with_capacity(pages.len());
    for page in pages {
        let mut prepared = ImageProcessor::from_dynamic(page);
        if prepared.width() > OCR_MAX_DIMENSION || prepared.height() > OCR_MAX_DIMENSION {
            prepared = prepared.resize(OCR_MAX_DIMENSION, OCR_MAX_DIMENSION);
        }
        let prepared = prepared.grayscale().into_dynamic();
        texts.push(engine.recognize_text(&prepared)?);
    }

    Ok(texts.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_model_filenames() {
        let config = OcrConfig::default();
        assert!(
            config
                .detection_model_path
                .to_string_lossy()
                .ends_with(DETECTION_MODEL_FILENAME)
        );
        assert!(
            config
                .recognition_model_path
                .to_string_lossy()
                .ends_with(RECOGNITION_MODEL_FILENAME)
        );
    }

    #[test]
    fn config_from_dir() {
        let config = OcrConfig::from_dir("/srv/models");
        assert_eq!(
            config.detection_model_path,
            PathBuf::from("/srv/models/text-detection.rten")
        );
        assert_eq!(
            config.recognition_model_path,
            PathBuf::from("/srv/models/text-recognition.rten")
        );
    }

    #[test]
    fn validate_reports_missing_models() {
        let config = OcrConfig::from_dir("/nonexistent/ocr-models");
        assert!(matches!(
            config.validate(),
            Err(BlattwerkError::Ocr(_))
        ));
    }
}
