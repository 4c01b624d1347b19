// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Runtime settings for the conversion service.
///
/// Every field has an environment override so the service can be configured
/// without a config file (the usual deployment is a container with a handful
/// of env vars).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// TCP port the HTTP server binds on (`PORT`).
    pub port: u16,
    /// Directory for staged uploads and conversion artifacts (`TEMP_DIR`).
    pub temp_dir: PathBuf,
    /// Seconds an artifact may sit on disk before the sweep reclaims it
    /// (`RETENTION_SECS`).
    pub retention_secs: u64,
    /// Seconds between cleanup sweeps (`SWEEP_INTERVAL_SECS`).
    pub sweep_interval_secs: u64,
    /// Maximum accepted upload size in mebibytes (`MAX_UPLOAD_MB`).
    pub max_upload_mb: usize,
    /// Directory containing the OCR model files (`OCR_MODEL_DIR`).
    /// `None` means the ocrs default cache location.
    pub ocr_model_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 10000,
            temp_dir: PathBuf::from("temp"),
            retention_secs: 3600,
            sweep_interval_secs: 1800,
            max_upload_mb: 64,
            ocr_model_dir: None,
        }
    }
}

impl AppConfig {
    /// Build a config from the environment, falling back to defaults for
    /// anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parse("PORT").unwrap_or(defaults.port),
            temp_dir: std::env::var("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_dir),
            retention_secs: env_parse("RETENTION_SECS").unwrap_or(defaults.retention_secs),
            sweep_interval_secs: env_parse("SWEEP_INTERVAL_SECS")
                .unwrap_or(defaults.sweep_interval_secs),
            max_upload_mb: env_parse("MAX_UPLOAD_MB").unwrap_or(defaults.max_upload_mb),
            ocr_model_dir: std::env::var("OCR_MODEL_DIR").ok().map(PathBuf::from),
        }
    }

    /// Maximum accepted upload size in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
