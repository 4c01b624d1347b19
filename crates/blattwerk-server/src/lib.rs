// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP API for the Blattwerk document converter.
//
// Every conversion endpoint takes a multipart upload, runs one library-backed
// operation on the blocking pool, stages the result in the temp store, and
// streams it back as an attachment.

pub mod handlers;
pub mod store;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use blattwerk_core::AppConfig;
use blattwerk_core::error::Result;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::store::TempStore;

/// Server state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<TempStore>,
}

impl AppState {
    /// Create the state, opening the temp store named by the config.
    pub fn new(config: AppConfig) -> Result<Self> {
        let store = TempStore::new(&config.temp_dir)?;
        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
        })
    }
}

/// Build the API router with all endpoints and middleware.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes();

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        // PDF structure
        .route("/api/merge", post(handlers::merge))
        .route("/api/split", post(handlers::split))
        .route("/api/compress", post(handlers::compress))
        .route("/api/rotate", post(handlers::rotate))
        .route("/api/watermark", post(handlers::watermark))
        // Password protection
        .route("/api/protect", post(handlers::protect))
        .route("/api/unlock", post(handlers::unlock))
        // Image and render conversions
        .route("/api/img2pdf", post(handlers::img2pdf))
        .route("/api/pdf2jpg", post(handlers::pdf2jpg))
        // Office conversions
        .route("/api/pdf2word", post(handlers::pdf2word))
        .route("/api/word2pdf", post(handlers::word2pdf))
        .route("/api/excel2pdf", post(handlers::excel2pdf))
        .route("/api/ppt2pdf", post(handlers::ppt2pdf))
        .route("/api/ppt_gen", post(handlers::ppt_gen))
        // OCR
        .route("/api/ocr", post(handlers::ocr))
        // Catch-all placeholder for tools without a dedicated endpoint
        .route("/api/{tool}", post(handlers::tool_placeholder))
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn start_server(state: AppState) -> std::io::Result<()> {
    let addr = format!("0.0.0.0:{}", state.config.port);
    tracing::info!(%addr, "starting HTTP server");

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await
}
