// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Blattwerk — web document converter.
//
// Entry point. Initialises logging, builds the state from the environment,
// starts the cleanup sweeper, and serves the HTTP API.

use std::time::Duration;

use blattwerk_core::AppConfig;
use blattwerk_server::{AppState, start_server, store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!(
        port = config.port,
        temp_dir = %config.temp_dir.display(),
        retention_secs = config.retention_secs,
        "Blattwerk starting"
    );

    let state = AppState::new(config)?;

    store::spawn_sweeper(
        state.store.clone(),
        Duration::from_secs(state.config.sweep_interval_secs),
        Duration::from_secs(state.config.retention_secs),
    );

    start_server(state).await?;
    Ok(())
}
