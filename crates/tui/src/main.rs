mod app;
mod forms;

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};

use gametracker_core::{
    api::ApiClient,
    config::{self, AppConfig},
    library::{Library, LibrarySync},
};
use tokio::sync::mpsc;
use tracing::warn;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let client = ApiClient::new(&config.api).context("failed to configure API client")?;
    let sync = LibrarySync::new(client);
    let library = Library::default();
    let startup_error = match sync.prepare(&library).await {
        Ok(()) => None,
        Err(err) => {
            warn!(?err, "Initial library load failed");
            Some(format!("Could not reach {}: {err:#}", sync.client().base_url()))
        }
    };

    let (sync_tx, sync_rx) = mpsc::channel(8);

    let mut app = app::GameTrackerApp::new(config, library, sync);
    app.attach_sync(sync_tx, sync_rx);
    if let Some(message) = startup_error {
        app.set_status(message);
    }
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("gametracker.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // The terminal belongs to the UI, so only the file layer is installed.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(std::sync::Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
