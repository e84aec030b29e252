//! Finger-counting preview pipeline: capture, classify, annotate, and serve.
//!
//! The module is split into focused submodules:
//! - `config`: environment-driven process configuration.
//! - `capture`: background worker driving camera reads and detection.
//! - `annotate`: overlay drawing and JPEG encoding.
//! - `store`: shared latest-wins frame slot.
//! - `server`: Actix Web endpoints including the MJPEG stream.
//! - `telemetry`: tracing and Prometheus bootstrap.
//! - `data`: the packet type passed between producer and consumers.

pub use config::AppConfig;

mod annotate;
mod capture;
mod config;
mod data;
mod server;
mod store;
mod telemetry;

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use anyhow::Result;
use tracing::{info, warn};

use capture::CaptureController;
use store::FrameStore;

/// Run the full application until Ctrl+C: optionally auto-start the capture
/// worker, serve HTTP, then shut both down cooperatively.
pub fn run(config: AppConfig) -> Result<()> {
    telemetry::init_tracing();
    let _ = telemetry::init_metrics_recorder();

    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_shutdown = shutdown.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        handler_shutdown.store(true, Ordering::SeqCst);
    }) {
        warn!("Failed to install Ctrl+C handler: {err}");
    }

    let store = FrameStore::new();
    let capture = Arc::new(CaptureController::new(config.clone(), store.clone()));

    if config.autostart {
        capture.start();
    } else {
        info!("capture autostart disabled; waiting for GET /start");
    }

    let server = server::spawn_server(config.port, store, capture.clone())?;
    info!(
        "preview available at http://127.0.0.1:{}/ (stream: /video_feed)",
        config.port
    );

    while !shutdown.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(200));
    }

    info!("shutting down");
    capture.stop();
    server.stop();
    Ok(())
}
