//! Actix Web surface: demo pages, the MJPEG stream, worker control, and
//! status/metrics endpoints.
//!
//! The server runs on a dedicated thread so the capture loop never shares a
//! runtime with Actix. Every `/video_feed` connection gets its own stream
//! generator reading the shared latest-frame slot.

use std::{sync::Arc, time::Duration};

use actix_web::{
    http::header,
    web::{self, Bytes},
    App, HttpResponse, HttpServer,
};
use anyhow::{Context, Result};
use async_stream::stream;
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::error;

use crate::{
    html,
    stream::{capture::CaptureController, store::FrameStore, telemetry},
};

/// Interval between multipart chunks, ~30 frames per second.
const STREAM_INTERVAL: Duration = Duration::from_millis(33);

/// Shared state backing HTTP handlers.
pub(crate) struct ServerState {
    pub(crate) store: FrameStore,
    pub(crate) capture: Arc<CaptureController>,
}

#[derive(Default)]
/// Handle for the server thread.
pub(crate) struct WebServer {
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl WebServer {
    /// Signal the server to stop and block until the thread exits.
    pub(crate) fn stop(self) {
        if let Some(tx) = self.shutdown {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle {
            let _ = handle.join();
        }
    }
}

/// Spawn the server thread and return a handle that can stop it.
pub(crate) fn spawn_server(
    port: u16,
    store: FrameStore,
    capture: Arc<CaptureController>,
) -> Result<WebServer> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let handle = std::thread::Builder::new()
        .name("fingercam-server".into())
        .spawn(move || {
            if let Err(err) = actix_web::rt::System::new().block_on(async move {
                let server = HttpServer::new(move || {
                    App::new()
                        .app_data(web::Data::new(ServerState {
                            store: store.clone(),
                            capture: capture.clone(),
                        }))
                        .route("/", web::get().to(index_route))
                        .route("/client", web::get().to(client_route))
                        .route(
                            "/static/js/client_side_implementation.js",
                            web::get().to(client_js_route),
                        )
                        .route("/video_feed", web::get().to(video_feed_handler))
                        .route("/start", web::get().to(start_handler))
                        .route("/stop", web::get().to(stop_handler))
                        .route("/status", web::get().to(status_handler))
                        .route("/metrics", web::get().to(metrics_handler))
                })
                .bind(("0.0.0.0", port))?
                .run();

                let srv_handle = server.handle();
                actix_web::rt::spawn(async move {
                    let _ = shutdown_rx.await;
                    srv_handle.stop(true).await;
                });

                server.await
            }) {
                error!("HTTP server error: {err}");
            }
        })
        .context("Failed to spawn server thread")?;
    Ok(WebServer {
        shutdown: Some(shutdown_tx),
        handle: Some(handle),
    })
}

/// Frame one JPEG as a multipart/x-mixed-replace segment.
fn multipart_chunk(jpeg: &[u8]) -> Bytes {
    let mut payload = Vec::with_capacity(jpeg.len() + 48);
    payload.extend_from_slice(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n");
    payload.extend_from_slice(jpeg);
    payload.extend_from_slice(b"\r\n");
    Bytes::from(payload)
}

/// Stream the MJPEG feed. Before the first frame is published the stream
/// waits silently; it never terminates on its own.
async fn video_feed_handler(state: web::Data<ServerState>) -> HttpResponse {
    let state = state.clone();
    let stream = stream! {
        let mut interval = actix_web::rt::time::interval(STREAM_INTERVAL);
        loop {
            interval.tick().await;
            if let Some(packet) = state.store.get_latest() {
                yield Ok::<Bytes, actix_web::Error>(multipart_chunk(&packet.jpeg));
            }
        }
    };

    HttpResponse::Ok()
        .insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .append_header(("Cache-Control", "no-cache"))
        .append_header(("Content-Type", "multipart/x-mixed-replace; boundary=frame"))
        .streaming(stream)
}

async fn index_route() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html::INDEX_HTML)
}

async fn client_route() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html::CLIENT_HTML)
}

async fn client_js_route() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/javascript")
        .body(html::CLIENT_SIDE_JS)
}

async fn start_handler(state: web::Data<ServerState>) -> HttpResponse {
    let body = if state.capture.start() {
        "capture started"
    } else {
        "capture already running"
    };
    HttpResponse::Ok().content_type("text/plain").body(body)
}

async fn stop_handler(state: web::Data<ServerState>) -> HttpResponse {
    let body = if state.capture.stop() {
        "capture stopped"
    } else {
        "capture not running"
    };
    HttpResponse::Ok().content_type("text/plain").body(body)
}

#[derive(Serialize)]
struct LatestFrame {
    frame_number: u64,
    timestamp_ms: i64,
    fps: f32,
    hand_detected: bool,
    finger_count: u8,
}

#[derive(Serialize)]
struct StatusResponse {
    capture_running: bool,
    latest: Option<LatestFrame>,
}

/// Most recent pipeline state as JSON.
async fn status_handler(state: web::Data<ServerState>) -> HttpResponse {
    let latest = state.store.get_latest().map(|packet| LatestFrame {
        frame_number: packet.frame_number,
        timestamp_ms: packet.timestamp_ms,
        fps: packet.fps,
        hand_detected: packet.hand_detected,
        finger_count: packet.finger_count,
    });
    HttpResponse::Ok().json(StatusResponse {
        capture_running: state.capture.is_running(),
        latest,
    })
}

async fn metrics_handler() -> HttpResponse {
    match telemetry::prometheus_handle() {
        Some(handle) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(handle.render()),
        None => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_starts_with_boundary_preamble() {
        let chunk = multipart_chunk(&[0xff, 0xd8, 0xff, 0xd9]);
        let preamble = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";
        assert_eq!(&chunk[..preamble.len()], preamble.as_slice());
    }

    #[test]
    fn chunk_ends_with_crlf_after_payload() {
        let jpeg = [1u8, 2, 3];
        let chunk = multipart_chunk(&jpeg);
        assert_eq!(&chunk[chunk.len() - 2..], b"\r\n".as_slice());
        let preamble_len = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n".len();
        assert_eq!(&chunk[preamble_len..chunk.len() - 2], jpeg.as_slice());
    }

    #[test]
    fn chunk_is_exactly_preamble_payload_trailer() {
        let jpeg = vec![9u8; 100];
        let chunk = multipart_chunk(&jpeg);
        let preamble_len = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n".len();
        assert_eq!(chunk.len(), preamble_len + jpeg.len() + 2);
    }
}
