//! Background capture worker: camera → landmark model → overlay → publish.
//!
//! The worker runs on its own thread and owns the camera handle and the
//! detector for its whole lifetime. Stopping is cooperative: a token is
//! polled once per loop iteration, so the worker halts only after the
//! in-flight camera read returns. The camera subprocess is released on
//! every exit path through `Drop`.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread,
    time::{Duration, Instant},
};

use chrono::Utc;
use tracing::{debug, error, info, warn};
use video_ingest::{FfmpegCamera, FrameSource};

use crate::stream::{
    annotate::{annotate_and_encode, bgr_to_rgb, placeholder_jpeg},
    config::AppConfig,
    data::FramePacket,
    store::FrameStore,
};
use hand_core::{DetectorConfig, HandDetector, NullDetector, SidecarDetector};

/// Cadence of the synthetic placeholder stream, matching the viewer-facing
/// ~30 fps of the MJPEG generator.
const PLACEHOLDER_INTERVAL: Duration = Duration::from_millis(33);

/// Cancellation token shared between the controller and the worker thread.
#[derive(Clone, Default)]
pub(crate) struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    pub(crate) fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

struct CaptureHandle {
    token: StopToken,
    thread: thread::JoinHandle<()>,
}

/// Owns the optional background worker and serializes start/stop requests
/// from HTTP handlers and process shutdown.
pub(crate) struct CaptureController {
    config: AppConfig,
    store: FrameStore,
    worker: Mutex<Option<CaptureHandle>>,
}

impl CaptureController {
    pub(crate) fn new(config: AppConfig, store: FrameStore) -> Self {
        Self {
            config,
            store,
            worker: Mutex::new(None),
        }
    }

    /// Start the worker if it is not already running. Returns `false` when a
    /// live worker exists.
    pub(crate) fn start(&self) -> bool {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = guard.as_ref() {
            if !handle.thread.is_finished() {
                return false;
            }
        }

        let token = StopToken::default();
        let worker_token = token.clone();
        let config = self.config.clone();
        let store = self.store.clone();
        let thread = thread::Builder::new()
            .name("finger-capture".into())
            .spawn(move || run_capture(config, store, worker_token))
            .expect("failed to spawn capture thread");

        *guard = Some(CaptureHandle { token, thread });
        true
    }

    /// Cancel the worker and wait for it to observe the token. Returns
    /// `false` when no worker was running.
    pub(crate) fn stop(&self) -> bool {
        let handle = match self.worker.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match handle {
            Some(handle) => {
                let was_live = !handle.thread.is_finished();
                handle.token.cancel();
                let _ = handle.thread.join();
                was_live
            }
            None => false,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        match self.worker.lock() {
            Ok(guard) => guard
                .as_ref()
                .map(|handle| !handle.thread.is_finished())
                .unwrap_or(false),
            Err(_) => false,
        }
    }
}

fn build_detector(config: &AppConfig) -> Box<dyn HandDetector> {
    match config.detector_cmd.as_deref() {
        Some(command) => match SidecarDetector::spawn(command, DetectorConfig::default()) {
            Ok(detector) => Box::new(detector),
            Err(err) => {
                warn!("hand model unavailable ({err}); streaming without detection");
                Box::new(NullDetector)
            }
        },
        None => {
            info!("no HAND_MODEL_CMD configured; streaming without detection");
            Box::new(NullDetector)
        }
    }
}

/// How the per-frame loop ended.
#[derive(Debug, PartialEq, Eq)]
enum CaptureOutcome {
    /// The source failed before delivering a single frame. FFmpeg spawns
    /// fine on a camera-less host and exits on its first read, so this is
    /// the "no camera" signal, not a mid-stream fault.
    NoFrames,
    /// Cancelled, or the source died after delivering frames.
    Stopped,
}

/// Worker entry point. Opens the camera and runs the per-frame loop, or
/// falls back to the synthetic placeholder stream when no device is
/// available.
fn run_capture(config: AppConfig, store: FrameStore, token: StopToken) {
    match FfmpegCamera::open(&config.camera_uri, (config.width, config.height)) {
        Ok(camera) => {
            info!("capturing from {}", config.camera_uri);
            match capture_frames(camera, &config, &store, &token) {
                CaptureOutcome::NoFrames => {
                    info!(
                        "camera {} produced no frames; generating placeholder frames",
                        config.camera_uri
                    );
                    placeholder_loop(&config, &store, &token);
                }
                CaptureOutcome::Stopped => info!("capture loop stopped"),
            }
        }
        Err(err) => {
            info!("no camera available ({err}); generating placeholder frames");
            placeholder_loop(&config, &store, &token);
        }
    }
}

fn capture_frames(
    mut camera: impl FrameSource,
    config: &AppConfig,
    store: &FrameStore,
    token: &StopToken,
) -> CaptureOutcome {
    let mut detector = build_detector(config);
    let mut frame_number: u64 = 0;
    let mut smoothed_fps: f32 = 0.0;
    let mut last_instant = Instant::now();

    while !token.is_cancelled() {
        let mut frame = match camera.read() {
            Ok(frame) => frame,
            Err(err) if frame_number == 0 => {
                info!("camera delivered no frames ({err})");
                return CaptureOutcome::NoFrames;
            }
            Err(err) => {
                error!("camera read failed after frame #{frame_number} ({err}); stopping capture");
                return CaptureOutcome::Stopped;
            }
        };

        frame_number = frame_number.wrapping_add(1);
        let now = Instant::now();
        let elapsed = now.duration_since(last_instant).as_secs_f32();
        last_instant = now;
        if elapsed > 0.0 {
            let instant = 1.0 / elapsed;
            smoothed_fps = if smoothed_fps == 0.0 {
                instant
            } else {
                0.9 * smoothed_fps + 0.1 * instant
            };
        }
        metrics::gauge!("fingercam_pipeline_fps").set(smoothed_fps as f64);

        if config.mirror {
            frame.flip_horizontal();
        }

        let rgb = bgr_to_rgb(&frame.data);
        let hands = match detector.detect(&rgb, frame.width, frame.height) {
            Ok(hands) => hands,
            Err(err) => {
                warn!("hand detection failed on frame #{frame_number}: {err}");
                metrics::counter!("fingercam_detect_errors_total").increment(1);
                continue;
            }
        };

        match annotate_and_encode(&frame, &hands, frame_number, smoothed_fps, config.jpeg_quality)
        {
            Ok((jpeg, finger_count)) => {
                store.set_latest(FramePacket {
                    jpeg,
                    finger_count,
                    hand_detected: !hands.is_empty(),
                    timestamp_ms: frame.timestamp_ms,
                    frame_number,
                    fps: smoothed_fps,
                });
                metrics::counter!("fingercam_frames_published_total").increment(1);
                if frame_number % 30 == 0 {
                    debug!(
                        "capture heartbeat: frame #{frame_number}, {:.1} fps, fingers {}",
                        smoothed_fps,
                        if hands.is_empty() { 0 } else { finger_count }
                    );
                }
            }
            Err(err) => {
                warn!("frame encode failed on frame #{frame_number}: {err}");
                metrics::counter!("fingercam_encode_errors_total").increment(1);
            }
        }
    }

    CaptureOutcome::Stopped
}

/// Terminal synthetic-frame loop for camera-less hosts: republish the same
/// placeholder image at the stream cadence until cancelled.
fn placeholder_loop(config: &AppConfig, store: &FrameStore, token: &StopToken) {
    let jpeg = match placeholder_jpeg(config.width, config.height, config.jpeg_quality) {
        Ok(jpeg) => jpeg,
        Err(err) => {
            error!("failed to render placeholder frame: {err}");
            return;
        }
    };

    let mut frame_number: u64 = 0;
    while !token.is_cancelled() {
        frame_number = frame_number.wrapping_add(1);
        store.set_latest(FramePacket {
            jpeg: jpeg.clone(),
            finger_count: 0,
            hand_detected: false,
            timestamp_ms: Utc::now().timestamp_millis(),
            frame_number,
            fps: 0.0,
        });
        metrics::counter!("fingercam_placeholder_frames_total").increment(1);
        thread::sleep(PLACEHOLDER_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use video_ingest::{CaptureError, Frame, FrameFormat};

    fn test_config() -> AppConfig {
        AppConfig::from_lookup(|_| None).unwrap()
    }

    /// Mimics FFmpeg on a camera-less host: the process starts, then the
    /// first read hits EOF.
    struct DeadSource;

    impl FrameSource for DeadSource {
        fn read(&mut self) -> Result<Frame, CaptureError> {
            Err(CaptureError::Eof("failed to fill whole buffer".into()))
        }
    }

    /// Delivers a fixed number of black frames, then dies mid-stream.
    struct ShortSource {
        remaining: u32,
        width: i32,
        height: i32,
    }

    impl FrameSource for ShortSource {
        fn read(&mut self) -> Result<Frame, CaptureError> {
            if self.remaining == 0 {
                return Err(CaptureError::Eof("device unplugged".into()));
            }
            self.remaining -= 1;
            Ok(Frame {
                data: vec![0u8; (self.width * self.height * 3) as usize],
                width: self.width,
                height: self.height,
                timestamp_ms: Utc::now().timestamp_millis(),
                format: FrameFormat::Bgr8,
            })
        }
    }

    #[test]
    fn stop_token_round_trip() {
        let token = StopToken::default();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn placeholder_loop_publishes_identical_frames() {
        let config = test_config();
        let store = FrameStore::new();
        let token = StopToken::default();
        let loop_token = token.clone();
        let loop_store = store.clone();
        let worker = thread::spawn(move || placeholder_loop(&config, &loop_store, &loop_token));

        // Wait for the first few publishes, sampling as we go.
        let mut samples = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(5);
        while samples.len() < 10 && Instant::now() < deadline {
            if let Some(packet) = store.get_latest() {
                samples.push(packet);
            }
            thread::sleep(Duration::from_millis(5));
        }
        token.cancel();
        worker.join().unwrap();

        assert!(samples.len() >= 2, "placeholder loop published nothing");
        let reference = &samples[0];
        for packet in &samples {
            assert_eq!(packet.jpeg, reference.jpeg);
            assert_eq!(packet.finger_count, 0);
            assert!(!packet.hand_detected);
        }
    }

    #[test]
    fn read_failure_before_first_frame_is_no_camera() {
        let config = test_config();
        let store = FrameStore::new();
        let token = StopToken::default();

        let outcome = capture_frames(DeadSource, &config, &store, &token);

        assert_eq!(outcome, CaptureOutcome::NoFrames);
        assert!(store.get_latest().is_none(), "no frame should be published");
    }

    #[test]
    fn read_failure_after_frames_stops_capture() {
        let config = test_config();
        let store = FrameStore::new();
        let token = StopToken::default();
        let source = ShortSource {
            remaining: 3,
            width: 32,
            height: 24,
        };

        let outcome = capture_frames(source, &config, &store, &token);

        assert_eq!(outcome, CaptureOutcome::Stopped);
        let packet = store.get_latest().expect("frames should be published");
        assert_eq!(packet.frame_number, 3);
        assert_eq!(packet.finger_count, 0);
        assert!(!packet.hand_detected);
    }

    #[test]
    fn controller_stop_without_start_is_a_noop() {
        let controller = CaptureController::new(test_config(), FrameStore::new());
        assert!(!controller.is_running());
        assert!(!controller.stop());
    }
}
