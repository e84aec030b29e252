//! Camera ingestion for the finger-counting preview pipeline.
//!
//! Frames come from an FFmpeg subprocess decoding a V4L2 device (or any
//! FFmpeg-readable URI) into `bgr24` rawvideo on stdout. The consuming loop
//! reads frames synchronously; a failed read is terminal for the handle, a
//! failed open is reported as [`CaptureError::Open`] so callers can fall back
//! to a synthetic source.

mod camera;
mod types;

pub use camera::{parse_device_index, FfmpegCamera, FrameSource};
pub use types::{CaptureError, Frame, FrameFormat};
