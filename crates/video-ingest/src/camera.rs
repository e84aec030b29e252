use std::{
    io::Read,
    process::{Child, ChildStdout, Command, Stdio},
};

use anyhow::anyhow;
use chrono::Utc;
use tracing::debug;

use crate::types::{CaptureError, Frame, FrameFormat};

/// Something that yields frames until it fails or its device disappears.
///
/// A successful `open` does not guarantee frames: a decoder can start and
/// exit immediately when the underlying device is absent. Callers that need
/// a camera-vs-no-camera decision should treat a read failure before the
/// first delivered frame as "no camera".
pub trait FrameSource {
    fn read(&mut self) -> Result<Frame, CaptureError>;
}

/// Camera handle backed by an FFmpeg subprocess emitting `bgr24` rawvideo.
///
/// The child process is killed and reaped on drop, so the device is released
/// on every exit path of the consuming loop.
pub struct FfmpegCamera {
    child: Child,
    stdout: ChildStdout,
    width: i32,
    height: i32,
    buffer: Vec<u8>,
}

impl FfmpegCamera {
    /// Open `uri` (a device index such as `"0"`, a `/dev/video*` path, or any
    /// FFmpeg-readable URI) and start decoding frames at `target_size`.
    pub fn open(uri: &str, target_size: (i32, i32)) -> Result<Self, CaptureError> {
        let scale_arg = format!("scale={}:{}", target_size.0, target_size.1);

        let (is_v4l, ffmpeg_uri) = if let Some(index) = parse_device_index(uri) {
            (true, format!("/dev/video{index}"))
        } else if uri.starts_with("/dev/video") {
            (true, uri.to_string())
        } else {
            (false, uri.to_string())
        };

        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-hide_banner").arg("-loglevel").arg("error");

        if is_v4l {
            cmd.arg("-f").arg("video4linux2");
        }

        cmd.arg("-i")
            .arg(&ffmpeg_uri)
            .arg("-vf")
            .arg(&scale_arg)
            .arg("-pix_fmt")
            .arg("bgr24")
            .arg("-f")
            .arg("rawvideo")
            .arg("-")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        let mut child = cmd.spawn().map_err(|_| CaptureError::Open {
            uri: uri.to_string(),
        })?;
        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                return Err(CaptureError::Other(anyhow!(
                    "failed to capture ffmpeg stdout"
                )));
            }
        };

        debug!("opened video source {ffmpeg_uri} at {}x{}", target_size.0, target_size.1);

        let frame_bytes = (target_size.0 as usize) * (target_size.1 as usize) * 3;
        Ok(Self {
            child,
            stdout,
            width: target_size.0,
            height: target_size.1,
            buffer: vec![0u8; frame_bytes],
        })
    }

}

impl FrameSource for FfmpegCamera {
    /// Block until one full frame has been decoded.
    ///
    /// A short read means the decoder exited (device missing or unplugged,
    /// stream ended); that is terminal for this handle.
    fn read(&mut self) -> Result<Frame, CaptureError> {
        match self.stdout.read_exact(&mut self.buffer) {
            Ok(()) => Ok(Frame {
                data: self.buffer.clone(),
                width: self.width,
                height: self.height,
                timestamp_ms: Utc::now().timestamp_millis(),
                format: FrameFormat::Bgr8,
            }),
            Err(err) => Err(CaptureError::Eof(err.to_string())),
        }
    }
}

impl Drop for FfmpegCamera {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Interpret `uri` as a V4L device index when it is either a bare integer or
/// a `/dev/videoN` path.
pub fn parse_device_index(uri: &str) -> Option<i32> {
    if let Ok(index) = uri.parse::<i32>() {
        return Some(index);
    }
    if let Some(stripped) = uri.strip_prefix("/dev/video") {
        if !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(index) = stripped.parse::<i32>() {
                return Some(index);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_index_from_bare_integer() {
        assert_eq!(parse_device_index("0"), Some(0));
        assert_eq!(parse_device_index("3"), Some(3));
    }

    #[test]
    fn device_index_from_dev_path() {
        assert_eq!(parse_device_index("/dev/video0"), Some(0));
        assert_eq!(parse_device_index("/dev/video12"), Some(12));
    }

    #[test]
    fn non_device_uris_are_not_indices() {
        assert_eq!(parse_device_index("rtsp://cam/stream"), None);
        assert_eq!(parse_device_index("/dev/video"), None);
        assert_eq!(parse_device_index("/dev/videoabc"), None);
    }
}
