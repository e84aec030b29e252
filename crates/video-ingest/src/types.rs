use anyhow::Error;
use thiserror::Error;

/// Raw frame captured from a video source.
#[derive(Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: i32,
    pub height: i32,
    pub timestamp_ms: i64,
    pub format: FrameFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameFormat {
    Bgr8,
}

impl Frame {
    /// Mirror the frame horizontally in place.
    ///
    /// Used for selfie-mode previews so the on-screen hand moves the same
    /// way as the viewer's.
    pub fn flip_horizontal(&mut self) {
        let width = self.width as usize;
        let height = self.height as usize;
        let stride = width * 3;
        for row in 0..height {
            let row_start = row * stride;
            for col in 0..width / 2 {
                let left = row_start + col * 3;
                let right = row_start + (width - 1 - col) * 3;
                for ch in 0..3 {
                    self.data.swap(left + ch, right + ch);
                }
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to open video source {uri:?}")]
    Open { uri: String },
    #[error("video source ended: {0}")]
    Eof(String),
    #[error(transparent)]
    Other(#[from] Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_frame(width: i32, height: i32) -> Frame {
        let len = (width * height * 3) as usize;
        Frame {
            data: (0..len).map(|i| (i % 251) as u8).collect(),
            width,
            height,
            timestamp_ms: 0,
            format: FrameFormat::Bgr8,
        }
    }

    #[test]
    fn flip_horizontal_swaps_edge_columns() {
        let mut frame = test_frame(4, 2);
        let original = frame.data.clone();
        frame.flip_horizontal();
        let stride = 4 * 3;
        for row in 0..2usize {
            assert_eq!(
                &frame.data[row * stride..row * stride + 3],
                &original[row * stride + 3 * 3..row * stride + 4 * 3],
            );
        }
    }

    #[test]
    fn flip_horizontal_is_an_involution() {
        let mut frame = test_frame(5, 3);
        let original = frame.data.clone();
        frame.flip_horizontal();
        assert_ne!(frame.data, original);
        frame.flip_horizontal();
        assert_eq!(frame.data, original);
    }
}
