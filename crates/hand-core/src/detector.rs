//! Hand-landmark model collaborator.
//!
//! The model itself is external. [`SidecarDetector`] drives a model process
//! over a pipe pair: each request is one JSON header line followed by the raw
//! RGB frame bytes, each response is one JSON line listing detected hands.

use std::{
    io::{BufRead, BufReader, Write},
    process::{Child, ChildStdin, ChildStdout, Command, Stdio},
};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::landmark::{HandDetection, Landmark, LANDMARK_COUNT};

/// Fixed model thresholds: at most one tracked hand, 0.7/0.7 confidence.
#[derive(Clone, Copy, Debug)]
pub struct DetectorConfig {
    pub max_hands: usize,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_hands: 1,
            min_detection_confidence: 0.7,
            min_tracking_confidence: 0.7,
        }
    }
}

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("failed to launch detector sidecar {command:?}")]
    Spawn { command: String },
    #[error("detector sidecar closed its pipe")]
    Closed,
    #[error("malformed detector response: {0}")]
    Malformed(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Something that can find hands in an RGB frame.
///
/// Implementations return zero or more detections, each carrying exactly 21
/// ordered landmarks. Zero hands is not an error.
pub trait HandDetector: Send {
    fn detect(
        &mut self,
        rgb: &[u8],
        width: i32,
        height: i32,
    ) -> Result<Vec<HandDetection>, DetectError>;
}

/// Detector that never finds a hand. Used when no model command is
/// configured, so the server still streams raw frames.
#[derive(Default)]
pub struct NullDetector;

impl HandDetector for NullDetector {
    fn detect(
        &mut self,
        _rgb: &[u8],
        _width: i32,
        _height: i32,
    ) -> Result<Vec<HandDetection>, DetectError> {
        Ok(Vec::new())
    }
}

#[derive(Serialize)]
struct RequestHeader {
    width: i32,
    height: i32,
    max_hands: usize,
    min_detection_confidence: f32,
    min_tracking_confidence: f32,
}

#[derive(Deserialize)]
struct WireHand {
    score: f32,
    landmarks: Vec<Landmark>,
}

#[derive(Deserialize)]
struct WireResponse {
    hands: Vec<WireHand>,
}

/// Detector backed by an external model process.
pub struct SidecarDetector {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    config: DetectorConfig,
    line: String,
}

impl SidecarDetector {
    /// Spawn `command` (split on whitespace, first token is the program) and
    /// hold both ends of its pipe pair for the lifetime of the detector.
    pub fn spawn(command: &str, config: DetectorConfig) -> Result<Self, DetectError> {
        let mut parts = command.split_whitespace();
        let program = parts.next().ok_or_else(|| DetectError::Spawn {
            command: command.to_string(),
        })?;

        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|_| DetectError::Spawn {
                command: command.to_string(),
            })?;

        let stdin = child.stdin.take().ok_or(DetectError::Closed)?;
        let stdout = child.stdout.take().map(BufReader::new).ok_or(DetectError::Closed)?;

        debug!("hand model sidecar started: {command}");

        Ok(Self {
            child,
            stdin,
            stdout,
            config,
            line: String::new(),
        })
    }
}

impl HandDetector for SidecarDetector {
    fn detect(
        &mut self,
        rgb: &[u8],
        width: i32,
        height: i32,
    ) -> Result<Vec<HandDetection>, DetectError> {
        let header = RequestHeader {
            width,
            height,
            max_hands: self.config.max_hands,
            min_detection_confidence: self.config.min_detection_confidence,
            min_tracking_confidence: self.config.min_tracking_confidence,
        };
        let mut request = serde_json::to_vec(&header).map_err(|err| anyhow!(err))?;
        request.push(b'\n');

        self.stdin
            .write_all(&request)
            .and_then(|_| self.stdin.write_all(rgb))
            .and_then(|_| self.stdin.flush())
            .map_err(|_| DetectError::Closed)?;

        self.line.clear();
        let read = self
            .stdout
            .read_line(&mut self.line)
            .map_err(|_| DetectError::Closed)?;
        if read == 0 {
            return Err(DetectError::Closed);
        }

        parse_response(&self.line, &self.config)
    }
}

impl Drop for SidecarDetector {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Parse one response line, enforcing the 21-landmark invariant, the score
/// threshold, and the hand cap.
fn parse_response(
    line: &str,
    config: &DetectorConfig,
) -> Result<Vec<HandDetection>, DetectError> {
    let response: WireResponse =
        serde_json::from_str(line).map_err(|err| DetectError::Malformed(err.to_string()))?;

    let mut hands = Vec::with_capacity(response.hands.len().min(config.max_hands));
    for hand in response.hands {
        if hand.landmarks.len() != LANDMARK_COUNT {
            return Err(DetectError::Malformed(format!(
                "expected {LANDMARK_COUNT} landmarks, got {}",
                hand.landmarks.len()
            )));
        }
        if hand.score < config.min_detection_confidence {
            continue;
        }
        let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
        landmarks.copy_from_slice(&hand.landmarks);
        hands.push(HandDetection {
            landmarks,
            score: hand.score,
        });
        if hands.len() == config.max_hands {
            break;
        }
    }
    Ok(hands)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand_json(score: f32) -> String {
        let landmarks: Vec<String> = (0..LANDMARK_COUNT)
            .map(|i| format!(r#"{{"x":{},"y":0.5,"z":0.0}}"#, i as f32 / 21.0))
            .collect();
        format!(r#"{{"score":{score},"landmarks":[{}]}}"#, landmarks.join(","))
    }

    #[test]
    fn parses_a_single_hand() {
        let line = format!(r#"{{"hands":[{}]}}"#, hand_json(0.93));
        let hands = parse_response(&line, &DetectorConfig::default()).unwrap();
        assert_eq!(hands.len(), 1);
        assert!((hands[0].score - 0.93).abs() < 1e-6);
        assert_eq!(hands[0].landmarks.len(), LANDMARK_COUNT);
    }

    #[test]
    fn empty_hands_is_not_an_error() {
        let hands = parse_response(r#"{"hands":[]}"#, &DetectorConfig::default()).unwrap();
        assert!(hands.is_empty());
    }

    #[test]
    fn low_score_hands_are_dropped() {
        let line = format!(r#"{{"hands":[{}]}}"#, hand_json(0.4));
        let hands = parse_response(&line, &DetectorConfig::default()).unwrap();
        assert!(hands.is_empty());
    }

    #[test]
    fn truncates_to_max_hands() {
        let line = format!(r#"{{"hands":[{},{}]}}"#, hand_json(0.9), hand_json(0.8));
        let hands = parse_response(&line, &DetectorConfig::default()).unwrap();
        assert_eq!(hands.len(), 1);
        assert!((hands[0].score - 0.9).abs() < 1e-6);
    }

    #[test]
    fn wrong_landmark_count_is_malformed() {
        let line = r#"{"hands":[{"score":0.9,"landmarks":[{"x":0.1,"y":0.2}]}]}"#;
        let err = parse_response(line, &DetectorConfig::default()).unwrap_err();
        assert!(matches!(err, DetectError::Malformed(_)));
    }

    #[test]
    fn garbage_line_is_malformed() {
        let err = parse_response("not json", &DetectorConfig::default()).unwrap_err();
        assert!(matches!(err, DetectError::Malformed(_)));
    }
}
