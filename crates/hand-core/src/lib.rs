//! Hand-landmark domain types and the finger-extension classifier.
//!
//! The heavy lifting (the landmark model) is an external collaborator
//! reached through the [`HandDetector`] trait; this crate owns the 21-point
//! skeletal model, the geometric extended/folded rule, and the sidecar wire
//! format.

mod detector;
mod fingers;
mod landmark;

pub use detector::{DetectError, DetectorConfig, HandDetector, NullDetector, SidecarDetector};
pub use fingers::{classify, FingerState};
pub use landmark::{
    HandDetection, Landmark, HAND_SKELETON, INDEX_DIP, INDEX_MCP, INDEX_PIP, INDEX_TIP,
    LANDMARK_COUNT, MIDDLE_DIP, MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP, PINKY_DIP, PINKY_MCP,
    PINKY_PIP, PINKY_TIP, RING_DIP, RING_MCP, RING_PIP, RING_TIP, THUMB_CMC, THUMB_IP, THUMB_MCP,
    THUMB_TIP, WRIST,
};
