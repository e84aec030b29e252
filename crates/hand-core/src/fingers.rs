//! Finger extension classification over a 21-point hand skeleton.
//!
//! The rule is purely geometric and orientation-sensitive: it expects an
//! upright hand in a horizontally mirrored (selfie-mode) frame, and degrades
//! for hands rotated far from upright.

use crate::landmark::{
    Landmark, INDEX_PIP, INDEX_TIP, LANDMARK_COUNT, MIDDLE_PIP, MIDDLE_TIP, PINKY_PIP, PINKY_TIP,
    RING_PIP, RING_TIP, THUMB_IP, THUMB_TIP,
};

/// Per-finger extended/folded booleans derived for a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FingerState {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerState {
    /// Number of extended fingers, always in `[0, 5]`.
    pub fn count(&self) -> u8 {
        [self.thumb, self.index, self.middle, self.ring, self.pinky]
            .into_iter()
            .filter(|&extended| extended)
            .count() as u8
    }
}

/// Classify each finger of one detected hand as extended or folded.
///
/// The thumb compares horizontal coordinates: its tip must sit left of the
/// IP joint, which in a mirrored frame means "away from the palm". The other
/// four fingers compare vertical coordinates: the tip must sit above (smaller
/// `y` than) the PIP joint two links down the chain.
pub fn classify(landmarks: &[Landmark; LANDMARK_COUNT]) -> FingerState {
    FingerState {
        thumb: landmarks[THUMB_TIP].x < landmarks[THUMB_IP].x,
        index: landmarks[INDEX_TIP].y < landmarks[INDEX_PIP].y,
        middle: landmarks[MIDDLE_TIP].y < landmarks[MIDDLE_PIP].y,
        ring: landmarks[RING_TIP].y < landmarks[RING_PIP].y,
        pinky: landmarks[PINKY_TIP].y < landmarks[PINKY_PIP].y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A hand with every finger on the "closed" side of its reference joint.
    fn fist() -> [Landmark; LANDMARK_COUNT] {
        let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
        // Thumb tip to the right of the IP joint.
        landmarks[THUMB_IP] = Landmark::new(0.40, 0.60);
        landmarks[THUMB_TIP] = Landmark::new(0.45, 0.58);
        // Each fingertip below its PIP joint.
        for (tip, pip) in [
            (INDEX_TIP, INDEX_PIP),
            (MIDDLE_TIP, MIDDLE_PIP),
            (RING_TIP, RING_PIP),
            (PINKY_TIP, PINKY_PIP),
        ] {
            landmarks[pip] = Landmark::new(0.5, 0.50);
            landmarks[tip] = Landmark::new(0.5, 0.62);
        }
        landmarks
    }

    /// A hand with every fingertip strictly beyond its reference joint in the
    /// "extended" direction.
    fn open_hand() -> [Landmark; LANDMARK_COUNT] {
        let mut landmarks = fist();
        landmarks[THUMB_TIP] = Landmark::new(0.30, 0.58);
        for (tip, pip) in [
            (INDEX_TIP, INDEX_PIP),
            (MIDDLE_TIP, MIDDLE_PIP),
            (RING_TIP, RING_PIP),
            (PINKY_TIP, PINKY_PIP),
        ] {
            landmarks[tip] = Landmark::new(landmarks[pip].x, landmarks[pip].y - 0.2);
        }
        landmarks
    }

    #[test]
    fn open_hand_counts_five() {
        let state = classify(&open_hand());
        assert_eq!(
            state,
            FingerState {
                thumb: true,
                index: true,
                middle: true,
                ring: true,
                pinky: true,
            }
        );
        assert_eq!(state.count(), 5);
    }

    #[test]
    fn fist_counts_zero() {
        assert_eq!(classify(&fist()).count(), 0);
    }

    #[test]
    fn count_stays_in_range_for_arbitrary_landmarks() {
        // A sweep of degenerate and scrambled inputs; the count must never
        // leave [0, 5].
        for seed in 0..50u32 {
            let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
            let mut state = seed.wrapping_mul(2654435761).wrapping_add(1);
            for lm in landmarks.iter_mut() {
                state = state.wrapping_mul(1664525).wrapping_add(1013904223);
                lm.x = (state >> 16) as f32 / 65536.0;
                state = state.wrapping_mul(1664525).wrapping_add(1013904223);
                lm.y = (state >> 16) as f32 / 65536.0;
            }
            assert!(classify(&landmarks).count() <= 5);
        }
    }

    #[test]
    fn thumb_ignores_vertical_coordinate() {
        let mut landmarks = open_hand();
        let before = classify(&landmarks);
        assert!(before.thumb);

        // Move the thumb tip vertically only; classification must not change.
        landmarks[THUMB_TIP].y += 0.3;
        assert!(classify(&landmarks).thumb);
        landmarks[THUMB_TIP].y -= 0.6;
        assert!(classify(&landmarks).thumb);

        // Moving it horizontally past the IP joint does flip it.
        landmarks[THUMB_TIP].x = landmarks[THUMB_IP].x + 0.05;
        assert!(!classify(&landmarks).thumb);
    }

    #[test]
    fn fingers_ignore_horizontal_coordinate() {
        let mut landmarks = open_hand();
        landmarks[INDEX_TIP].x += 0.4;
        assert!(classify(&landmarks).index);

        landmarks[INDEX_TIP].y = landmarks[INDEX_PIP].y + 0.05;
        assert!(!classify(&landmarks).index);
    }

    #[test]
    fn single_finger_counts() {
        let mut landmarks = fist();
        landmarks[INDEX_TIP].y = landmarks[INDEX_PIP].y - 0.2;
        let state = classify(&landmarks);
        assert_eq!(state.count(), 1);
        assert!(state.index);
        assert!(!state.middle);
    }
}
