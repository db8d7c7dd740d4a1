//! Synthetic hand poses.
//!
//! Builds plausible upright hands (wrist at the bottom, fingers pointing up
//! the frame) with any subset of fingers extended.  Used by the simulation
//! landmark source and as fixtures in tests.

use crate::landmark::{HandObservation, Landmark, LANDMARK_COUNT};

/// Offsets from the wrist for a right hand seen from the camera, in units of
/// `scale`.  `y` grows downward as in image coordinates.
const WRIST:      (f32, f32) = (0.0, 0.0);
const THUMB_CMC:  (f32, f32) = (-0.08, -0.08);
const THUMB_MCP:  (f32, f32) = (-0.15, -0.15);
const THUMB_IP:   (f32, f32) = (-0.20, -0.21);
const THUMB_OUT:  (f32, f32) = (-0.28, -0.24);
const THUMB_IN:   (f32, f32) = (-0.02, -0.22);

/// MCP offsets for index, middle, ring, pinky.
const FINGER_MCP: [(f32, f32); 4] = [(-0.10, -0.35), (-0.03, -0.38), (0.04, -0.36), (0.10, -0.32)];

/// (pip, dip, tip) offsets from the MCP.
const FINGER_OPEN:   [(f32, f32); 3] = [(0.0, -0.12), (0.0, -0.20), (0.0, -0.27)];
const FINGER_CURLED: [(f32, f32); 3] = [(0.0, -0.10), (0.0, -0.07), (0.0, -0.02)];

/// Which fingers are extended: thumb, index, middle, ring, pinky.
pub type FingerMask = [bool; 5];

/// Mask showing `count` fingers, in the usual counting order
/// (index first, thumb last).
pub fn mask_for_count(count: u32) -> FingerMask {
    let c = count.min(5);
    [c >= 5, c >= 1, c >= 2, c >= 3, c >= 4]
}

/// Build a hand with its wrist at `origin` (normalised coordinates).
///
/// `mirrored` flips the hand horizontally, producing a left hand.
pub fn synthetic_hand(origin: (f32, f32), scale: f32, mirrored: bool, mask: FingerMask) -> HandObservation {
    let sx = if mirrored { -scale } else { scale };
    let at = |(dx, dy): (f32, f32)| Landmark::new(origin.0 + dx * sx, origin.1 + dy * scale, 0.0);

    let mut pts = [Landmark::default(); LANDMARK_COUNT];
    pts[0] = at(WRIST);
    pts[1] = at(THUMB_CMC);
    pts[2] = at(THUMB_MCP);
    pts[3] = at(THUMB_IP);
    pts[4] = at(if mask[0] { THUMB_OUT } else { THUMB_IN });

    for (f, &(mx, my)) in FINGER_MCP.iter().enumerate() {
        let base = 5 + f * 4;
        let chain = if mask[f + 1] { &FINGER_OPEN } else { &FINGER_CURLED };
        pts[base] = at((mx, my));
        for (j, &(dx, dy)) in chain.iter().enumerate() {
            pts[base + 1 + j] = at((mx + dx, my + dy));
        }
    }

    HandObservation::from_array(pts)
}

/// All five fingers spread, centred in the frame.
pub fn open_hand() -> HandObservation {
    synthetic_hand((0.5, 0.8), 1.0, false, [true; 5])
}

/// Closed fist with the thumb tucked across the palm.
pub fn fist() -> HandObservation {
    synthetic_hand((0.5, 0.8), 1.0, false, [false; 5])
}
