//! Finger classifier: 21 landmarks in, number of extended fingers out.
//!
//! # Algorithm
//!
//! All distances are planar (`x`, `y`); depth is ignored.
//!
//! * **Thumb** is extended when it is abducted: the tip lies farther than the
//!   IP joint from the pinky MCP (splayed away from the palm) *and* farther
//!   than the IP joint from the index MCP (not tucked across the palm).
//! * **Index / middle / ring / pinky** are extended when the tip lies farther
//!   than the PIP joint from the wrist *and* farther than the PIP joint from
//!   the finger's own MCP.  The second test rejects bent fingers whose
//!   wrist distance is ambiguous under hand rotation.
//!
//! The count is the number of passing tests.  There is no hysteresis and no
//! handedness: both tests only compare relative distances, so a mirrored hand
//! classifies identically.

use crate::landmark::*;

/// (tip, pip, mcp) for the four long fingers.
const LONG_FINGERS: [(usize, usize, usize); 4] = [
    (INDEX_TIP,  INDEX_PIP,  INDEX_MCP),
    (MIDDLE_TIP, MIDDLE_PIP, MIDDLE_MCP),
    (RING_TIP,   RING_PIP,   RING_MCP),
    (PINKY_TIP,  PINKY_PIP,  PINKY_MCP),
];

/// Per-finger decisions in the order thumb, index, middle, ring, pinky.
pub fn extended_fingers(hand: &HandObservation) -> [bool; 5] {
    let mut out = [false; 5];
    out[0] = thumb_extended(hand);
    for (i, &(tip, pip, mcp)) in LONG_FINGERS.iter().enumerate() {
        out[i + 1] = finger_extended(hand, tip, pip, mcp);
    }
    out
}

/// Number of extended fingers on one hand, `0..=5`.
pub fn classify(hand: &HandObservation) -> u32 {
    extended_fingers(hand).iter().filter(|&&e| e).count() as u32
}

/// [`classify`] over an unvalidated landmark slice.
pub fn classify_landmarks(points: &[Landmark]) -> Result<u32, MalformedObservation> {
    let hand = HandObservation::try_from(points)?;
    Ok(classify(&hand))
}

fn thumb_extended(hand: &HandObservation) -> bool {
    let tip   = hand.get(THUMB_TIP);
    let ip    = hand.get(THUMB_IP);
    let pinky = hand.get(PINKY_MCP);
    let index = hand.get(INDEX_MCP);

    let laterally_out = tip.dist(pinky) > ip.dist(pinky);
    let not_tucked    = tip.dist(index) > ip.dist(index);
    laterally_out && not_tucked
}

fn finger_extended(hand: &HandObservation, tip: usize, pip: usize, mcp: usize) -> bool {
    let wrist = hand.get(WRIST);
    let tip   = hand.get(tip);
    let pip   = hand.get(pip);
    let mcp   = hand.get(mcp);

    let far_from_wrist = tip.dist(wrist) > pip.dist(wrist);
    let far_from_base  = tip.dist(mcp) > pip.dist(mcp);
    far_from_wrist && far_from_base
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
