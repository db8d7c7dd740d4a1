//! Hand landmarks as produced by a 21-keypoint hand model.
//!
//! Coordinates are normalised to the frame: `x` and `y` in `[0, 1]`, `z` is a
//! relative depth that nothing in this crate reads.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices
// ════════════════════════════════════════════════════════════════════════════

/// Number of keypoints in one hand observation.
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_CMC:  usize = 1;
pub const THUMB_MCP:  usize = 2;
pub const THUMB_IP:   usize = 3;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_MCP:  usize = 5;
pub const INDEX_PIP:  usize = 6;
pub const INDEX_DIP:  usize = 7;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP:   usize = 13;
pub const RING_PIP:   usize = 14;
pub const RING_DIP:   usize = 15;
pub const RING_TIP:   usize = 16;
pub const PINKY_MCP:  usize = 17;
pub const PINKY_PIP:  usize = 18;
pub const PINKY_DIP:  usize = 19;
pub const PINKY_TIP:  usize = 20;

/// Skeleton edges for drawing, as `(from, to)` landmark index pairs.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (WRIST, THUMB_CMC), (THUMB_CMC, THUMB_MCP), (THUMB_MCP, THUMB_IP), (THUMB_IP, THUMB_TIP),
    (WRIST, INDEX_MCP), (INDEX_MCP, INDEX_PIP), (INDEX_PIP, INDEX_DIP), (INDEX_DIP, INDEX_TIP),
    (INDEX_MCP, MIDDLE_MCP), (MIDDLE_MCP, MIDDLE_PIP), (MIDDLE_PIP, MIDDLE_DIP), (MIDDLE_DIP, MIDDLE_TIP),
    (MIDDLE_MCP, RING_MCP), (RING_MCP, RING_PIP), (RING_PIP, RING_DIP), (RING_DIP, RING_TIP),
    (RING_MCP, PINKY_MCP), (PINKY_MCP, PINKY_PIP), (PINKY_PIP, PINKY_DIP), (PINKY_DIP, PINKY_TIP),
    (WRIST, PINKY_MCP),
];

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// One normalised keypoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Landmark { x, y, z }
    }

    /// Planar distance; depth is ignored.
    pub fn dist(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandObservation
// ════════════════════════════════════════════════════════════════════════════

/// Returned when a hand does not carry exactly [`LANDMARK_COUNT`] points.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("malformed hand observation: expected {LANDMARK_COUNT} landmarks, got {got}")]
pub struct MalformedObservation {
    pub got: usize,
}

/// The 21 landmarks of one detected hand in one frame.
///
/// A hand has no identity beyond its position in the per-frame list; index
/// alignment between consecutive frames is an approximation only.
#[derive(Clone, Debug, PartialEq)]
pub struct HandObservation {
    points: [Landmark; LANDMARK_COUNT],
}

impl HandObservation {
    /// Validate a raw landmark list coming from the model.
    pub fn new(points: Vec<Landmark>) -> Result<Self, MalformedObservation> {
        Self::try_from(points.as_slice())
    }

    pub fn from_array(points: [Landmark; LANDMARK_COUNT]) -> Self {
        HandObservation { points }
    }

    pub fn get(&self, index: usize) -> &Landmark {
        &self.points[index]
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    /// Landmark followed by the trail tracker.
    pub fn index_tip(&self) -> &Landmark {
        &self.points[INDEX_TIP]
    }
}

impl TryFrom<&[Landmark]> for HandObservation {
    type Error = MalformedObservation;

    fn try_from(points: &[Landmark]) -> Result<Self, Self::Error> {
        let points: [Landmark; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| MalformedObservation { got: points.len() })?;
        Ok(HandObservation { points })
    }
}

/// Validate every raw hand of a frame. Fails on the first malformed one.
pub fn validate_hands(raw: &[Vec<Landmark>]) -> Result<Vec<HandObservation>, MalformedObservation> {
    raw.iter()
        .map(|points| HandObservation::try_from(points.as_slice()))
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
