//! Per-frame aggregation of hand counts into a [`DetectionResult`].

use serde::{Deserialize, Serialize};

use crate::classifier::classify;
use crate::landmark::HandObservation;

/// Snapshot of one frame's count.  Replaced wholesale every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub finger_count:     u32,
    pub is_hand_detected: bool,
    #[serde(rename = "timestamp")]
    pub timestamp_ms:     u64,
}

impl DetectionResult {
    pub fn no_hand(timestamp_ms: u64) -> Self {
        DetectionResult { finger_count: 0, is_hand_detected: false, timestamp_ms }
    }
}

/// Sum the counts of every hand in the frame.
///
/// The total is bounded only by `5 × hands.len()`.
pub fn aggregate(hands: &[HandObservation], now_ms: u64) -> DetectionResult {
    if hands.is_empty() {
        return DetectionResult::no_hand(now_ms);
    }
    DetectionResult {
        finger_count:     hands.iter().map(classify).sum(),
        is_hand_detected: true,
        timestamp_ms:     now_ms,
    }
}
