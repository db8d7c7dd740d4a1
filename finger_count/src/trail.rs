//! Fingertip trails.
//!
//! One trail per hand slot, each a time-ordered buffer of index-fingertip
//! samples.  Points older than the window fall off the front; the whole set
//! is dropped the moment no hand is visible, because slot alignment between
//! frames can't be trusted across a gap.

use std::collections::VecDeque;

use crate::landmark::HandObservation;

/// Default sliding window for trail points.
pub const TRAIL_WINDOW_MS: u64 = 30_000;

/// Consecutive points farther apart than this (normalised units) are a
/// tracking discontinuity and are not connected.
pub const MAX_SEGMENT_JUMP: f32 = 0.2;

/// Stroke width of the newest segment, in pixels.
pub const MAX_TRAIL_WIDTH: f32 = 8.0;

// ════════════════════════════════════════════════════════════════════════════
// TrailPoint / Trail
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailPoint {
    pub x:       f32,
    pub y:       f32,
    pub time_ms: u64,
}

impl TrailPoint {
    fn dist(&self, other: &TrailPoint) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Oldest-first samples for one hand slot.
pub type Trail = VecDeque<TrailPoint>;

// ════════════════════════════════════════════════════════════════════════════
// TrailTracker
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub struct TrailTracker {
    trails:    Vec<Trail>,
    window_ms: u64,
}

impl Default for TrailTracker {
    fn default() -> Self {
        TrailTracker::with_window(TRAIL_WINDOW_MS)
    }
}

impl TrailTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(window_ms: u64) -> Self {
        TrailTracker { trails: Vec::new(), window_ms }
    }

    /// Feed one frame's hands.  Returns the updated trail set.
    pub fn update(&mut self, hands: &[HandObservation], now_ms: u64) -> &[Trail] {
        if hands.is_empty() {
            self.trails.clear();
            return &self.trails;
        }

        self.trails.truncate(hands.len());
        self.trails.resize_with(hands.len(), Trail::new);

        for (trail, hand) in self.trails.iter_mut().zip(hands) {
            while let Some(front) = trail.front() {
                if now_ms.saturating_sub(front.time_ms) > self.window_ms {
                    trail.pop_front();
                } else {
                    break;
                }
            }
            let tip = hand.index_tip();
            trail.push_back(TrailPoint { x: tip.x, y: tip.y, time_ms: now_ms });
        }

        &self.trails
    }

    pub fn clear(&mut self) {
        self.trails.clear();
    }

    pub fn trails(&self) -> &[Trail] {
        &self.trails
    }

    pub fn point_count(&self) -> usize {
        self.trails.iter().map(VecDeque::len).sum()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Render geometry
// ════════════════════════════════════════════════════════════════════════════

/// One drawable piece of a trail, in normalised coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailSegment {
    pub from:  (f32, f32),
    pub to:    (f32, f32),
    /// 0.0 for the oldest segment, approaching 1.0 for the newest.
    pub alpha: f32,
    /// Stroke width in pixels, scaled by `alpha`.
    pub width: f32,
}

/// Connect consecutive points of every trail, skipping jumps larger than
/// [`MAX_SEGMENT_JUMP`].
pub fn segments(trails: &[Trail]) -> Vec<TrailSegment> {
    let mut out = Vec::new();
    for trail in trails {
        let n = trail.len();
        if n < 2 { continue; }
        for (i, (a, b)) in trail.iter().zip(trail.iter().skip(1)).enumerate() {
            if a.dist(b) > MAX_SEGMENT_JUMP { continue; }
            let alpha = i as f32 / n as f32;
            out.push(TrailSegment {
                from:  (a.x, a.y),
                to:    (b.x, b.y),
                alpha,
                width: MAX_TRAIL_WIDTH * alpha,
            });
        }
    }
    out
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{Landmark, INDEX_TIP};
    use crate::pose::open_hand;

    fn hand_at(x: f32, y: f32) -> HandObservation {
        let mut pts = *open_hand().points();
        pts[INDEX_TIP] = Landmark::new(x, y, 0.0);
        HandObservation::from_array(pts)
    }

    fn trail_of(points: &[(f32, f32)]) -> Trail {
        points.iter().enumerate()
            .map(|(i, &(x, y))| TrailPoint { x, y, time_ms: i as u64 })
            .collect()
    }

    #[test]
    fn point_survives_just_inside_window() {
        let mut t = TrailTracker::new();
        t.update(&[hand_at(0.1, 0.1)], 0);
        let trails = t.update(&[hand_at(0.2, 0.2)], 29_999);
        assert_eq!(trails[0].front().unwrap().time_ms, 0);
        assert_eq!(trails[0].len(), 2);
    }

    #[test]
    fn point_expires_just_outside_window() {
        let mut t = TrailTracker::new();
        t.update(&[hand_at(0.1, 0.1)], 0);
        let trails = t.update(&[hand_at(0.2, 0.2)], 30_001);
        assert_eq!(trails[0].len(), 1);
        assert_eq!(trails[0][0].time_ms, 30_001);
    }

    #[test]
    fn exactly_window_old_is_kept() {
        let mut t = TrailTracker::new();
        t.update(&[hand_at(0.1, 0.1)], 0);
        assert_eq!(t.update(&[hand_at(0.1, 0.1)], 30_000)[0].len(), 2);
    }

    #[test]
    fn losing_all_hands_resets() {
        let mut t = TrailTracker::new();
        t.update(&[hand_at(0.1, 0.1), hand_at(0.9, 0.9)], 0);
        t.update(&[hand_at(0.1, 0.1), hand_at(0.9, 0.9)], 16);
        assert!(t.update(&[], 32).is_empty());

        let trails = t.update(&[hand_at(0.5, 0.5)], 48);
        assert_eq!(trails.len(), 1);
        assert_eq!(trails[0].len(), 1);
        assert_eq!(trails[0][0].time_ms, 48);
    }

    #[test]
    fn slots_track_hand_count() {
        let mut t = TrailTracker::new();
        t.update(&[hand_at(0.1, 0.1)], 0);
        assert_eq!(t.update(&[hand_at(0.1, 0.1), hand_at(0.5, 0.5)], 16).len(), 2);
        let trails = t.update(&[hand_at(0.1, 0.1)], 32);
        assert_eq!(trails.len(), 1);
        assert_eq!(trails[0].len(), 3);
        assert_eq!(t.point_count(), 3);
    }

    #[test]
    fn new_slot_starts_empty() {
        let mut t = TrailTracker::new();
        t.update(&[hand_at(0.1, 0.1)], 0);
        let trails = t.update(&[hand_at(0.1, 0.1), hand_at(0.5, 0.5)], 16);
        assert_eq!(trails[1].len(), 1);
    }

    #[test]
    fn custom_window() {
        let mut t = TrailTracker::with_window(100);
        t.update(&[hand_at(0.1, 0.1)], 0);
        assert_eq!(t.update(&[hand_at(0.1, 0.1)], 101)[0].len(), 1);
    }

    #[test]
    fn large_jump_is_not_connected() {
        let segs = segments(&[trail_of(&[(0.1, 0.1), (0.35, 0.1)])]);
        assert!(segs.is_empty());
    }

    #[test]
    fn small_step_is_connected() {
        let segs = segments(&[trail_of(&[(0.1, 0.1), (0.25, 0.1)])]);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].from, (0.1, 0.1));
    }

    #[test]
    fn jump_of_exactly_the_limit_is_connected() {
        let segs = segments(&[trail_of(&[(0.0, 0.5), (MAX_SEGMENT_JUMP, 0.5)])]);
        assert_eq!(segs.len(), 1);
        let segs = segments(&[trail_of(&[(0.5, 0.0), (0.5, MAX_SEGMENT_JUMP)])]);
        assert_eq!(segs.len(), 1);
    }

    #[test]
    fn alpha_and_width_grow_toward_newest() {
        let segs = segments(&[trail_of(&[(0.1, 0.1), (0.12, 0.1), (0.14, 0.1), (0.16, 0.1)])]);
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[0].alpha, 0.0);
        assert!((segs[2].alpha - 0.5).abs() < 1e-6);
        assert!((segs[2].width - 4.0).abs() < 1e-6);
        assert!(segs.windows(2).all(|w| w[0].alpha < w[1].alpha));
    }

    #[test]
    fn single_point_trail_draws_nothing() {
        assert!(segments(&[trail_of(&[(0.5, 0.5)])]).is_empty());
    }
}
