//! Count → tone triggering.
//!
//! [`SoundTrigger`] is an edge detector over successive
//! [`DetectionResult`]s: a tone fires when the count changes to a new
//! non-zero value while detection is active.  The tone itself is described
//! by a [`SoundEvent`]; turning it into sound is left to an audio backend.
//!
//! ## Mapping
//!
//! | Count | Pitch | Volume |
//! |---|---|---|
//! | 1 | C4 (index 0) | 0.1 |
//! | n | `SCALE_HZ[min(n-1, 19)]` | `clamp(n × 0.1, 0.1, 1.0)` |
//! | ≥ 20 | A6 (index 19) | 1.0 |

use crate::aggregate::DetectionResult;

// ════════════════════════════════════════════════════════════════════════════
// Scale and envelope constants
// ════════════════════════════════════════════════════════════════════════════

/// C major, C4 through A6.
pub const SCALE_HZ: [f32; 20] = [
    261.63, 293.66, 329.63, 349.23, 392.00, 440.00, 493.88,   // C4 – B4
    523.25, 587.33, 659.25, 698.46, 783.99, 880.00, 987.77,   // C5 – B5
    1046.50, 1174.66, 1318.51, 1396.91, 1567.98, 1760.00,     // C6 – A6
];

/// Linear attack from silence to full volume.
pub const ATTACK_MS: u64 = 30;

/// Total tone length; also how long the "sound active" indicator stays lit.
pub const TONE_MS: u64 = 400;

/// Gain reached at the end of the exponential decay, relative to full scale.
pub const DECAY_FLOOR: f32 = 0.001;

/// Index into [`SCALE_HZ`] for a finger count.
pub fn pitch_index(count: u32) -> usize {
    (count.saturating_sub(1) as usize).min(SCALE_HZ.len() - 1)
}

/// Loudness for a finger count: 10 % per finger, at least 10 %, at most 100 %.
pub fn volume_for(count: u32) -> f32 {
    (count as f32 * 0.1).clamp(0.1, 1.0)
}

/// Nearest MIDI note number for a frequency.
pub fn midi_note_for(frequency_hz: f32) -> u8 {
    let n = 69.0 + 12.0 * (frequency_hz / 440.0).log2();
    n.round().clamp(0.0, 127.0) as u8
}

// ════════════════════════════════════════════════════════════════════════════
// Envelope
// ════════════════════════════════════════════════════════════════════════════

/// Gain of a tone `t_ms` after it starts, for a peak of `volume`.
///
/// Linear ramp 0 → `volume` over [`ATTACK_MS`], then exponential decay to
/// [`DECAY_FLOOR`] at [`TONE_MS`], then silence.
pub fn envelope_gain(volume: f32, t_ms: f32) -> f32 {
    let attack = ATTACK_MS as f32;
    let total  = TONE_MS as f32;
    if t_ms < 0.0 || t_ms >= total {
        return 0.0;
    }
    if t_ms < attack {
        return volume * t_ms / attack;
    }
    let floor = DECAY_FLOOR.min(volume);
    if volume <= floor {
        return floor;
    }
    // Geometric interpolation from `volume` at the end of the attack down
    // to `floor` at the end of the tone.
    let frac = (t_ms - attack) / (total - attack);
    volume * (floor / volume).powf(frac)
}

// ════════════════════════════════════════════════════════════════════════════
// SoundEvent
// ════════════════════════════════════════════════════════════════════════════

/// One tone to play.  Not stored anywhere once handed to a backend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SoundEvent {
    pub pitch_index:  usize,
    pub frequency_hz: f32,
    pub volume:       f32,
    pub start_ms:     u64,
    pub duration_ms:  u64,
}

impl SoundEvent {
    pub fn for_count(count: u32, start_ms: u64) -> Self {
        let pitch_index = pitch_index(count);
        SoundEvent {
            pitch_index,
            frequency_hz: SCALE_HZ[pitch_index],
            volume:       volume_for(count),
            start_ms,
            duration_ms:  TONE_MS,
        }
    }

    /// Envelope gain `t_ms` into this tone.
    pub fn gain_at(&self, t_ms: f32) -> f32 {
        envelope_gain(self.volume, t_ms)
    }

    pub fn end_ms(&self) -> u64 {
        self.start_ms + self.duration_ms
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SoundTrigger
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct SoundTrigger {
    previous_count:      u32,
    /// Deadline for switching the indicator off.  A new trigger replaces
    /// it, so at most one deactivation is ever pending.
    indicator_off_at_ms: Option<u64>,
}

impl SoundTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one frame's result.  Returns the tone to play, if any.
    pub fn on_detection_result(&mut self, result: &DetectionResult, is_active: bool) -> Option<SoundEvent> {
        let count = result.finger_count;
        let fire  = is_active && count > 0 && count != self.previous_count;

        self.previous_count = if is_active { count } else { 0 };

        if !fire {
            return None;
        }
        let now = result.timestamp_ms;
        self.indicator_off_at_ms = Some(now + TONE_MS);
        tracing::debug!(count, now, "sound trigger fired");
        Some(SoundEvent::for_count(count, now))
    }

    /// Whether the "sound active" indicator is lit at `now_ms`.
    pub fn is_indicator_on(&self, now_ms: u64) -> bool {
        matches!(self.indicator_off_at_ms, Some(off) if now_ms < off)
    }

    /// Drop a deactivation deadline that has passed.
    pub fn expire(&mut self, now_ms: u64) {
        if !self.is_indicator_on(now_ms) {
            self.indicator_off_at_ms = None;
        }
    }

    pub fn reset(&mut self) {
        self.previous_count      = 0;
        self.indicator_off_at_ms = None;
    }

    pub fn previous_count(&self) -> u32 {
        self.previous_count
    }

    pub fn has_pending_deactivation(&self) -> bool {
        self.indicator_off_at_ms.is_some()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn result(count: u32, t: u64) -> DetectionResult {
        DetectionResult { finger_count: count, is_hand_detected: count > 0, timestamp_ms: t }
    }

    #[test]
    fn debounce_sequence_fires_three_times() {
        let mut trig = SoundTrigger::new();
        let fired: Vec<u32> = [0, 3, 3, 3, 5, 5, 0, 3].iter().enumerate()
            .filter_map(|(i, &c)| trig.on_detection_result(&result(c, i as u64 * 16), true))
            .map(|e| e.pitch_index as u32 + 1)
            .collect();
        assert_eq!(fired, vec![3, 5, 3]);
    }

    #[test]
    fn inactive_never_fires() {
        let mut trig = SoundTrigger::new();
        assert!(trig.on_detection_result(&result(4, 0), false).is_none());
        assert_eq!(trig.previous_count(), 0);
    }

    #[test]
    fn inactive_frame_rearms_same_count() {
        let mut trig = SoundTrigger::new();
        assert!(trig.on_detection_result(&result(2, 0), true).is_some());
        trig.on_detection_result(&result(2, 16), false);
        assert!(trig.on_detection_result(&result(2, 32), true).is_some());
    }

    #[test]
    fn mapping_low_mid_high() {
        assert_eq!(pitch_index(1), 0);
        assert!((volume_for(1) - 0.1).abs() < 1e-6);
        assert_eq!(pitch_index(12), 11);
        assert_eq!(volume_for(12), 1.0);
        assert_eq!(pitch_index(25), 19);
        assert_eq!(pitch_index(0), 0);
    }

    #[test]
    fn scale_ascends() {
        assert!(SCALE_HZ.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(SCALE_HZ[0], 261.63);
        assert_eq!(SCALE_HZ[19], 1760.00);
    }

    #[test]
    fn event_for_count() {
        let e = SoundEvent::for_count(5, 1000);
        assert_eq!(e.frequency_hz, 392.00);
        assert!((e.volume - 0.5).abs() < 1e-6);
        assert_eq!(e.end_ms(), 1400);
    }

    #[test]
    fn event_gain_follows_its_volume() {
        let quiet = SoundEvent::for_count(2, 5_000);
        let loud  = SoundEvent::for_count(10, 5_000);
        assert_eq!(loud.gain_at(0.0), 0.0);
        assert!((quiet.gain_at(30.0) - 0.2).abs() < 1e-5);
        assert!((loud.gain_at(30.0) - 1.0).abs() < 1e-5);
        assert!(loud.gain_at(100.0) > quiet.gain_at(100.0));
        assert_eq!(loud.gain_at(TONE_MS as f32), 0.0);
    }

    #[test]
    fn envelope_shape() {
        let v = 0.8;
        assert_eq!(envelope_gain(v, 0.0), 0.0);
        assert!((envelope_gain(v, 15.0) - 0.4).abs() < 1e-5);
        assert!((envelope_gain(v, 30.0) - v).abs() < 1e-5);
        assert!(envelope_gain(v, 200.0) < v);
        assert!(envelope_gain(v, 399.9) < 0.0011);
        assert_eq!(envelope_gain(v, 400.0), 0.0);
        assert_eq!(envelope_gain(v, -1.0), 0.0);
    }

    #[test]
    fn indicator_window_and_replacement() {
        let mut trig = SoundTrigger::new();
        trig.on_detection_result(&result(1, 0), true);
        assert!(trig.is_indicator_on(399));
        trig.on_detection_result(&result(2, 300), true);
        // Second trigger pushes the deadline out instead of letting the
        // first one switch the indicator off at 400.
        assert!(trig.is_indicator_on(500));
        assert!(!trig.is_indicator_on(700));
        trig.expire(700);
        assert!(!trig.has_pending_deactivation());
    }

    #[test]
    fn reset_clears_everything() {
        let mut trig = SoundTrigger::new();
        trig.on_detection_result(&result(3, 0), true);
        trig.reset();
        assert_eq!(trig.previous_count(), 0);
        assert!(!trig.is_indicator_on(1));
        assert!(trig.on_detection_result(&result(3, 2), true).is_some());
    }

    #[test]
    fn midi_notes() {
        assert_eq!(midi_note_for(440.0), 69);
        assert_eq!(midi_note_for(SCALE_HZ[0]), 60);
        assert_eq!(midi_note_for(SCALE_HZ[19]), 93);
    }
}
