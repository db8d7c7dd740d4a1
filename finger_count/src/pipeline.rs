//! The per-frame chain: classify → aggregate → trails → sound trigger.
//!
//! [`Pipeline`] owns every piece of state that survives between frames and
//! is driven by a single frame loop.  It only has visible effects while the
//! mode is [`Mode::Detecting`]; in any other mode a frame is a no-op.

use crate::aggregate::{aggregate, DetectionResult};
use crate::landmark::{validate_hands, HandObservation, Landmark, MalformedObservation};
use crate::mode::{FailureKind, Mode};
use crate::sound::{SoundEvent, SoundTrigger};
use crate::trail::{Trail, TrailTracker};

/// What one frame produced.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameOutput {
    /// Not detecting; nothing was touched.
    Idle,
    /// A hand in the frame was malformed; the frame's effects were dropped.
    Skipped(MalformedObservation),
    Detected {
        result: DetectionResult,
        hands:  Vec<HandObservation>,
        sound:  Option<SoundEvent>,
    },
}

#[derive(Debug)]
pub struct Pipeline {
    mode:    Mode,
    trails:  TrailTracker,
    trigger: SoundTrigger,
    current: Option<DetectionResult>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Pipeline::new(TrailTracker::default())
    }
}

impl Pipeline {
    pub fn new(trails: TrailTracker) -> Self {
        Pipeline {
            mode:    Mode::LoadingModel,
            trails,
            trigger: SoundTrigger::new(),
            current: None,
        }
    }

    // ── mode commands ────────────────────────────────────────────────────

    pub fn model_loaded(&mut self) -> bool {
        self.mode.model_loaded()
    }

    /// Idle → Detecting.  Clears whatever the previous session left behind.
    pub fn start(&mut self) -> bool {
        if !self.mode.start() { return false; }
        self.current = None;
        self.trails.clear();
        self.trigger.reset();
        true
    }

    /// Detecting → Idle.
    pub fn stop(&mut self) -> bool {
        if !self.mode.stop() { return false; }
        self.current = None;
        self.trigger.reset();
        true
    }

    /// Start when idle, stop when detecting.  Returns whether detection is
    /// now running, or `None` when the mode ignores the command.
    pub fn toggle(&mut self) -> Option<bool> {
        if !self.mode.accepts_toggle() { return None; }
        if self.mode.is_detecting() {
            self.stop();
            Some(false)
        } else {
            self.start();
            Some(true)
        }
    }

    pub fn fail(&mut self, kind: FailureKind, detail: &str) {
        self.mode.fail(kind, detail);
        self.current = None;
        self.trigger.reset();
    }

    // ── per-frame ────────────────────────────────────────────────────────

    /// Run one frame over raw model output.
    pub fn process_frame(&mut self, raw_hands: &[Vec<Landmark>], now_ms: u64) -> FrameOutput {
        self.trigger.expire(now_ms);
        if !self.mode.is_detecting() {
            return FrameOutput::Idle;
        }

        let hands = match validate_hands(raw_hands) {
            Ok(h)  => h,
            Err(e) => {
                tracing::warn!(error = %e, "skipping frame");
                return FrameOutput::Skipped(e);
            }
        };

        let result = aggregate(&hands, now_ms);
        self.trails.update(&hands, now_ms);
        let sound = self.trigger.on_detection_result(&result, true);
        self.current = Some(result);

        FrameOutput::Detected { result, hands, sound }
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn mode(&self)    -> &Mode                    { &self.mode }
    pub fn current(&self) -> Option<&DetectionResult> { self.current.as_ref() }
    pub fn trails(&self)  -> &[Trail]                 { self.trails.trails() }
    pub fn trail_points(&self) -> usize               { self.trails.point_count() }

    pub fn is_sound_indicator_on(&self, now_ms: u64) -> bool {
        self.trigger.is_indicator_on(now_ms)
    }
}
