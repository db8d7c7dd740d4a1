//! Landmark sources: stand-ins for the camera plus hand model.
//!
//! The frame loop only sees [`LandmarkSource`]: acquire the camera, load the
//! model, then call `detect` once per frame.  Two backends ship:
//!
//! * [`SimLandmarkSource`]: synthetic hands steered by the visualizer window
//!   (mouse position, number keys for finger counts).
//! * [`ReplayLandmarkSource`]: frames read from a JSON-lines recording.
//!
//! Loading is slow on real models, so [`spawn_initializer`] runs it on its
//! own thread and reports back over a channel.

use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread;

use serde::Deserialize;
use thiserror::Error;

use finger_count::pose::{mask_for_count, synthetic_hand};
use finger_count::{FailureKind, Landmark};

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("model load failed: {0}")]
    ModelLoad(String),

    #[error("camera access failed: {0}")]
    CameraAccess(String),

    /// One bad frame; the loop carries on.
    #[error("frame dropped: {0}")]
    Frame(String),
}

impl SourceError {
    /// The fatal kind, if this error should end detection.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            SourceError::ModelLoad(_)    => Some(FailureKind::ModelLoad),
            SourceError::CameraAccess(_) => Some(FailureKind::CameraAccess),
            SourceError::Frame(_)        => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Camera plus hand model, as seen by the frame loop.
pub trait LandmarkSource: Send + 'static {
    /// Acquire the video input.
    fn acquire_camera(&mut self) -> Result<(), SourceError>;

    /// Load the hand model.  Called once, after the camera is up.
    fn initialize(&mut self) -> Result<(), SourceError>;

    /// Raw landmark lists for every hand visible at `timestamp_ms`.
    /// Hands are not validated here.
    fn detect(&mut self, timestamp_ms: u64) -> Result<Vec<Vec<Landmark>>, SourceError>;
}

pub type InitOutcome = Result<Box<dyn LandmarkSource>, SourceError>;

/// Acquire and initialise `source` on a background thread.
///
/// The receiver yields exactly one outcome; the source comes back with it on
/// success.
pub fn spawn_initializer(mut source: Box<dyn LandmarkSource>) -> Receiver<InitOutcome> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let outcome = source.acquire_camera()
            .and_then(|_| source.initialize())
            .map(|_| source);
        let _ = tx.send(outcome);
    });
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// SimLandmarkSource
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the visualizer window.
#[derive(Clone, Debug, PartialEq)]
pub enum SimInput {
    /// Cursor position inside the camera panel, normalised and already
    /// un-mirrored.
    Pointer { x: f32, y: f32 },
    /// Show `count` fingers on hand `hand` (0 or 1).
    Pose { hand: usize, count: u32 },
    ToggleSecondHand,
    ToggleVisible,
}

/// Hand size in normalised units.
const SIM_SCALE: f32 = 0.5;

/// Wrist offset from the pointer so the index tip sits under the cursor.
const SIM_WRIST_OFFSET: (f32, f32) = (0.10 * SIM_SCALE, 0.62 * SIM_SCALE);

/// Synthetic hands driven by [`SimInput`] events.
pub struct SimLandmarkSource {
    rx:          Receiver<SimInput>,
    pointer:     (f32, f32),
    counts:      [u32; 2],
    second_hand: bool,
    visible:     bool,
}

impl SimLandmarkSource {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimLandmarkSource {
            rx,
            pointer:     (0.5, 0.4),
            counts:      [5, 2],
            second_hand: false,
            visible:     true,
        }
    }

    fn apply(&mut self, input: SimInput) {
        match input {
            SimInput::Pointer { x, y }      => self.pointer = (x.clamp(0.0, 1.0), y.clamp(0.0, 1.0)),
            SimInput::Pose { hand, count }  => {
                if let Some(c) = self.counts.get_mut(hand) { *c = count.min(5); }
            }
            SimInput::ToggleSecondHand      => self.second_hand = !self.second_hand,
            SimInput::ToggleVisible         => self.visible = !self.visible,
        }
    }
}

impl LandmarkSource for SimLandmarkSource {
    fn acquire_camera(&mut self) -> Result<(), SourceError> { Ok(()) }
    fn initialize(&mut self)     -> Result<(), SourceError> { Ok(()) }

    fn detect(&mut self, _timestamp_ms: u64) -> Result<Vec<Vec<Landmark>>, SourceError> {
        while let Ok(input) = self.rx.try_recv() {
            self.apply(input);
        }
        if !self.visible {
            return Ok(Vec::new());
        }

        let (px, py) = self.pointer;
        let wrist = (px + SIM_WRIST_OFFSET.0, py + SIM_WRIST_OFFSET.1);
        let mut hands = vec![
            synthetic_hand(wrist, SIM_SCALE, false, mask_for_count(self.counts[0])).points().to_vec(),
        ];
        if self.second_hand {
            // Mirror image across the vertical centre line.
            let wrist2 = (1.0 - wrist.0, wrist.1);
            hands.push(synthetic_hand(wrist2, SIM_SCALE, true, mask_for_count(self.counts[1])).points().to_vec());
        }
        Ok(hands)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ReplayLandmarkSource
// ════════════════════════════════════════════════════════════════════════════

/// One line of a recording.
#[derive(Debug, Deserialize)]
struct RecordedFrame {
    #[serde(default)]
    hands: Vec<Vec<Landmark>>,
}

/// Plays back a JSON-lines recording, one frame per `detect`, looping.
///
/// ```text
/// {"hands": [[{"x":0.5,"y":0.8,"z":0.0}, … 21 points …]]}
/// {"hands": []}
/// ```
pub struct ReplayLandmarkSource {
    path:   PathBuf,
    text:   Option<String>,
    frames: Vec<RecordedFrame>,
    cursor: usize,
}

impl ReplayLandmarkSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ReplayLandmarkSource { path: path.into(), text: None, frames: Vec::new(), cursor: 0 }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl LandmarkSource for ReplayLandmarkSource {
    fn acquire_camera(&mut self) -> Result<(), SourceError> {
        let text = fs::read_to_string(&self.path)
            .map_err(|e| SourceError::CameraAccess(format!("{}: {}", self.path.display(), e)))?;
        self.text = Some(text);
        Ok(())
    }

    fn initialize(&mut self) -> Result<(), SourceError> {
        let text = self.text.take()
            .ok_or_else(|| SourceError::ModelLoad("recording not opened".to_string()))?;
        let mut frames = Vec::new();
        for (n, line) in text.lines().enumerate() {
            if line.trim().is_empty() { continue; }
            let frame: RecordedFrame = serde_json::from_str(line)
                .map_err(|e| SourceError::ModelLoad(format!("line {}: {}", n + 1, e)))?;
            frames.push(frame);
        }
        tracing::info!(frames = frames.len(), path = %self.path.display(), "recording loaded");
        self.frames = frames;
        Ok(())
    }

    fn detect(&mut self, _timestamp_ms: u64) -> Result<Vec<Vec<Landmark>>, SourceError> {
        if self.frames.is_empty() {
            return Ok(Vec::new());
        }
        let frame = &self.frames[self.cursor % self.frames.len()];
        self.cursor = (self.cursor + 1) % self.frames.len();
        Ok(frame.hands.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
