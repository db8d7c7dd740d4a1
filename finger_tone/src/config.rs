//! Application configuration.
//!
//! Defaults suit a laptop with no hardware attached: simulated hands, the
//! built-in synth, a mirrored (selfie) view.  A JSON file can override any
//! subset of fields; command-line flags are applied on top of that.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Deserialize;

use finger_count::trail::TRAIL_WINDOW_MS;

use crate::error::AppError;

/// Where hand landmarks come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Mouse-driven synthetic hands.
    Sim,
    /// JSON-lines landmark recording.
    Replay,
}

/// Where tones go.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AudioKind {
    Synth,
    Midi,
    None,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source:          SourceKind,
    pub replay_path:     Option<PathBuf>,
    pub audio:           AudioKind,
    /// General MIDI program used by the MIDI backend.
    pub midi_program:    u8,
    pub trail_window_ms: u64,
    /// Flip the camera panel horizontally so the view reads like a mirror.
    pub mirror:          bool,
    pub frame_rate:      u32,
    /// Hands beyond this many in a frame are ignored.
    pub max_hands:       usize,
    pub window_width:    usize,
    pub window_height:   usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            source:          SourceKind::Sim,
            replay_path:     None,
            audio:           AudioKind::Synth,
            midi_program:    11,
            trail_window_ms: TRAIL_WINDOW_MS,
            mirror:          true,
            frame_rate:      60,
            max_hands:       4,
            window_width:    1200,
            window_height:   600,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path)
            .map_err(|source| AppError::ConfigIo { path: path.to_path_buf(), source })?;
        serde_json::from_str(&text)
            .map_err(|source| AppError::ConfigParse { path: path.to_path_buf(), source })
    }

    /// Reject combinations the app can't start with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.source == SourceKind::Replay && self.replay_path.is_none() {
            return Err(AppError::MissingReplayPath);
        }
        Ok(())
    }
}
