//! # finger_tone
//!
//! Live finger-count instrument.  Hand landmarks come in from a
//! [`source::LandmarkSource`], the [`finger_count`] pipeline turns them into a
//! count, fingertip trails and tone events, and the result is drawn in a
//! `minifb` window while tones go to the synth or a MIDI port.
//!
//! ## Sources
//!
//! * `sim` (default): synthetic hands follow the mouse over the camera panel.
//! * `replay`: JSON-lines landmark recording, looped.
//!
//! ## Keys
//!
//! | Key | Action |
//! |---|---|
//! | `Space` | Start / stop detection |
//! | `0`–`5` | Fingers shown on the first simulated hand |
//! | `Shift`+`0`–`5` | Fingers shown on the second simulated hand |
//! | `H` | Show / hide the second hand |
//! | `X` | Hide all hands |
//! | `Q` / `Escape` | Quit |
//!
//! Tones: each new non-zero count plays one note from a C-major scale
//! (C4 upward, one step per finger), louder with more fingers.

pub mod config;
pub mod error;
pub mod source;
pub mod synth;
pub mod scheduler;
pub mod visualizer;
pub mod app;

pub use error::AppError;
