//! # finger_count
//!
//! Turns a stream of 21-point hand landmarks into a finger count, a set of
//! decaying fingertip trails, and debounced tone events.
//!
//! Nothing here does I/O.  The landmark model, the camera, audio output and
//! drawing all live behind the caller; this crate only decides.
//!
//! ## Per-frame flow
//!
//! ```text
//! raw hands ─▶ validate ─▶ classify each ─▶ aggregate ─▶ DetectionResult ─▶ SoundTrigger
//!                  └──────────────▶ TrailTracker ─▶ segments ─▶ renderer
//! ```
//!
//! [`Pipeline`] strings these together and gates them on the detection
//! [`Mode`].
//!
//! ## Quick start
//!
//! ```rust
//! use finger_count::{Pipeline, FrameOutput, pose};
//!
//! let mut p = Pipeline::default();
//! p.model_loaded();
//! p.start();
//!
//! let hand = pose::open_hand().points().to_vec();
//! if let FrameOutput::Detected { result, sound, .. } = p.process_frame(&[hand], 0) {
//!     assert_eq!(result.finger_count, 5);
//!     assert!(sound.is_some());
//! }
//! ```

pub mod landmark;
pub mod classifier;
pub mod aggregate;
pub mod trail;
pub mod sound;
pub mod mode;
pub mod pipeline;
pub mod pose;
pub mod cloud;

pub use aggregate::{aggregate, DetectionResult};
pub use classifier::{classify, classify_landmarks, extended_fingers};
pub use landmark::{HandObservation, Landmark, MalformedObservation, HAND_CONNECTIONS, LANDMARK_COUNT};
pub use mode::{FailureKind, Mode};
pub use pipeline::{FrameOutput, Pipeline};
pub use sound::{SoundEvent, SoundTrigger};
pub use trail::{segments, Trail, TrailPoint, TrailSegment, TrailTracker};
