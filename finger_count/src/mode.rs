//! Detection mode state machine.
//!
//! ```text
//! LoadingModel ──loaded──▶ Idle ◀──stop── Detecting
//!                            └────start────▶
//!        any ──failure──▶ Error (terminal)
//! ```

use std::fmt;

use thiserror::Error;

/// Fatal failures that move the machine to [`Mode::Error`].
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FailureKind {
    #[error("hand model failed to load")]
    ModelLoad,
    #[error("camera could not be acquired")]
    CameraAccess,
}

impl FailureKind {
    /// Message shown to the user in the error state.
    pub fn user_message(self) -> &'static str {
        match self {
            FailureKind::ModelLoad    => "Failed to load hand model. Please restart.",
            FailureKind::CameraAccess => "Could not access camera. Please ensure permissions are granted.",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    LoadingModel,
    Idle,
    Detecting,
    Error { kind: FailureKind, message: String },
}

impl Mode {
    pub fn is_detecting(&self) -> bool { matches!(self, Mode::Detecting) }
    pub fn is_error(&self)     -> bool { matches!(self, Mode::Error { .. }) }

    /// Whether the user can start or stop detection from here.
    pub fn accepts_toggle(&self) -> bool {
        matches!(self, Mode::Idle | Mode::Detecting)
    }

    /// Model finished loading.
    pub fn model_loaded(&mut self) -> bool {
        self.transition(Mode::LoadingModel, Mode::Idle)
    }

    /// User start command.
    pub fn start(&mut self) -> bool {
        self.transition(Mode::Idle, Mode::Detecting)
    }

    /// User stop command.
    pub fn stop(&mut self) -> bool {
        self.transition(Mode::Detecting, Mode::Idle)
    }

    /// Enter the terminal error state.  A second failure keeps the first
    /// message.
    pub fn fail(&mut self, kind: FailureKind, detail: &str) {
        if self.is_error() { return; }
        tracing::error!(%kind, detail, "entering error state");
        *self = Mode::Error { kind, message: kind.user_message().to_string() };
    }

    fn transition(&mut self, from: Mode, to: Mode) -> bool {
        if *self != from { return false; }
        tracing::info!(from = %from, to = %to, "mode transition");
        *self = to;
        true
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::LoadingModel  => write!(f, "loading"),
            Mode::Idle          => write!(f, "idle"),
            Mode::Detecting     => write!(f, "detecting"),
            Mode::Error { .. }  => write!(f, "error"),
        }
    }
}
