use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop the application before or outside the frame loop.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("window: {0}")]
    Window(String),

    #[error("reading config {path}: {source}")]
    ConfigIo { path: PathBuf, source: std::io::Error },

    #[error("parsing config {path}: {source}")]
    ConfigParse { path: PathBuf, source: serde_json::Error },

    #[error("replay source selected but no recording path given")]
    MissingReplayPath,
}
