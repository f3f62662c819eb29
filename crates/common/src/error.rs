//! Error types shared across Screencaster crates.

use std::path::PathBuf;

/// Top-level error type for Screencaster operations.
#[derive(Debug, thiserror::Error)]
pub enum ScreencastError {
    #[error("Capture error: {message}")]
    Capture { message: String },

    #[error("Failed to launch capture for region {region}: {message}")]
    Launch { region: String, message: String },

    #[error("Topology query error: {message}")]
    Topology { message: String },

    #[error("Recording directory {path} is not usable: {message}")]
    Workspace { path: PathBuf, message: String },

    #[error("Platform error: {message}")]
    Platform { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ScreencastError.
pub type ScreencastResult<T> = Result<T, ScreencastError>;

impl ScreencastError {
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture {
            message: msg.into(),
        }
    }

    pub fn launch(region: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Launch {
            region: region.into(),
            message: msg.into(),
        }
    }

    pub fn topology(msg: impl Into<String>) -> Self {
        Self::Topology {
            message: msg.into(),
        }
    }

    pub fn workspace(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Workspace {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn platform(msg: impl Into<String>) -> Self {
        Self::Platform {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether the supervision loop may continue after this error.
    ///
    /// Only a broken recording directory ends a session; everything else is
    /// scoped to a single region or a single tick.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Workspace { .. } | Self::Config { .. })
    }
}
