//! Error types for media operations.

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while remuxing, converting, injecting or packaging.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("ExifTool not found in PATH")]
    ExiftoolNotFound,

    #[error("FFmpeg remux failed: {stderr}")]
    RemuxFailed { stderr: String },

    #[error("Image conversion failed: {stderr}")]
    ConvertFailed { stderr: String },

    #[error("ExifTool injection failed: {stderr}")]
    InjectFailed { stderr: String },

    #[error("{tool} timed out after {secs} seconds")]
    Timeout { tool: String, secs: u64 },

    #[error("Bundle write failed: {0}")]
    Bundle(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a remux failure from the tool's diagnostic tail.
    pub fn remux_failed(stderr: impl Into<String>) -> Self {
        Self::RemuxFailed {
            stderr: stderr.into(),
        }
    }

    /// Create a conversion failure from the tool's diagnostic tail.
    pub fn convert_failed(stderr: impl Into<String>) -> Self {
        Self::ConvertFailed {
            stderr: stderr.into(),
        }
    }

    /// Create an injection failure from the tool's diagnostic tail.
    pub fn inject_failed(stderr: impl Into<String>) -> Self {
        Self::InjectFailed {
            stderr: stderr.into(),
        }
    }

    /// Create a bundle packaging failure.
    pub fn bundle(message: impl Into<String>) -> Self {
        Self::Bundle(message.into())
    }
}
