//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
///
/// Probe and manifest errors are fatal to the job; encode timeouts and
/// failures drop only the affected rendition, and thumbnail errors drop
/// only the affected frame.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("Probe failed: {message}")]
    ProbeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("No decodable video stream: {0}")]
    InvalidSource(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Encode failed: {message}")]
    EncodeFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Encode timed out after {0} seconds")]
    Timeout(u64),

    #[error("Thumbnail {index} extraction failed: {message}")]
    ThumbnailFailed { index: usize, message: String },

    #[error("Manifest write failed: {0}")]
    ManifestWrite(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create a probe failure error.
    pub fn probe_failed(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ProbeFailed {
            message: message.into(),
            stderr,
        }
    }

    /// Create an encode failure error.
    pub fn encode_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::EncodeFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Whether this error is fatal to the whole job rather than to one
    /// rendition or thumbnail.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MediaError::FfmpegNotFound
                | MediaError::FfprobeNotFound
                | MediaError::ProbeFailed { .. }
                | MediaError::InvalidSource(_)
                | MediaError::FileNotFound(_)
                | MediaError::ManifestWrite(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality_classification() {
        assert!(MediaError::probe_failed("bad file", None).is_fatal());
        assert!(MediaError::ManifestWrite("disk full".into()).is_fatal());
        assert!(!MediaError::Timeout(300).is_fatal());
        assert!(!MediaError::encode_failed("x264 error", None, Some(1)).is_fatal());
        assert!(!MediaError::ThumbnailFailed {
            index: 2,
            message: "no frame".into()
        }
        .is_fatal());
    }
}
