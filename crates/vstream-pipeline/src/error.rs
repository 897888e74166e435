//! Pipeline error types.

use thiserror::Error;

use vstream_media::MediaError;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that abort a whole job.
///
/// Per-rendition and per-thumbnail failures never surface here; they
/// are logged and converted into omission from the result. Only probe
/// failure, manifest I/O failure and unexpected orchestration errors
/// reach the caller.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Probe failed: {0}")]
    Probe(#[source] MediaError),

    #[error("Manifest build failed: {0}")]
    Manifest(#[source] MediaError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Whether the job failed before producing any artifacts.
    pub fn is_probe_failure(&self) -> bool {
        matches!(self, PipelineError::Probe(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_classification() {
        let err = PipelineError::Probe(MediaError::probe_failed("bad", None));
        assert!(err.is_probe_failure());
        assert!(!PipelineError::Media(MediaError::Timeout(300)).is_probe_failure());
    }
}
