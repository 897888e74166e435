//! Progress event envelopes.
//!
//! Events are delivered to an injected sink; delivery is best-effort
//! and consumers must not treat them as authoritative. Only the
//! returned `ProcessingResult` is.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::job::JobId;

/// Percent value signalling an error state to subscribers.
pub const PROGRESS_ERROR: i8 = -1;

/// One progress event for a job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProgressUpdate {
    /// Job this event belongs to
    pub job_id: JobId,
    /// 0-100, or -1 for error
    pub percent: i8,
    /// Human-readable status line
    pub message: String,
    /// Emission timestamp
    pub timestamp: DateTime<Utc>,
}

impl ProgressUpdate {
    pub fn new(job_id: &JobId, percent: i8, message: impl Into<String>) -> Self {
        Self {
            job_id: job_id.clone(),
            percent,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Progress update at a given percent.
    pub fn progress(job_id: &JobId, percent: i8, message: impl Into<String>) -> Self {
        Self::new(job_id, percent.clamp(0, 100), message)
    }

    /// Terminal success event.
    pub fn done(job_id: &JobId, message: impl Into<String>) -> Self {
        Self::new(job_id, 100, message)
    }

    /// Error event (percent -1).
    pub fn error(job_id: &JobId, message: impl Into<String>) -> Self {
        Self::new(job_id, PROGRESS_ERROR, message)
    }

    pub fn is_error(&self) -> bool {
        self.percent == PROGRESS_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_clamps_range() {
        let id = JobId::from_string("j");
        assert_eq!(ProgressUpdate::progress(&id, 127, "x").percent, 100);
        assert_eq!(ProgressUpdate::progress(&id, -5, "x").percent, 0);
    }

    #[test]
    fn test_error_event() {
        let id = JobId::from_string("j");
        let ev = ProgressUpdate::error(&id, "probe failed");
        assert!(ev.is_error());
        assert_eq!(ev.percent, PROGRESS_ERROR);
    }
}
