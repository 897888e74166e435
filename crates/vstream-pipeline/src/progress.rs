//! Progress sinks and band mapping.
//!
//! The orchestrator emits progress to an injected sink. Delivery is
//! fire-and-forget: sinks must never block the pipeline, and consumers
//! must not rely on receiving every event (or on seeing 100%); only the
//! returned `ProcessingResult` is authoritative.

use std::sync::atomic::{AtomicI8, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use vstream_models::{JobId, ProgressUpdate};

/// Percent at which the metadata band ends.
pub const PROBE_BAND_END: i8 = 10;
/// Percent at which the rendition band ends.
pub const RENDITION_BAND_END: i8 = 85;
/// Percent at which the thumbnail/manifest band ends.
pub const PACKAGING_BAND_END: i8 = 95;

/// Destination for progress events.
pub trait ProgressSink: Send + Sync {
    /// Deliver one update. Must not block; dropping the update is
    /// acceptable.
    fn emit(&self, update: ProgressUpdate);
}

/// Sink that discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _update: ProgressUpdate) {}
}

/// Sink backed by a bounded tokio channel.
///
/// Uses `try_send`; when the consumer lags or has gone away the update
/// is dropped, keeping the producer non-blocking.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<ProgressUpdate>,
}

impl ChannelSink {
    /// Create a sink and its receiving end.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ProgressUpdate>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, update: ProgressUpdate) {
        if let Err(e) = self.tx.try_send(update) {
            debug!("Progress update dropped: {}", e);
        }
    }
}

/// Per-job reporter enforcing monotonically non-decreasing percent.
///
/// Sub-tasks run out of strict order, so raw percents could regress;
/// the reporter suppresses anything below the high-water mark. Error
/// events (percent -1) bypass the guard.
pub struct ProgressReporter {
    sink: Arc<dyn ProgressSink>,
    job_id: JobId,
    high_water: AtomicI8,
}

impl ProgressReporter {
    pub fn new(sink: Arc<dyn ProgressSink>, job_id: JobId) -> Self {
        Self {
            sink,
            job_id,
            high_water: AtomicI8::new(0),
        }
    }

    /// Emit a progress update if it does not regress.
    pub fn report(&self, percent: i8, message: impl Into<String>) {
        let percent = percent.clamp(0, 100);
        let previous = self.high_water.fetch_max(percent, Ordering::SeqCst);
        if percent >= previous {
            self.sink
                .emit(ProgressUpdate::progress(&self.job_id, percent, message));
        }
    }

    /// Emit in-flight progress for one rendition, mapped into the
    /// rendition band.
    pub fn rendition(&self, index: usize, total: usize, within_percent: f64, message: impl Into<String>) {
        self.report(rendition_percent(index, total, within_percent), message);
    }

    /// Emit a terminal success event at 100%.
    pub fn done(&self, message: impl Into<String>) {
        self.report(100, message);
    }

    /// Emit an error event (percent -1).
    pub fn error(&self, message: impl Into<String>) {
        self.sink.emit(ProgressUpdate::error(&self.job_id, message));
    }
}

/// Map (rendition index, in-rendition percent) into the job's overall
/// percent range. The rendition band is split evenly across attempted
/// profiles.
pub fn rendition_percent(index: usize, total: usize, within_percent: f64) -> i8 {
    let total = total.max(1);
    let span = (RENDITION_BAND_END - PROBE_BAND_END) as f64;
    let fraction = (index as f64 + (within_percent / 100.0).clamp(0.0, 1.0)) / total as f64;
    let percent = PROBE_BAND_END as f64 + span * fraction.clamp(0.0, 1.0);
    percent.round() as i8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendition_percent_bounds() {
        assert_eq!(rendition_percent(0, 4, 0.0), 10);
        assert_eq!(rendition_percent(4, 4, 0.0), 85);
        assert_eq!(rendition_percent(3, 4, 100.0), 85);
        // Halfway through the second of four renditions
        let mid = rendition_percent(1, 4, 50.0);
        assert!(mid > 10 && mid < 85);
    }

    #[test]
    fn test_rendition_percent_even_split() {
        // Four renditions split 10..85 into ~18.75 point slices
        let ends: Vec<i8> = (1..=4).map(|i| rendition_percent(i, 4, 0.0)).collect();
        assert_eq!(ends, vec![29, 48, 66, 85]);
    }

    #[tokio::test]
    async fn test_reporter_is_monotonic() {
        let (sink, mut rx) = ChannelSink::new(16);
        let reporter = ProgressReporter::new(Arc::new(sink), JobId::from_string("j"));

        reporter.report(10, "probe");
        reporter.report(50, "encode");
        reporter.report(30, "late straggler");
        reporter.done("done");
        drop(reporter);

        let mut seen = Vec::new();
        while let Some(update) = rx.recv().await {
            seen.push(update.percent);
        }
        assert_eq!(seen, vec![10, 50, 100]);
    }

    #[tokio::test]
    async fn test_error_bypasses_monotonic_guard() {
        let (sink, mut rx) = ChannelSink::new(16);
        let reporter = ProgressReporter::new(Arc::new(sink), JobId::from_string("j"));

        reporter.report(60, "encode");
        reporter.error("probe failed");
        drop(reporter);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.percent, 60);
        assert!(second.is_error());
    }

    #[tokio::test]
    async fn test_channel_sink_drops_when_full() {
        let (sink, mut rx) = ChannelSink::new(1);
        let job_id = JobId::from_string("j");

        sink.emit(ProgressUpdate::progress(&job_id, 1, "a"));
        sink.emit(ProgressUpdate::progress(&job_id, 2, "b")); // dropped

        assert_eq!(rx.recv().await.unwrap().percent, 1);
        assert!(rx.try_recv().is_err());
    }
}
