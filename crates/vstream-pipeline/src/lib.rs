//! Adaptive-bitrate processing pipeline.
//!
//! This crate provides:
//! - The job orchestrator: probe, ladder selection, rendition loop,
//!   thumbnails, master manifest
//! - Progress sink abstraction with monotonic band mapping
//! - Structured job logging
//! - Env-driven configuration

pub mod config;
pub mod error;
pub mod logging;
pub mod processor;
pub mod progress;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::JobLogger;
pub use processor::VideoProcessor;
pub use progress::{ChannelSink, NullSink, ProgressReporter, ProgressSink};
