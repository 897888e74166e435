//! Shared data models for the VStream transcoding engine.
//!
//! This crate provides Serde-serializable types for:
//! - Job identifiers
//! - Quality profiles and the quality ladder
//! - Probed source metadata
//! - Per-rendition and per-job processing results
//! - Progress event envelopes

pub mod event;
pub mod job;
pub mod metadata;
pub mod outcome;
pub mod profile;

// Re-export common types
pub use event::ProgressUpdate;
pub use job::JobId;
pub use metadata::SourceMetadata;
pub use outcome::{ProcessingResult, RenditionOutcome, ThumbnailSet};
pub use profile::{QualityLadder, QualityProfile, ORIGINAL_PROFILE_BITRATE_KBPS};
