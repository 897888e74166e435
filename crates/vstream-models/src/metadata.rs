//! Probed source metadata.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Metadata extracted from the source file before any processing.
///
/// Produced once per job by the probe and read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SourceMetadata {
    /// Duration in seconds
    pub duration_seconds: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// File size in bytes
    pub size_bytes: u64,
    /// Frame rate (fps)
    #[serde(default)]
    pub fps: f64,
    /// Video codec name as reported by the probe
    #[serde(default)]
    pub codec: String,
}

impl SourceMetadata {
    /// Duration in milliseconds, for progress arithmetic.
    pub fn duration_ms(&self) -> i64 {
        (self.duration_seconds * 1000.0) as i64
    }
}
