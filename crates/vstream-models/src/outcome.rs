//! Per-rendition and per-job processing results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::metadata::SourceMetadata;
use crate::profile::QualityProfile;

/// Result of one rendition encode attempt.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RenditionOutcome {
    /// The profile that was encoded
    pub profile: QualityProfile,
    /// Per-rendition playlist filename (relative to the HLS directory)
    pub playlist_file: String,
    /// Segment filenames actually written, enumerated after completion
    pub segment_files: Vec<String>,
    /// Bitrate declared in the master manifest, in kbps
    pub actual_bitrate_kbps: u32,
    /// Whether the encode completed
    pub succeeded: bool,
    /// Failure description for unsuccessful attempts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RenditionOutcome {
    /// Successful outcome with its enumerated segment list.
    pub fn success(
        profile: QualityProfile,
        playlist_file: impl Into<String>,
        segment_files: Vec<String>,
    ) -> Self {
        let actual_bitrate_kbps = profile.bitrate_kbps;
        Self {
            profile,
            playlist_file: playlist_file.into(),
            segment_files,
            actual_bitrate_kbps,
            succeeded: true,
            error: None,
        }
    }

    /// Failed outcome. Recorded for logging; never included in the
    /// final result's rendition list.
    pub fn failure(profile: QualityProfile, error: impl Into<String>) -> Self {
        let actual_bitrate_kbps = profile.bitrate_kbps;
        Self {
            profile,
            playlist_file: String::new(),
            segment_files: Vec::new(),
            actual_bitrate_kbps,
            succeeded: false,
            error: Some(error.into()),
        }
    }
}

/// Ordered set of generated thumbnail filenames.
///
/// May be shorter than the requested count when individual extractions
/// fail; thumbnail failures never fail the job.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ThumbnailSet {
    pub files: Vec<String>,
}

impl ThumbnailSet {
    pub fn new(files: Vec<String>) -> Self {
        Self { files }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// First thumbnail, used as the poster image.
    pub fn poster(&self) -> Option<&str> {
        self.files.first().map(String::as_str)
    }
}

/// The sole artifact handed back to the caller for one job.
///
/// Immutable after return; the caller decides what to persist. An empty
/// `renditions` list is the job-level failure condition callers must
/// detect, even though the pipeline returns it without an error.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProcessingResult {
    /// Probed source metadata
    pub metadata: SourceMetadata,
    /// Successful renditions only, in ladder order
    pub renditions: Vec<RenditionOutcome>,
    /// Generated thumbnails (possibly empty)
    pub thumbnails: ThumbnailSet,
    /// Poster image filename (first thumbnail)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_file: Option<String>,
    /// Master playlist filename; present iff `renditions` is non-empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_playlist_file: Option<String>,
}

impl ProcessingResult {
    /// Whether at least one rendition succeeded.
    pub fn is_playable(&self) -> bool {
        !self.renditions.is_empty()
    }
}
