//! Quality profiles and the quality ladder.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::metadata::SourceMetadata;

/// Bitrate assigned to the synthetic "original" profile when the source
/// is smaller than every ladder tier.
pub const ORIGINAL_PROFILE_BITRATE_KBPS: u32 = 500;

/// One target rendition descriptor: a named resolution tier with its
/// bitrate budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QualityProfile {
    /// Tier label, e.g. "720p". Used in filenames, never in manifest
    /// resolution fields.
    pub name: String,
    /// Target width in pixels
    pub width: u32,
    /// Target height in pixels
    pub height: u32,
    /// Target video bitrate in kilobits per second
    pub bitrate_kbps: u32,
}

impl QualityProfile {
    pub fn new(name: impl Into<String>, width: u32, height: u32, bitrate_kbps: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            bitrate_kbps,
        }
    }

    /// Synthetic profile at the source's native resolution, used when no
    /// ladder tier fits the source.
    pub fn original(source: &SourceMetadata) -> Self {
        Self {
            name: "original".to_string(),
            width: source.width,
            height: source.height,
            bitrate_kbps: ORIGINAL_PROFILE_BITRATE_KBPS,
        }
    }

    /// Whether this profile fits within the source dimensions.
    pub fn fits(&self, source: &SourceMetadata) -> bool {
        self.width <= source.width && self.height <= source.height
    }

    /// Resolution formatted as `WIDTHxHEIGHT`, the form HLS clients
    /// expect in `RESOLUTION=` attributes.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

impl fmt::Display for QualityProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} @ {}k)", self.name, self.resolution(), self.bitrate_kbps)
    }
}

/// Ordered set of target tiers, ascending quality.
///
/// The ladder is configuration data injected into the pipeline rather
/// than a hard-coded constant, so deployments can carry their own tiers.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QualityLadder {
    pub profiles: Vec<QualityProfile>,
}

impl Default for QualityLadder {
    fn default() -> Self {
        Self {
            profiles: vec![
                QualityProfile::new("360p", 640, 360, 800),
                QualityProfile::new("480p", 854, 480, 1400),
                QualityProfile::new("720p", 1280, 720, 2800),
                QualityProfile::new("1080p", 1920, 1080, 5000),
            ],
        }
    }
}

impl QualityLadder {
    pub fn new(profiles: Vec<QualityProfile>) -> Self {
        Self { profiles }
    }

    /// Select the profiles to attempt for a given source.
    ///
    /// Filters the ladder to tiers no larger than the source in either
    /// dimension, preserving order. An empty result is replaced by a
    /// single synthetic profile at the source's native resolution, so a
    /// decodable source always yields at least one rendition attempt.
    pub fn select_for(&self, source: &SourceMetadata) -> Vec<QualityProfile> {
        let selected: Vec<QualityProfile> = self
            .profiles
            .iter()
            .filter(|p| p.fits(source))
            .cloned()
            .collect();

        if selected.is_empty() {
            vec![QualityProfile::original(source)]
        } else {
            selected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(width: u32, height: u32) -> SourceMetadata {
        SourceMetadata {
            duration_seconds: 30.0,
            width,
            height,
            size_bytes: 1_000_000,
            fps: 30.0,
            codec: "h264".to_string(),
        }
    }

    #[test]
    fn test_full_hd_source_gets_all_tiers() {
        let ladder = QualityLadder::default();
        let selected = ladder.select_for(&source(1920, 1080));
        let names: Vec<&str> = selected.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["360p", "480p", "720p", "1080p"]);
    }

    #[test]
    fn test_720p_source_excludes_larger_tiers() {
        let ladder = QualityLadder::default();
        let selected = ladder.select_for(&source(1280, 720));
        let names: Vec<&str> = selected.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["360p", "480p", "720p"]);
    }

    #[test]
    fn test_360p_is_lowest_common_tier() {
        let ladder = QualityLadder::default();
        for (w, h) in [(640, 360), (854, 480), (1280, 720), (3840, 2160)] {
            let selected = ladder.select_for(&source(w, h));
            assert_eq!(selected[0].name, "360p", "source {}x{}", w, h);
        }
    }

    #[test]
    fn test_tiny_source_gets_synthetic_original() {
        let ladder = QualityLadder::default();
        let selected = ladder.select_for(&source(320, 180));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "original");
        assert_eq!(selected[0].width, 320);
        assert_eq!(selected[0].height, 180);
        assert_eq!(selected[0].bitrate_kbps, ORIGINAL_PROFILE_BITRATE_KBPS);
    }

    #[test]
    fn test_both_dimensions_must_fit() {
        // Wide but short: 1920x300 only fits nothing vertically below 360
        let ladder = QualityLadder::default();
        let selected = ladder.select_for(&source(1920, 300));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "original");
    }

    #[test]
    fn test_resolution_format() {
        let p = QualityProfile::new("720p", 1280, 720, 2800);
        assert_eq!(p.resolution(), "1280x720");
    }
}
