//! Pipeline configuration.

use vstream_media::rendition::EncodeOptions;
use vstream_media::thumbnail::DEFAULT_THUMBNAIL_COUNT;
use vstream_models::{QualityLadder, QualityProfile};

/// Pipeline configuration.
///
/// The quality ladder is configuration data here rather than a global
/// constant, so deployments can swap tiers without code changes.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Ordered quality tiers to attempt
    pub ladder: QualityLadder,
    /// Thumbnails requested per job
    pub thumbnail_count: usize,
    /// Encoder settings shared by all renditions
    pub encode: EncodeOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ladder: QualityLadder::default(),
            thumbnail_count: DEFAULT_THUMBNAIL_COUNT,
            encode: EncodeOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    ///
    /// `PIPELINE_LADDER` replaces the default ladder; the format is a
    /// comma-separated list of `name:WIDTHxHEIGHT@KBPS` entries, e.g.
    /// `360p:640x360@800,720p:1280x720@2800`.
    pub fn from_env() -> Self {
        let mut encode = EncodeOptions::default();

        if let Some(timeout) = env_parse::<u64>("PIPELINE_RENDITION_TIMEOUT_SECS") {
            encode.timeout_secs = timeout;
        }
        if let Some(seconds) = env_parse::<u32>("PIPELINE_SEGMENT_SECONDS") {
            encode.segment_seconds = seconds;
        }
        if let Ok(preset) = std::env::var("PIPELINE_PRESET") {
            if !preset.is_empty() {
                encode.preset = preset;
            }
        }
        if let Some(gop) = env_parse::<u32>("PIPELINE_GOP_FRAMES") {
            encode.gop_frames = gop;
        }

        let ladder = std::env::var("PIPELINE_LADDER")
            .ok()
            .and_then(|s| parse_ladder(&s))
            .unwrap_or_default();

        Self {
            ladder,
            thumbnail_count: env_parse("PIPELINE_THUMBNAIL_COUNT")
                .unwrap_or(DEFAULT_THUMBNAIL_COUNT),
            encode,
        }
    }

    /// Replace the quality ladder.
    pub fn with_ladder(mut self, ladder: QualityLadder) -> Self {
        self.ladder = ladder;
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

/// Parse a `name:WIDTHxHEIGHT@KBPS,...` ladder description. Any
/// malformed entry invalidates the whole string.
fn parse_ladder(s: &str) -> Option<QualityLadder> {
    let mut profiles = Vec::new();

    for entry in s.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (name, rest) = entry.split_once(':')?;
        let (resolution, bitrate) = rest.split_once('@')?;
        let (width, height) = resolution.split_once('x')?;

        profiles.push(QualityProfile::new(
            name,
            width.parse().ok()?,
            height.parse().ok()?,
            bitrate.parse().ok()?,
        ));
    }

    if profiles.is_empty() {
        None
    } else {
        Some(QualityLadder::new(profiles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.thumbnail_count, 5);
        assert_eq!(config.encode.timeout_secs, 300);
        assert_eq!(config.encode.segment_seconds, 10);
        assert_eq!(config.ladder.profiles.len(), 4);
    }

    #[test]
    fn test_parse_ladder() {
        let ladder = parse_ladder("360p:640x360@800, 720p:1280x720@2800").unwrap();
        assert_eq!(ladder.profiles.len(), 2);
        assert_eq!(ladder.profiles[0].name, "360p");
        assert_eq!(ladder.profiles[1].width, 1280);
        assert_eq!(ladder.profiles[1].height, 720);
        assert_eq!(ladder.profiles[1].bitrate_kbps, 2800);
    }

    #[test]
    fn test_parse_ladder_rejects_malformed() {
        assert!(parse_ladder("garbage").is_none());
        assert!(parse_ladder("720p:1280x720").is_none()); // missing bitrate
        assert!(parse_ladder("720p:1280@2800").is_none()); // missing height
        assert!(parse_ladder("").is_none());
    }

    #[test]
    fn test_env_ladder_override() {
        std::env::set_var("PIPELINE_LADDER", "540p:960x540@1200");
        let config = PipelineConfig::from_env();
        std::env::remove_var("PIPELINE_LADDER");

        assert_eq!(config.ladder.profiles.len(), 1);
        assert_eq!(config.ladder.profiles[0].name, "540p");
        assert_eq!(config.ladder.profiles[0].bitrate_kbps, 1200);
    }

    #[test]
    fn test_with_ladder() {
        let config = PipelineConfig::default().with_ladder(QualityLadder::new(vec![]));
        assert!(config.ladder.profiles.is_empty());
    }
}
