//! HLS rendition encoding.
//!
//! One invocation of `encode_rendition` produces one quality tier:
//! a per-rendition playlist plus its segment files, all named with the
//! `{job_id}_{tier}` prefix. The segment list is enumerated from the
//! output directory after completion rather than predicted, because
//! the count ffmpeg produces is data-dependent.

use std::path::Path;
use tracing::{info, warn};

use vstream_models::{JobId, QualityProfile, RenditionOutcome};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::progress::FfmpegProgress;

/// Encoder settings shared by all renditions of a job.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Segment duration in seconds
    pub segment_seconds: u32,
    /// Hard wall-clock limit per rendition, in seconds
    pub timeout_secs: u64,
    /// x264 preset
    pub preset: String,
    /// GOP size in frames
    pub gop_frames: u32,
    /// Audio bitrate
    pub audio_bitrate: String,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            segment_seconds: 10,
            timeout_secs: 300,
            preset: "fast".to_string(),
            gop_frames: 48,
            audio_bitrate: "128k".to_string(),
        }
    }
}

/// Playlist filename for a rendition.
pub fn playlist_name(job_id: &JobId, profile: &QualityProfile) -> String {
    format!("{}_{}.m3u8", job_id, profile.name)
}

/// Segment filename prefix for a rendition.
fn segment_prefix(job_id: &JobId, profile: &QualityProfile) -> String {
    format!("{}_{}_", job_id, profile.name)
}

/// Transcode the source into one segmented rendition.
///
/// On success the returned outcome carries the playlist name and the
/// enumerated segment list. On timeout or encoder failure the
/// rendition's partial playlist and segments are deleted and the error
/// is returned; callers treat it as non-fatal and continue with the
/// remaining tiers.
pub async fn encode_rendition<F>(
    input: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    job_id: &JobId,
    profile: &QualityProfile,
    options: &EncodeOptions,
    progress_callback: F,
) -> MediaResult<RenditionOutcome>
where
    F: Fn(FfmpegProgress) + Send + 'static,
{
    let input = input.as_ref();
    let output_dir = output_dir.as_ref();

    let playlist = playlist_name(job_id, profile);
    let playlist_path = output_dir.join(&playlist);
    let segment_pattern = output_dir.join(format!("{}%03d.ts", segment_prefix(job_id, profile)));

    info!(
        job_id = %job_id,
        profile = %profile.name,
        "Encoding rendition {} -> {}",
        profile.resolution(),
        playlist
    );

    // Downscale preserving aspect, pad to the exact tier dimensions
    let filter = format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2",
        w = profile.width,
        h = profile.height
    );

    let cmd = FfmpegCommand::new(input, &playlist_path)
        .video_filter(&filter)
        .video_codec("libx264")
        .preset(&options.preset)
        .video_bitrate_kbps(profile.bitrate_kbps)
        .gop(options.gop_frames)
        .audio_codec("aac")
        .audio_bitrate(&options.audio_bitrate)
        .hls(
            options.segment_seconds,
            segment_pattern.to_string_lossy().to_string(),
        );

    let runner = FfmpegRunner::new().with_timeout(options.timeout_secs);

    if let Err(e) = runner.run_with_progress(&cmd, progress_callback).await {
        // Broken segments must not be servable; drop everything this
        // rendition wrote before surfacing the error.
        cleanup_rendition(output_dir, job_id, profile).await;
        return Err(e);
    }

    let segments = list_segment_files(output_dir, job_id, profile).await?;
    if segments.is_empty() {
        cleanup_rendition(output_dir, job_id, profile).await;
        return Err(MediaError::encode_failed(
            format!("rendition {} produced no segments", profile.name),
            None,
            None,
        ));
    }

    info!(
        job_id = %job_id,
        profile = %profile.name,
        segments = segments.len(),
        "Rendition complete"
    );

    Ok(RenditionOutcome::success(profile.clone(), playlist, segments))
}

/// Enumerate the segment files a rendition actually wrote.
///
/// Lists `output_dir` filtered on the rendition's filename prefix and
/// the `.ts` extension, sorted; the sequence numbering in the names
/// makes lexicographic order the playback order.
pub async fn list_segment_files(
    output_dir: impl AsRef<Path>,
    job_id: &JobId,
    profile: &QualityProfile,
) -> MediaResult<Vec<String>> {
    let prefix = segment_prefix(job_id, profile);
    let mut segments = Vec::new();

    let mut entries = tokio::fs::read_dir(output_dir.as_ref()).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(&prefix) && name.ends_with(".ts") {
            segments.push(name);
        }
    }

    segments.sort();
    Ok(segments)
}

/// Best-effort removal of a failed rendition's partial output.
async fn cleanup_rendition(output_dir: &Path, job_id: &JobId, profile: &QualityProfile) {
    let playlist_path = output_dir.join(playlist_name(job_id, profile));
    if let Err(e) = tokio::fs::remove_file(&playlist_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(job_id = %job_id, "Failed to remove partial playlist: {}", e);
        }
    }

    match list_segment_files(output_dir, job_id, profile).await {
        Ok(segments) => {
            for segment in segments {
                if let Err(e) = tokio::fs::remove_file(output_dir.join(&segment)).await {
                    warn!(job_id = %job_id, "Failed to remove partial segment {}: {}", segment, e);
                }
            }
        }
        Err(e) => {
            warn!(job_id = %job_id, "Failed to enumerate partial segments: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn profile() -> QualityProfile {
        QualityProfile::new("720p", 1280, 720, 2800)
    }

    #[test]
    fn test_playlist_name() {
        let job_id = JobId::from_string("abc");
        assert_eq!(playlist_name(&job_id, &profile()), "abc_720p.m3u8");
    }

    #[tokio::test]
    async fn test_segment_enumeration_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        let job_id = JobId::from_string("abc");

        // Two segments for this rendition, one for another tier, one
        // playlist, one unrelated file
        for name in [
            "abc_720p_001.ts",
            "abc_720p_000.ts",
            "abc_480p_000.ts",
            "abc_720p.m3u8",
            "notes.txt",
        ] {
            tokio::fs::write(dir.path().join(name), b"x").await.unwrap();
        }

        let segments = list_segment_files(dir.path(), &job_id, &profile())
            .await
            .unwrap();
        assert_eq!(segments, vec!["abc_720p_000.ts", "abc_720p_001.ts"]);
    }

    #[tokio::test]
    async fn test_cleanup_removes_partial_output() {
        let dir = TempDir::new().unwrap();
        let job_id = JobId::from_string("abc");

        for name in ["abc_720p.m3u8", "abc_720p_000.ts", "abc_480p_000.ts"] {
            tokio::fs::write(dir.path().join(name), b"x").await.unwrap();
        }

        cleanup_rendition(dir.path(), &job_id, &profile()).await;

        assert!(!dir.path().join("abc_720p.m3u8").exists());
        assert!(!dir.path().join("abc_720p_000.ts").exists());
        // Sibling rendition untouched
        assert!(dir.path().join("abc_480p_000.ts").exists());
    }
}
