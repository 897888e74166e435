//! Master manifest assembly.
//!
//! The master playlist declares every successful rendition with its
//! bandwidth in bits per second and its resolution as `WIDTHxHEIGHT`.
//! Clients parse the resolution attribute literally, so the numeric
//! form is required; the tier label never appears there.

use std::path::Path;
use tracing::info;

use vstream_models::{JobId, RenditionOutcome};

use crate::error::{MediaError, MediaResult};

/// Master playlist filename for a job.
pub fn master_manifest_name(job_id: &JobId) -> String {
    format!("{}_master.m3u8", job_id)
}

/// Render the master playlist text for a set of successful renditions,
/// in encounter order.
pub fn render_master_manifest(outcomes: &[RenditionOutcome]) -> String {
    let mut manifest = String::from("#EXTM3U\n#EXT-X-VERSION:3\n");

    for outcome in outcomes {
        manifest.push_str(&format!(
            "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={}\n{}\n",
            outcome.actual_bitrate_kbps as u64 * 1000,
            outcome.profile.resolution(),
            outcome.playlist_file,
        ));
    }

    manifest
}

/// Write the master playlist and return its filename.
///
/// Must only be called with at least one successful rendition. The
/// output directory is created defensively first; the write itself
/// failing is fatal to the job.
pub async fn build_master_manifest(
    outcomes: &[RenditionOutcome],
    output_dir: impl AsRef<Path>,
    job_id: &JobId,
) -> MediaResult<String> {
    debug_assert!(!outcomes.is_empty());
    let output_dir = output_dir.as_ref();

    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| MediaError::ManifestWrite(format!("{}: {}", output_dir.display(), e)))?;

    let filename = master_manifest_name(job_id);
    let path = output_dir.join(&filename);
    let manifest = render_master_manifest(outcomes);

    tokio::fs::write(&path, manifest.as_bytes())
        .await
        .map_err(|e| MediaError::ManifestWrite(format!("{}: {}", path.display(), e)))?;

    info!(
        job_id = %job_id,
        renditions = outcomes.len(),
        "Master manifest written: {}", filename
    );

    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vstream_models::QualityProfile;

    fn outcome(name: &str, w: u32, h: u32, kbps: u32) -> RenditionOutcome {
        RenditionOutcome::success(
            QualityProfile::new(name, w, h, kbps),
            format!("job_{}.m3u8", name),
            vec![format!("job_{}_000.ts", name)],
        )
    }

    #[test]
    fn test_bandwidth_is_kbps_times_1000() {
        let manifest = render_master_manifest(&[outcome("720p", 1280, 720, 2800)]);
        assert!(manifest.contains("BANDWIDTH=2800000"));
    }

    #[test]
    fn test_resolution_is_numeric_not_tier_label() {
        let manifest = render_master_manifest(&[outcome("720p", 1280, 720, 2800)]);
        assert!(manifest.contains("RESOLUTION=1280x720"));
        assert!(!manifest.contains("RESOLUTION=720p"));
    }

    #[test]
    fn test_entries_in_encounter_order() {
        let manifest = render_master_manifest(&[
            outcome("360p", 640, 360, 800),
            outcome("1080p", 1920, 1080, 5000),
        ]);
        let first = manifest.find("job_360p.m3u8").unwrap();
        let second = manifest.find("job_1080p.m3u8").unwrap();
        assert!(first < second);
        assert!(manifest.starts_with("#EXTM3U\n#EXT-X-VERSION:3\n"));
    }

    #[tokio::test]
    async fn test_write_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("hls");
        let job_id = JobId::from_string("job");

        let name = build_master_manifest(&[outcome("360p", 640, 360, 800)], &nested, &job_id)
            .await
            .unwrap();

        assert_eq!(name, "job_master.m3u8");
        let written = tokio::fs::read_to_string(nested.join(&name)).await.unwrap();
        assert!(written.contains("BANDWIDTH=800000"));
    }

    #[tokio::test]
    async fn test_identical_outcomes_render_identical_manifests() {
        let outcomes = vec![outcome("360p", 640, 360, 800), outcome("720p", 1280, 720, 2800)];
        assert_eq!(
            render_master_manifest(&outcomes),
            render_master_manifest(&outcomes)
        );
    }
}
