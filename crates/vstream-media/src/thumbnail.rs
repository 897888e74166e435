//! Thumbnail extraction.

use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use vstream_models::{JobId, ThumbnailSet};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Number of preview stills requested per job.
pub const DEFAULT_THUMBNAIL_COUNT: usize = 5;

/// Thumbnail target size.
pub const THUMBNAIL_WIDTH: u32 = 320;
pub const THUMBNAIL_HEIGHT: u32 = 180;

/// Extract `count` stills at evenly spaced timestamps.
///
/// Frame `i` (1-based) is sampled at `duration * i / (count + 1)` and
/// written as `{job_id}_thumb_{i}.jpg`. Each extraction is attempted
/// independently; a failed index is logged and skipped, so the returned
/// set may be shorter than requested. Never fails the job.
pub async fn generate_thumbnails(
    input: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    job_id: &JobId,
    duration_seconds: f64,
    count: usize,
) -> ThumbnailSet {
    let input = input.as_ref();
    let runner = FfmpegRunner::new();
    let filter = format!(
        "scale={}:{}:force_original_aspect_ratio=decrease",
        THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT
    );

    generate_thumbnails_with(
        output_dir.as_ref(),
        job_id,
        duration_seconds,
        count,
        |index, timestamp, output| {
            let cmd = FfmpegCommand::new(input, &output)
                .seek(timestamp)
                .single_frame()
                .video_filter(filter.as_str())
                .log_level("error");
            let runner = &runner;
            async move {
                runner
                    .run(&cmd)
                    .await
                    .map_err(|e| MediaError::ThumbnailFailed {
                        index,
                        message: e.to_string(),
                    })
            }
        },
    )
    .await
}

/// Extraction loop with an injectable per-frame step.
///
/// `extract` receives the 1-based index, its timestamp, and the target
/// path. An `Err` drops that index; the loop continues with the rest,
/// so the returned set stays ordered by index.
pub async fn generate_thumbnails_with<F, Fut>(
    output_dir: &Path,
    job_id: &JobId,
    duration_seconds: f64,
    count: usize,
    extract: F,
) -> ThumbnailSet
where
    F: Fn(usize, f64, PathBuf) -> Fut,
    Fut: Future<Output = MediaResult<()>>,
{
    let mut files = Vec::with_capacity(count);

    for i in 1..=count {
        let timestamp = thumbnail_timestamp(duration_seconds, i, count);
        let filename = format!("{}_thumb_{}.jpg", job_id, i);

        match extract(i, timestamp, output_dir.join(&filename)).await {
            Ok(()) => {
                debug!(job_id = %job_id, index = i, "Thumbnail written: {}", filename);
                files.push(filename);
            }
            Err(e) => {
                warn!(
                    job_id = %job_id,
                    index = i,
                    "Thumbnail extraction failed, skipping: {}", e
                );
            }
        }
    }

    ThumbnailSet::new(files)
}

/// Timestamp for thumbnail index `i` (1-based) out of `count`.
pub fn thumbnail_timestamp(duration_seconds: f64, index: usize, count: usize) -> f64 {
    duration_seconds * index as f64 / (count + 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_evenly_spaced() {
        // 30s source, 5 thumbs: 5s, 10s, 15s, 20s, 25s
        for (i, expected) in [(1, 5.0), (2, 10.0), (3, 15.0), (4, 20.0), (5, 25.0)] {
            let ts = thumbnail_timestamp(30.0, i, 5);
            assert!((ts - expected).abs() < 0.001, "index {}", i);
        }
    }

    #[test]
    fn test_timestamps_stay_inside_duration() {
        let last = thumbnail_timestamp(30.0, 5, 5);
        assert!(last < 30.0);
    }

    #[tokio::test]
    async fn test_failed_indices_are_skipped_in_order() {
        let job_id = JobId::from_string("job");

        let set = generate_thumbnails_with(
            Path::new("/tmp"),
            &job_id,
            30.0,
            5,
            |index, _timestamp, _output| async move {
                if index == 2 || index == 4 {
                    Err(MediaError::ThumbnailFailed {
                        index,
                        message: "no frame".into(),
                    })
                } else {
                    Ok(())
                }
            },
        )
        .await;

        assert_eq!(
            set.files,
            ["job_thumb_1.jpg", "job_thumb_3.jpg", "job_thumb_5.jpg"]
        );
    }

    #[tokio::test]
    async fn test_all_failures_yield_empty_set() {
        let job_id = JobId::from_string("job");

        let set = generate_thumbnails_with(
            Path::new("/tmp"),
            &job_id,
            10.0,
            3,
            |index, _timestamp, _output| async move {
                Err(MediaError::ThumbnailFailed {
                    index,
                    message: "no frame".into(),
                })
            },
        )
        .await;

        assert!(set.is_empty());
    }
}
