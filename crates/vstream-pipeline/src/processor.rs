//! Job orchestration.
//!
//! One call to [`VideoProcessor::process`] runs a full job: probe the
//! source (fatal on failure), select the quality ladder, generate
//! thumbnails concurrently with the sequential rendition loop, then
//! assemble the master manifest from whichever renditions succeeded.

use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use vstream_media::manifest::build_master_manifest;
use vstream_media::probe::probe_source;
use vstream_media::rendition::encode_rendition;
use vstream_media::thumbnail::generate_thumbnails;
use vstream_media::MediaError;
use vstream_models::{JobId, ProcessingResult, RenditionOutcome, ThumbnailSet};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::JobLogger;
use crate::progress::{
    NullSink, ProgressReporter, ProgressSink, PACKAGING_BAND_END, PROBE_BAND_END,
    RENDITION_BAND_END,
};

/// Subdirectory of the job's output directory holding all artifacts.
pub const HLS_SUBDIR: &str = "hls";

/// The processing orchestrator.
///
/// Each job runs as an independent unit of concurrency; the output
/// directory is exclusively owned by the job, so no cross-job locking
/// is needed.
pub struct VideoProcessor {
    config: PipelineConfig,
    sink: Arc<dyn ProgressSink>,
}

impl VideoProcessor {
    /// Create a processor that discards progress events.
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_sink(config, Arc::new(NullSink))
    }

    /// Create a processor with an injected progress sink.
    pub fn with_sink(config: PipelineConfig, sink: Arc<dyn ProgressSink>) -> Self {
        Self { config, sink }
    }

    /// Process one source file into renditions, thumbnails and a
    /// master manifest under `output_dir/hls/`.
    ///
    /// Probe failure aborts before anything is written. Individual
    /// rendition and thumbnail failures are logged and omitted. A
    /// result with zero renditions is returned normally; callers must
    /// treat it as a job-level failure.
    pub async fn process(
        &self,
        job_id: &JobId,
        input: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
    ) -> PipelineResult<ProcessingResult> {
        let input = input.as_ref();
        let output_dir = output_dir.as_ref();

        let logger = JobLogger::new(job_id, "transcode");
        let reporter = Arc::new(ProgressReporter::new(self.sink.clone(), job_id.clone()));

        logger.log_start(&format!("processing {}", input.display()));
        reporter.report(0, "Probing source");

        // Fatal dependency for everything else; nothing has been
        // written yet when this fails.
        let metadata = match probe_source(input).await {
            Ok(meta) => meta,
            Err(e) => {
                logger.log_error(&format!("probe failed: {}", e));
                reporter.error(format!("Probe failed: {}", e));
                return Err(PipelineError::Probe(e));
            }
        };

        reporter.report(
            PROBE_BAND_END,
            format!(
                "Source is {}x{}, {:.1}s",
                metadata.width, metadata.height, metadata.duration_seconds
            ),
        );

        let profiles = self.config.ladder.select_for(&metadata);
        logger.log_progress(&format!(
            "attempting {} renditions: {}",
            profiles.len(),
            profiles
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));

        let hls_dir = output_dir.join(HLS_SUBDIR);
        tokio::fs::create_dir_all(&hls_dir).await?;

        // Thumbnails are cheap compared to encodes and run on their own
        // track; the rendition loop stays sequential so only one
        // ffmpeg encode competes for the machine at a time.
        let thumb_handle = {
            let input = input.to_path_buf();
            let hls_dir = hls_dir.clone();
            let job_id = job_id.clone();
            let duration = metadata.duration_seconds;
            let count = self.config.thumbnail_count;
            tokio::spawn(async move {
                generate_thumbnails(&input, &hls_dir, &job_id, duration, count).await
            })
        };

        let total = profiles.len();
        let duration_ms = metadata.duration_ms();
        let mut renditions: Vec<RenditionOutcome> = Vec::with_capacity(total);
        let mut failed: Vec<RenditionOutcome> = Vec::new();

        for (index, profile) in profiles.iter().enumerate() {
            let progress_reporter = reporter.clone();
            let profile_name = profile.name.clone();
            let on_progress = move |p: vstream_media::FfmpegProgress| {
                progress_reporter.rendition(
                    index,
                    total,
                    p.percentage(duration_ms),
                    format!("Encoding {}", profile_name),
                );
            };

            match encode_rendition(input, &hls_dir, job_id, profile, &self.config.encode, on_progress)
                .await
            {
                Ok(outcome) => {
                    logger.log_progress(&format!(
                        "rendition {} done ({} segments)",
                        profile.name,
                        outcome.segment_files.len()
                    ));
                    renditions.push(outcome);
                }
                Err(e @ (MediaError::Timeout(_) | MediaError::EncodeFailed { .. })) => {
                    // Non-fatal: drop this tier, keep the others
                    logger.log_warning(&format!("rendition {} failed: {}", profile.name, e));
                    failed.push(RenditionOutcome::failure(profile.clone(), e.to_string()));
                }
                Err(e) => {
                    logger.log_error(&format!("unexpected encode error: {}", e));
                    reporter.error(format!("Processing failed: {}", e));
                    thumb_handle.abort();
                    return Err(PipelineError::Media(e));
                }
            }

            reporter.rendition(index + 1, total, 0.0, format!("Finished {}", profile.name));
        }

        if !failed.is_empty() {
            warn!(
                job_id = %job_id,
                "{} of {} renditions dropped: {}",
                failed.len(),
                total,
                failed
                    .iter()
                    .map(|o| o.profile.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        reporter.report(RENDITION_BAND_END, "Renditions complete");

        let thumbnails = match thumb_handle.await {
            Ok(set) => set,
            Err(e) => {
                logger.log_warning(&format!("thumbnail task failed: {}", e));
                ThumbnailSet::default()
            }
        };
        reporter.report(
            (RENDITION_BAND_END + PACKAGING_BAND_END) / 2,
            format!("Generated {} thumbnails", thumbnails.len()),
        );

        let master_playlist_file = if renditions.is_empty() {
            // Job-level failure, but not an exception: the caller
            // detects the empty rendition list and marks the record.
            logger.log_error("no renditions succeeded");
            reporter.error("No renditions could be produced");
            None
        } else {
            let name = build_master_manifest(&renditions, &hls_dir, job_id)
                .await
                .map_err(|e| {
                    logger.log_error(&format!("manifest write failed: {}", e));
                    reporter.error(format!("Manifest write failed: {}", e));
                    PipelineError::Manifest(e)
                })?;
            reporter.report(PACKAGING_BAND_END, "Master manifest written");
            Some(name)
        };

        let poster_file = thumbnails.poster().map(String::from);
        let result = ProcessingResult {
            metadata,
            renditions,
            thumbnails,
            poster_file,
            master_playlist_file,
        };

        if result.is_playable() {
            logger.log_completion(&format!(
                "{} renditions, {} thumbnails",
                result.renditions.len(),
                result.thumbnails.len()
            ));
            reporter.done("Processing complete");
        }

        Ok(result)
    }
}

impl std::fmt::Debug for VideoProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoProcessor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
