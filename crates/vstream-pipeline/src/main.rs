//! Single-job transcoding binary.
//!
//! Usage: `vstream-pipeline <input> <output-dir> [job-id]`

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vstream_media::{check_ffmpeg, check_ffprobe};
use vstream_models::JobId;
use vstream_pipeline::{ChannelSink, PipelineConfig, VideoProcessor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("vstream=info".parse().expect("valid directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        bail!("usage: {} <input> <output-dir> [job-id]", args[0]);
    }
    let input = std::path::PathBuf::from(&args[1]);
    let output_dir = std::path::PathBuf::from(&args[2]);
    let job_id = args
        .get(3)
        .map(|s| JobId::from_string(s.clone()))
        .unwrap_or_default();

    // Fail fast before touching the input
    check_ffmpeg().context("ffmpeg is required on PATH")?;
    check_ffprobe().context("ffprobe is required on PATH")?;

    let config = PipelineConfig::from_env();
    info!("Pipeline config: {:?}", config);

    let (sink, mut rx) = ChannelSink::new(64);
    let progress_task = tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            info!(
                job_id = %update.job_id,
                percent = update.percent,
                "{}", update.message
            );
        }
    });

    let processor = VideoProcessor::with_sink(config, Arc::new(sink));
    let result = processor
        .process(&job_id, &input, &output_dir)
        .await
        .with_context(|| format!("processing {} failed", input.display()))?;

    // Dropping the processor closes the sink so the printer task ends
    drop(processor);
    progress_task.await.ok();

    if !result.is_playable() {
        bail!("job {} produced no renditions", job_id);
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
