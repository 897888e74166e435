//! FFmpeg CLI wrapper for adaptive-bitrate transcoding.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Hard wall-clock timeouts with forced subprocess termination
//! - Source probing via ffprobe
//! - HLS rendition encoding with post-hoc segment enumeration
//! - Thumbnail extraction
//! - Master manifest assembly

pub mod command;
pub mod error;
pub mod manifest;
pub mod probe;
pub mod progress;
pub mod rendition;
pub mod thumbnail;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use manifest::{build_master_manifest, master_manifest_name, render_master_manifest};
pub use probe::probe_source;
pub use progress::FfmpegProgress;
pub use rendition::{encode_rendition, list_segment_files, EncodeOptions};
pub use thumbnail::{generate_thumbnails, generate_thumbnails_with, DEFAULT_THUMBNAIL_COUNT};
