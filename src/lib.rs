//! dubsync: timeline-aligned dub synthesis.
//!
//! The library transcribes a video's speech into timestamped segments,
//! translates each segment, synthesizes speech for the translation, and
//! re-places the synthesized clips onto the original timeline so the dubbed
//! audio matches the video's duration exactly and no clip bleeds into the
//! next segment's window.
//!
//! Speech-to-text, translation, speech synthesis and container muxing are
//! external collaborators behind traits; the timing logic lives in
//! [`timeline`].

pub mod config;
pub mod error;
pub mod job;
pub mod media;
pub mod pipeline;
pub mod progress;
pub mod segment;
pub mod services;
pub mod timeline;

use std::path::{Path, PathBuf};

pub use config::{DubSyncConfig, RetryPolicy, TtsModel, TtsVoice};
pub use error::{DubSyncError, Result};
pub use job::{JobQueue, JobState, JobStatus};
pub use pipeline::{DubRequest, DubSync};
pub use progress::{DubProgress, PipelineStage};

/// Dub one video with the OpenAI-backed collaborators and default settings
pub async fn dub_video(
    video_path: &Path,
    output_path: &Path,
    source_lang: &str,
    target_lang: &str,
    openai_api_key: &str,
) -> Result<PathBuf> {
    let config = DubSyncConfig {
        openai_api_key: openai_api_key.to_string(),
        ..DubSyncConfig::default()
    };

    let pipeline = DubSync::with_openai(config)?;
    pipeline
        .process(
            &DubRequest {
                video_path: video_path.to_path_buf(),
                source_lang: source_lang.to_string(),
                target_lang: target_lang.to_string(),
                output_path: output_path.to_path_buf(),
            },
            None,
        )
        .await
}

/// Same as [`dub_video`], reporting progress over the given channel
pub async fn dub_video_with_progress(
    video_path: &Path,
    output_path: &Path,
    source_lang: &str,
    target_lang: &str,
    openai_api_key: &str,
    progress: tokio::sync::mpsc::Sender<DubProgress>,
) -> Result<PathBuf> {
    let config = DubSyncConfig {
        openai_api_key: openai_api_key.to_string(),
        ..DubSyncConfig::default()
    };

    let pipeline = DubSync::with_openai(config)?;
    pipeline
        .process(
            &DubRequest {
                video_path: video_path.to_path_buf(),
                source_lang: source_lang.to_string(),
                target_lang: target_lang.to_string(),
                output_path: output_path.to_path_buf(),
            },
            Some(progress),
        )
        .await
}
