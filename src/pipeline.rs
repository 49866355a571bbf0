//! End-to-end processing of one dubbing job.
//!
//! One job occupies the pipeline from start to a terminal state; stages run
//! strictly left to right with no feedback loops. Per-segment translation
//! and synthesis are dispatched concurrently with bounded parallelism; the
//! first unrecovered failure aborts the in-flight siblings and fails the
//! whole job. There is no partial success.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::mpsc::Sender;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::DubSyncConfig;
use crate::error::{DubSyncError, Result};
use crate::media::{AudioSource, FfmpegEngine, MediaEngine};
use crate::progress::{report, DubProgress, PipelineStage};
use crate::segment::{normalize_segments, Segment, SynthesizedClip, TranslatedSegment};
use crate::services::retry::with_retry;
use crate::services::transcription::OpenAiTranscriber;
use crate::services::translation::OpenAiTranslator;
use crate::services::tts::OpenAiSynthesizer;
use crate::services::{Synthesizer, Transcriber, Translator};
use crate::timeline::{align, build, AlignmentConfig, PlacedClip};

/// One dubbing job
#[derive(Debug, Clone)]
pub struct DubRequest {
    /// Source video
    pub video_path: PathBuf,
    /// Source language code, or "auto"
    pub source_lang: String,
    /// Target language code
    pub target_lang: String,
    /// Where the dubbed video is written
    pub output_path: PathBuf,
}

/// The dubbing pipeline, holding its configuration and collaborator
/// handles. Constructed once and shared; collaborators are never global.
pub struct DubSync {
    config: DubSyncConfig,
    transcriber: Arc<dyn Transcriber>,
    translator: Arc<dyn Translator>,
    synthesizer: Arc<dyn Synthesizer>,
    media: Arc<dyn MediaEngine>,
}

impl DubSync {
    /// Build a pipeline from explicit collaborator handles
    pub fn new(
        config: DubSyncConfig,
        transcriber: Arc<dyn Transcriber>,
        translator: Arc<dyn Translator>,
        synthesizer: Arc<dyn Synthesizer>,
        media: Arc<dyn MediaEngine>,
    ) -> Self {
        Self {
            config,
            transcriber,
            translator,
            synthesizer,
            media,
        }
    }

    /// Build a pipeline backed by the OpenAI APIs and a local ffmpeg
    pub fn with_openai(config: DubSyncConfig) -> Result<Self> {
        let transcriber = Arc::new(OpenAiTranscriber::new(&config)?);
        let translator = Arc::new(OpenAiTranslator::new(&config)?);
        let synthesizer = Arc::new(OpenAiSynthesizer::new(&config)?);
        let media = Arc::new(FfmpegEngine::new()?);

        Ok(Self::new(config, transcriber, translator, synthesizer, media))
    }

    pub fn config(&self) -> &DubSyncConfig {
        &self.config
    }

    /// Process one job to completion, returning the output media path
    pub async fn process(
        &self,
        request: &DubRequest,
        progress: Option<Sender<DubProgress>>,
    ) -> Result<PathBuf> {
        info!(
            "Starting dubbing job: {} -> {} ({} -> {})",
            request.video_path.display(),
            request.output_path.display(),
            request.source_lang,
            request.target_lang
        );

        if !is_supported_input(&request.video_path) {
            return Err(DubSyncError::Ingestion(format!(
                "unsupported input container: {}",
                request.video_path.display()
            )));
        }
        if tokio::fs::metadata(&request.video_path).await.is_err() {
            let msg = format!("input video not found: {}", request.video_path.display());
            error!("{}", msg);
            return Err(DubSyncError::FileNotFound(msg));
        }

        // Scratch area for the audio extract and the composite track;
        // removed best-effort once the job reaches a terminal state
        let scratch = tempfile::tempdir()?;

        // 1. Extract audio and learn the master duration
        report(&progress, PipelineStage::Extracting, 0.0, "Extracting audio").await;
        let extract_path = scratch.path().join("source_audio.wav");
        let master_duration = self
            .media
            .extract_audio(&request.video_path, &extract_path, self.config.sample_rate)
            .await?;
        report(&progress, PipelineStage::Extracting, 100.0, "Audio extracted").await;

        // 2. Transcribe and normalize; collaborator output is not trusted
        report(&progress, PipelineStage::Transcribing, 0.0, "Transcribing").await;
        let raw_segments = with_retry(&self.config.retry, "transcription", || {
            self.transcriber
                .transcribe(&extract_path, &request.source_lang)
        })
        .await?;
        let segments = normalize_segments(raw_segments)?;
        report(
            &progress,
            PipelineStage::Transcribing,
            100.0,
            format!("{} segments", segments.len()),
        )
        .await;

        // No speech at all is a success: keep the original audio untouched
        // instead of installing a silent track
        if segments.is_empty() {
            warn!("No speech segments detected, passing original audio through");
            report(&progress, PipelineStage::Muxing, 0.0, "Passing audio through").await;
            let output = self
                .media
                .remux(
                    &request.video_path,
                    AudioSource::Passthrough,
                    &request.output_path,
                )
                .await?;
            report(&progress, PipelineStage::Muxing, 100.0, "Done").await;
            if !self.config.cleanup_temp_files {
                let _ = scratch.keep();
            }
            return Ok(output);
        }

        // 3. Translate and synthesize every segment
        let clips = self
            .synthesize_segments(&segments, request, &progress)
            .await?;

        // 4. Align each clip into its segment window, in segment order
        report(&progress, PipelineStage::Compositing, 0.0, "Aligning clips").await;
        let placed = self.align_clips(&segments, clips)?;

        // 5. Assemble the composite track and write it out
        let composite = build(&placed, master_duration, self.config.sample_rate)?;
        let track_path = scratch.path().join("dubbed_audio.wav");
        crate::media::wav::write_wav_mono(&track_path, &composite.samples, composite.sample_rate)?;
        report(&progress, PipelineStage::Compositing, 100.0, "Composite built").await;

        // 6. Replace the audio track, leaving the video stream untouched
        report(&progress, PipelineStage::Muxing, 0.0, "Muxing output").await;
        let output = self
            .media
            .remux(
                &request.video_path,
                AudioSource::Track(track_path),
                &request.output_path,
            )
            .await?;
        report(&progress, PipelineStage::Muxing, 100.0, "Done").await;

        if !self.config.cleanup_temp_files {
            let _ = scratch.keep();
        }

        info!("Dubbing job completed: {}", output.display());
        Ok(output)
    }

    /// Translate and synthesize all segments with bounded parallelism.
    ///
    /// Completion order is irrelevant; results are re-sorted by segment
    /// index. The first failure aborts every in-flight sibling.
    async fn synthesize_segments(
        &self,
        segments: &[Segment],
        request: &DubRequest,
        progress: &Option<Sender<DubProgress>>,
    ) -> Result<Vec<SynthesizedClip>> {
        let total = segments.len();
        report(
            progress,
            PipelineStage::Translating,
            0.0,
            format!("Dispatching {} segments", total),
        )
        .await;

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_requests.max(1)));
        let mut tasks: JoinSet<Result<SynthesizedClip>> = JoinSet::new();

        for (index, segment) in segments.iter().enumerate() {
            let semaphore = semaphore.clone();
            let translator = self.translator.clone();
            let synthesizer = self.synthesizer.clone();
            let retry = self.config.retry.clone();
            let segment = segment.clone();
            let source_lang = request.source_lang.clone();
            let target_lang = request.target_lang.clone();

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|e| DubSyncError::Other(e.to_string()))?;

                let translated = with_retry(&retry, "translation", || {
                    translator.translate(&segment.text, &source_lang, &target_lang)
                })
                .await?;

                // Translation keeps the segment's timing untouched
                let translated_segment = TranslatedSegment {
                    segment,
                    translated_text: translated,
                };

                let buffer = with_retry(&retry, "synthesis", || {
                    synthesizer.synthesize(&translated_segment.translated_text, &target_lang)
                })
                .await?;

                Ok(SynthesizedClip {
                    source_segment_index: index,
                    buffer,
                })
            });
        }

        let mut clips = Vec::with_capacity(total);
        let mut failure: Option<DubSyncError> = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(clip)) => {
                    clips.push(clip);
                    report(
                        progress,
                        PipelineStage::Synthesizing,
                        clips.len() as f32 / total as f32 * 100.0,
                        format!("Synthesized {}/{} segments", clips.len(), total),
                    )
                    .await;
                }
                Ok(Err(e)) => {
                    // Fail fast: cancel in-flight siblings to free quota
                    error!("Segment failed, cancelling remaining work: {}", e);
                    tasks.abort_all();
                    failure = Some(e);
                    break;
                }
                Err(e) if e.is_cancelled() => continue,
                Err(e) => {
                    tasks.abort_all();
                    failure = Some(DubSyncError::Other(format!("segment task failed: {}", e)));
                    break;
                }
            }
        }

        if let Some(e) = failure {
            return Err(e);
        }

        clips.sort_by_key(|c| c.source_segment_index);
        Ok(clips)
    }

    /// Map every synthesized clip onto the master timeline
    fn align_clips(
        &self,
        segments: &[Segment],
        clips: Vec<SynthesizedClip>,
    ) -> Result<Vec<PlacedClip>> {
        let alignment = AlignmentConfig {
            guard: self.config.guard_interval,
            fade_out: self.config.fade_out,
        };

        clips
            .into_iter()
            .map(|clip| {
                let segment = segments.get(clip.source_segment_index).ok_or_else(|| {
                    DubSyncError::Alignment(format!(
                        "clip references unknown segment {}",
                        clip.source_segment_index
                    ))
                })?;
                align(segment, clip, &alignment)
            })
            .collect()
    }
}

/// Returns true if `path` looks like a media file the pipeline can ingest
pub fn is_supported_input(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("mp4" | "mov" | "mkv" | "webm" | "avi" | "m4v")
    )
}
