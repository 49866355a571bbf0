//! End-to-end pipeline tests with mock collaborators.
//!
//! The collaborator traits let the whole job run without ffmpeg or any
//! network access: the mock transcriber hands out fixed segments, the mock
//! synthesizer produces buffers whose duration is encoded in the segment
//! text, and the mock media engine records what the pipeline asked it to do.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use dubsync::config::{DubSyncConfig, RetryPolicy};
use dubsync::error::{DubSyncError, Result};
use dubsync::job::{JobQueue, JobState};
use dubsync::media::{wav, AudioSource, MediaEngine};
use dubsync::pipeline::{DubRequest, DubSync};
use dubsync::segment::{Segment, SpeechBuffer};
use dubsync::services::{Synthesizer, Transcriber, Translator};

const SAMPLE_RATE: u32 = 44100;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn test_config() -> DubSyncConfig {
    DubSyncConfig {
        retry: RetryPolicy {
            max_attempts: 2,
            base_delay_ms: 1,
            max_delay_ms: 2,
        },
        use_caching: false,
        ..DubSyncConfig::default()
    }
}

struct MockTranscriber {
    segments: Vec<Segment>,
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, _audio_path: &Path, _source_lang: &str) -> Result<Vec<Segment>> {
        Ok(self.segments.clone())
    }
}

struct MockTranslator;

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

/// Produces a buffer whose duration in seconds is parsed from the text
struct MockSynthesizer;

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str, _lang: &str) -> Result<SpeechBuffer> {
        let seconds: f64 = text
            .parse()
            .map_err(|_| DubSyncError::Synthesis(format!("bad mock duration: {}", text)))?;
        let n = (seconds * SAMPLE_RATE as f64).round() as usize;
        Ok(SpeechBuffer::new(vec![0.5; n], SAMPLE_RATE))
    }
}

struct FailingSynthesizer;

#[async_trait]
impl Synthesizer for FailingSynthesizer {
    async fn synthesize(&self, _text: &str, _lang: &str) -> Result<SpeechBuffer> {
        Err(DubSyncError::Synthesis("service is down".to_string()))
    }
}

/// What the pipeline handed to the muxer
#[derive(Debug, Clone)]
enum RecordedMux {
    Track(SpeechBuffer),
    Passthrough,
}

struct MockMedia {
    master_duration: f64,
    muxed: Arc<Mutex<Vec<RecordedMux>>>,
}

impl MockMedia {
    fn new(master_duration: f64) -> Self {
        Self {
            master_duration,
            muxed: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl MediaEngine for MockMedia {
    async fn extract_audio(&self, _video: &Path, out_wav: &Path, sample_rate: u32) -> Result<f64> {
        // The mock transcriber never reads this, but the file must exist
        wav::write_wav_mono(out_wav, &[], sample_rate)?;
        Ok(self.master_duration)
    }

    async fn remux(&self, _video: &Path, audio: AudioSource, output: &Path) -> Result<PathBuf> {
        let recorded = match audio {
            // The scratch dir dies with the job, so capture the track now
            AudioSource::Track(path) => RecordedMux::Track(wav::read_wav_mono(&path)?),
            AudioSource::Passthrough => RecordedMux::Passthrough,
        };
        self.muxed.lock().unwrap().push(recorded);
        Ok(output.to_path_buf())
    }
}

fn pipeline_with(
    segments: Vec<Segment>,
    synthesizer: Arc<dyn Synthesizer>,
    media: Arc<MockMedia>,
) -> DubSync {
    DubSync::new(
        test_config(),
        Arc::new(MockTranscriber { segments }),
        Arc::new(MockTranslator),
        synthesizer,
        media,
    )
}

fn request_in(dir: &Path) -> DubRequest {
    let video_path = dir.join("input.mp4");
    std::fs::write(&video_path, b"not really a video").unwrap();
    DubRequest {
        video_path,
        source_lang: "auto".to_string(),
        target_lang: "es".to_string(),
        output_path: dir.join("output.mp4"),
    }
}

#[tokio::test]
async fn test_composite_track_spans_master_duration_exactly() {
    init_logging();
    let temp = tempfile::tempdir().unwrap();

    // Segment texts encode the mock synthesis durations: the first clip
    // overruns its window and must be truncated, the second fits
    let segments = vec![
        Segment::new(0.0, 2.0, "3.0"),
        Segment::new(3.0, 5.0, "1.0"),
    ];
    let media = Arc::new(MockMedia::new(5.0));
    let pipeline = pipeline_with(segments, Arc::new(MockSynthesizer), media.clone());

    let output = pipeline.process(&request_in(temp.path()), None).await.unwrap();
    assert_eq!(output, temp.path().join("output.mp4"));

    let muxed = media.muxed.lock().unwrap();
    let RecordedMux::Track(track) = &muxed[0] else {
        panic!("expected a dubbed track, got passthrough");
    };

    assert_eq!(track.samples.len(), 5 * SAMPLE_RATE as usize);

    let at = |seconds: f64| track.samples[(seconds * SAMPLE_RATE as f64) as usize];
    // First clip occupies [0, 1.95): present at 0.5s, truncated past 1.95s
    assert!(at(0.5).abs() > 0.01);
    assert!(at(1.97).abs() < 0.01);
    // Gap between the segments is silent
    assert!(at(2.5) == 0.0);
    // Second clip occupies [3, 4): present at 3.5s, silent at 4.5s
    assert!(at(3.5).abs() > 0.01);
    assert!(at(4.5) == 0.0);
}

#[tokio::test]
async fn test_no_segments_passes_original_audio_through() {
    init_logging();
    let temp = tempfile::tempdir().unwrap();

    let media = Arc::new(MockMedia::new(5.0));
    let pipeline = pipeline_with(Vec::new(), Arc::new(MockSynthesizer), media.clone());

    pipeline.process(&request_in(temp.path()), None).await.unwrap();

    let muxed = media.muxed.lock().unwrap();
    assert_eq!(muxed.len(), 1);
    assert!(matches!(muxed[0], RecordedMux::Passthrough));
}

#[tokio::test]
async fn test_synthesis_failure_fails_whole_job() {
    init_logging();
    let temp = tempfile::tempdir().unwrap();

    let segments = vec![
        Segment::new(0.0, 2.0, "1.0"),
        Segment::new(3.0, 5.0, "1.0"),
    ];
    let media = Arc::new(MockMedia::new(5.0));
    let pipeline = pipeline_with(segments, Arc::new(FailingSynthesizer), media.clone());

    let result = pipeline.process(&request_in(temp.path()), None).await;
    assert!(matches!(result, Err(DubSyncError::Synthesis(_))));

    // No partial composite reaches the muxer
    assert!(media.muxed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_input_is_rejected() {
    init_logging();
    let temp = tempfile::tempdir().unwrap();

    let media = Arc::new(MockMedia::new(5.0));
    let pipeline = pipeline_with(Vec::new(), Arc::new(MockSynthesizer), media);

    let request = DubRequest {
        video_path: temp.path().join("missing.mp4"),
        source_lang: "auto".to_string(),
        target_lang: "es".to_string(),
        output_path: temp.path().join("out.mp4"),
    };

    let result = pipeline.process(&request, None).await;
    assert!(matches!(result, Err(DubSyncError::FileNotFound(_))));
}

#[tokio::test]
async fn test_progress_reports_reach_muxing() {
    init_logging();
    let temp = tempfile::tempdir().unwrap();

    let segments = vec![Segment::new(0.0, 2.0, "1.0")];
    let media = Arc::new(MockMedia::new(3.0));
    let pipeline = pipeline_with(segments, Arc::new(MockSynthesizer), media);

    let (tx, mut rx) = mpsc::channel(64);
    pipeline
        .process(&request_in(temp.path()), Some(tx))
        .await
        .unwrap();

    let mut stages = Vec::new();
    while let Ok(update) = rx.try_recv() {
        stages.push(update.stage);
    }
    assert_eq!(stages.first().copied(), Some(dubsync::PipelineStage::Extracting));
    assert_eq!(stages.last().copied(), Some(dubsync::PipelineStage::Muxing));
}

#[tokio::test]
async fn test_job_queue_runs_job_to_done() {
    init_logging();
    let temp = tempfile::tempdir().unwrap();

    let segments = vec![Segment::new(0.0, 2.0, "1.0")];
    let media = Arc::new(MockMedia::new(3.0));
    let pipeline = Arc::new(pipeline_with(segments, Arc::new(MockSynthesizer), media));

    let queue = JobQueue::new(pipeline, 2);
    let id = queue.submit(request_in(temp.path())).await.unwrap();

    let status = queue.wait(&id).await.unwrap();
    match status.state {
        JobState::Done { output } => assert!(output.ends_with("output.mp4")),
        other => panic!("expected Done, got {:?}", other),
    }
}

#[tokio::test]
async fn test_job_queue_surfaces_failure() {
    init_logging();
    let temp = tempfile::tempdir().unwrap();

    let segments = vec![Segment::new(0.0, 2.0, "1.0")];
    let media = Arc::new(MockMedia::new(3.0));
    let pipeline = Arc::new(pipeline_with(segments, Arc::new(FailingSynthesizer), media));

    let queue = JobQueue::new(pipeline, 1);
    let id = queue.submit(request_in(temp.path())).await.unwrap();

    let status = queue.wait(&id).await.unwrap();
    match status.state {
        JobState::Failed { error } => assert!(error.contains("Synthesis")),
        other => panic!("expected Failed, got {:?}", other),
    }
}
