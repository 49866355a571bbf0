//! External collaborator interfaces and their OpenAI-backed implementations.
//!
//! Collaborators are constructed once at process start and handed to the
//! pipeline by reference; there is no global model state.

pub mod cache;
pub mod retry;
pub mod transcription;
pub mod translation;
pub mod tts;

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::segment::{Segment, SpeechBuffer};

/// Speech-to-text collaborator.
///
/// Output ordering and overlap are not trusted; the pipeline normalizes
/// the returned segments before use.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path, source_lang: &str) -> Result<Vec<Segment>>;
}

/// Translation collaborator. Idempotent for identical input; may fail
/// transiently.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String>;
}

/// Speech-synthesis collaborator.
///
/// The returned buffer's duration is determined by the text and voice,
/// never by any segment window.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, lang: &str) -> Result<SpeechBuffer>;
}
