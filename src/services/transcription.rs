//! Speech-to-text over the OpenAI audio API.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use super::Transcriber;
use crate::config::DubSyncConfig;
use crate::error::{DubSyncError, Result};
use crate::segment::Segment;

const TRANSCRIPTIONS_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Whisper-backed transcriber
pub struct OpenAiTranscriber {
    client: Client,
    api_key: String,
    timeout: Duration,
}

// Response shape for response_format=verbose_json
#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    segments: Vec<ApiSegment>,
}

#[derive(Debug, Deserialize)]
struct ApiSegment {
    start: f64,
    end: f64,
    text: String,
}

impl OpenAiTranscriber {
    pub fn new(config: &DubSyncConfig) -> Result<Self> {
        if config.openai_api_key.trim().is_empty() {
            return Err(DubSyncError::Configuration(
                "OpenAI API key is required for transcription".to_string(),
            ));
        }

        Ok(Self {
            client: Client::new(),
            api_key: config.openai_api_key.clone(),
            timeout: config.request_timeout,
        })
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriber {
    async fn transcribe(&self, audio_path: &Path, source_lang: &str) -> Result<Vec<Segment>> {
        info!("Transcribing {}", audio_path.display());

        let data = tokio::fs::read(audio_path).await.map_err(|e| {
            DubSyncError::Ingestion(format!(
                "failed to read audio file {}: {}",
                audio_path.display(),
                e
            ))
        })?;

        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.wav".to_string());

        let mut form = Form::new()
            .part(
                "file",
                Part::bytes(data)
                    .file_name(file_name)
                    .mime_str("audio/wav")
                    .map_err(|e| DubSyncError::Transcription(e.to_string()))?,
            )
            .text("model", "whisper-1")
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment");

        // "auto" lets the model detect the language itself
        if source_lang != "auto" && !source_lang.trim().is_empty() {
            form = form.text("language", source_lang.to_string());
        }

        debug!("Sending transcription request to OpenAI API");
        let response = self
            .client
            .post(TRANSCRIPTIONS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| DubSyncError::Transcription(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("OpenAI API error: HTTP {}, body: {}", status, error_text);
            return Err(DubSyncError::Transcription(format!(
                "OpenAI API returned {}: {}",
                status, error_text
            )));
        }

        let transcription: VerboseTranscription = response
            .json()
            .await
            .map_err(|e| DubSyncError::Transcription(format!("malformed response: {}", e)))?;

        let segments = transcription
            .segments
            .into_iter()
            .map(|s| Segment::new(s.start, s.end, s.text.trim()))
            .collect::<Vec<_>>();

        info!("Transcription produced {} segments", segments.len());
        Ok(segments)
    }
}
