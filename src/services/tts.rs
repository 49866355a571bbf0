//! Speech synthesis over the OpenAI audio API.

use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{debug, error, info};
use regex::Regex;
use reqwest::Client;

use super::cache::ClipCache;
use super::Synthesizer;
use crate::config::DubSyncConfig;
use crate::error::{DubSyncError, Result};
use crate::media::{tools, wav};
use crate::segment::SpeechBuffer;

const SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
}

/// Strip markup and normalize whitespace before sending text to the TTS
/// engine
pub fn prepare_text_for_tts(text: &str) -> String {
    let text = HTML_TAG.replace_all(text, "");

    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&apos;", "'");

    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// OpenAI-backed synthesizer.
///
/// Response audio is bounced through WAV at the composite sample rate
/// before decoding, so clip durations are sample-exact rather than subject
/// to MP3 framing.
pub struct OpenAiSynthesizer {
    client: Client,
    api_key: String,
    model: String,
    voice: String,
    sample_rate: u32,
    timeout: Duration,
    cache: Option<ClipCache>,
}

impl OpenAiSynthesizer {
    pub fn new(config: &DubSyncConfig) -> Result<Self> {
        if config.openai_api_key.trim().is_empty() {
            return Err(DubSyncError::Configuration(
                "OpenAI API key is required for TTS generation".to_string(),
            ));
        }

        let cache = if config.use_caching {
            Some(ClipCache::new(config)?)
        } else {
            None
        };

        Ok(Self {
            client: Client::new(),
            api_key: config.openai_api_key.clone(),
            model: config.tts_model.as_str().to_string(),
            voice: config.tts_voice.as_str().to_string(),
            sample_rate: config.sample_rate,
            timeout: config.request_timeout,
            cache,
        })
    }
}

#[async_trait]
impl Synthesizer for OpenAiSynthesizer {
    async fn synthesize(&self, text: &str, lang: &str) -> Result<SpeechBuffer> {
        let text = prepare_text_for_tts(text);
        if text.is_empty() {
            return Ok(SpeechBuffer::new(Vec::new(), self.sample_rate));
        }

        let cache_key = ClipCache::cache_key(&text, &self.voice, lang, self.sample_rate);
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.cached_clip(&cache_key) {
                return wav::read_wav_mono(&cached);
            }
        }

        debug!("Sending TTS request to OpenAI API");
        let response = self
            .client
            .post(SPEECH_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "model": self.model,
                "voice": self.voice,
                "input": text,
                "response_format": "mp3",
                "speed": 1.0
            }))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| DubSyncError::Synthesis(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("OpenAI API error: HTTP {}, body: {}", status, error_text);
            return Err(DubSyncError::Synthesis(format!(
                "OpenAI API returned {}: {}",
                status, error_text
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DubSyncError::Synthesis(format!("failed to read response: {}", e)))?;
        if bytes.is_empty() {
            return Err(DubSyncError::Synthesis("received empty audio".to_string()));
        }

        let temp_dir = tempfile::tempdir()?;
        let mp3_path = temp_dir.path().join("clip.mp3");
        let wav_path = temp_dir.path().join("clip.wav");

        tokio::fs::write(&mp3_path, &bytes).await?;
        tools::convert_to_wav_mono(&mp3_path, &wav_path, self.sample_rate)
            .await
            .map_err(|e| DubSyncError::Synthesis(format!("decode failed: {}", e)))?;

        let buffer = wav::read_wav_mono(&wav_path)?;
        info!(
            "Synthesized {:.3}s of speech for {} characters",
            buffer.duration(),
            text.len()
        );

        if let Some(cache) = &self.cache {
            cache.add_clip(&cache_key, &wav_path)?;
        }

        Ok(buffer)
    }
}
