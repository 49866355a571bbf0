//! Segment translation over the OpenAI chat API.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::Translator;
use crate::config::DubSyncConfig;
use crate::error::{DubSyncError, Result};

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const TRANSLATION_MODEL: &str = "gpt-4o-mini";

// Chat message structure for OpenAI API
#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

// OpenAI API request
#[derive(Debug, Serialize)]
struct TranslationRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
}

// OpenAI API response
#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Chat-completion-backed translator
pub struct OpenAiTranslator {
    client: Client,
    api_key: String,
    timeout: Duration,
}

impl OpenAiTranslator {
    pub fn new(config: &DubSyncConfig) -> Result<Self> {
        if config.openai_api_key.trim().is_empty() {
            return Err(DubSyncError::Configuration(
                "OpenAI API key is required for translation".to_string(),
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
impl Translator for OpenAiTranslator {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let source_clause = if source_lang == "auto" {
            "their original language".to_string()
        } else {
            format!("language code {}", source_lang)
        };

        let system_message = format!(
            "You are a professional translator. \
            Translate the following subtitle line from {} into the language with code {}. \
            Keep the translation natural, accurate, and appropriate for spoken dubbing. \
            ONLY include the translated text in your response.",
            source_clause, target_lang
        );

        let request = TranslationRequest {
            model: TRANSLATION_MODEL.to_string(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system_message,
                },
                Message {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            temperature: 0.3,
        };

        debug!("Sending translation request to OpenAI API");
        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| DubSyncError::Translation(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("OpenAI API error: HTTP {}, body: {}", status, error_text);
            return Err(DubSyncError::Translation(format!(
                "OpenAI API returned {}: {}",
                status, error_text
            )));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| DubSyncError::Translation(format!("malformed response: {}", e)))?;

        let translated = completion
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| DubSyncError::Translation("empty completion".to_string()))?;

        debug!("Received translation from OpenAI API");
        Ok(translated)
    }
}
