//! Library configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// TTS model used with the OpenAI API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TtsModel {
    /// Standard model
    Standard,
    /// High-definition model
    HighDefinition,
}

impl Default for TtsModel {
    fn default() -> Self {
        Self::Standard
    }
}

impl TtsModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "tts-1",
            Self::HighDefinition => "tts-1-hd",
        }
    }
}

/// Voice used with the OpenAI API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TtsVoice {
    Alloy,
    Echo,
    Fable,
    Onyx,
    Nova,
    Shimmer,
}

impl Default for TtsVoice {
    fn default() -> Self {
        Self::Nova
    }
}

impl TtsVoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alloy => "alloy",
            Self::Echo => "echo",
            Self::Fable => "fable",
            Self::Onyx => "onyx",
            Self::Nova => "nova",
            Self::Shimmer => "shimmer",
        }
    }
}

/// Bounded retry policy for transient collaborator errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds
    pub base_delay_ms: u64,
    /// Upper bound on any single delay, in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 300,
            max_delay_ms: 5_000,
        }
    }
}

/// Library configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DubSyncConfig {
    /// OpenAI API key
    pub openai_api_key: String,
    /// TTS model
    pub tts_model: TtsModel,
    /// TTS voice
    pub tts_voice: TtsVoice,
    /// Guard interval keeping a placed clip's tail off the next segment's
    /// onset, in seconds
    pub guard_interval: f64,
    /// Sample rate of the composite track, in Hz
    pub sample_rate: u32,
    /// Fade-out applied to the tail of a truncated clip, in seconds
    pub fade_out: f32,
    /// Maximum number of concurrent requests to external services
    pub max_concurrent_requests: usize,
    /// Timeout for a single request to an external service
    pub request_timeout: Duration,
    /// Retry policy for transient collaborator errors
    pub retry: RetryPolicy,
    /// Cache synthesized clips on disk
    pub use_caching: bool,
    /// Cache directory; defaults to a subdirectory of the system temp dir
    pub cache_dir: Option<String>,
    /// Maximum cache size in bytes
    pub max_cache_size: Option<u64>,
    /// Remove temporary files once a job reaches a terminal state
    pub cleanup_temp_files: bool,
}

impl Default for DubSyncConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            tts_model: TtsModel::default(),
            tts_voice: TtsVoice::default(),
            guard_interval: 0.05,
            sample_rate: 44100,
            fade_out: 0.02, // 20ms
            max_concurrent_requests: 5,
            request_timeout: Duration::from_secs(120),
            retry: RetryPolicy::default(),
            use_caching: true,
            cache_dir: None,
            max_cache_size: Some(1024 * 1024 * 1024), // 1 GB
            cleanup_temp_files: true,
        }
    }
}
