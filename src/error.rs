//! Error types for the dubbing pipeline.
//!
//! Transient errors (external collaborators misbehaving) are retried by the
//! pipeline with bounded backoff; structural errors abort the job at once.

use thiserror::Error;

/// Errors produced by the dubbing pipeline and its collaborators
#[derive(Debug, Error)]
pub enum DubSyncError {
    /// Source media could not be read or is unsupported
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// Speech-to-text collaborator failed
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// Translation collaborator failed
    #[error("Translation error: {0}")]
    Translation(String),

    /// Speech-synthesis collaborator failed
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    /// Malformed segment timing; indicates an upstream contract violation
    #[error("Alignment error: {0}")]
    Alignment(String),

    /// Malformed clip ordering or bounds; indicates an aligner defect
    #[error("Composite error: {0}")]
    Composite(String),

    /// Output container could not be written
    #[error("Mux error: {0}")]
    Mux(String),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Other error
    #[error("Other error: {0}")]
    Other(String),
}

impl DubSyncError {
    /// Whether the error is worth retrying with backoff.
    ///
    /// Collaborator failures are usually network hiccups or rate limits.
    /// `Alignment` and `Composite` are contract violations and must never
    /// be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transcription(_) | Self::Translation(_) | Self::Synthesis(_) | Self::Http(_)
        )
    }

    /// Short name of the pipeline stage this error belongs to, for logs
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Ingestion(_) => "ingestion",
            Self::Transcription(_) => "transcription",
            Self::Translation(_) => "translation",
            Self::Synthesis(_) => "synthesis",
            Self::Alignment(_) => "alignment",
            Self::Composite(_) => "composite",
            Self::Mux(_) => "mux",
            Self::Http(_) => "http",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Configuration(_) => "configuration",
            Self::FileNotFound(_) => "io",
            Self::Other(_) => "other",
        }
    }
}

impl From<&str> for DubSyncError {
    fn from(s: &str) -> Self {
        DubSyncError::Other(s.to_string())
    }
}

impl From<String> for DubSyncError {
    fn from(s: String) -> Self {
        DubSyncError::Other(s)
    }
}

/// Result type for the dubsync library
pub type Result<T> = std::result::Result<T, DubSyncError>;
