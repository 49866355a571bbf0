//! Progress reporting for a dubbing job.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Sender;

/// Pipeline stage currently executing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    Extracting,
    Transcribing,
    Translating,
    Synthesizing,
    Compositing,
    Muxing,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extracting => "extracting",
            Self::Transcribing => "transcribing",
            Self::Translating => "translating",
            Self::Synthesizing => "synthesizing",
            Self::Compositing => "compositing",
            Self::Muxing => "muxing",
        }
    }
}

/// Structure for holding job progress information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DubProgress {
    pub stage: PipelineStage,
    pub status: String,
    /// 0.0 - 100.0 within the current stage
    pub progress: f32,
}

/// Send a progress update if a sender is attached; progress must never
/// block or fail the job
pub async fn report(
    sender: &Option<Sender<DubProgress>>,
    stage: PipelineStage,
    progress: f32,
    status: impl Into<String>,
) {
    if let Some(tx) = sender {
        let _ = tx
            .send(DubProgress {
                stage,
                status: status.into(),
                progress,
            })
            .await;
    }
}
