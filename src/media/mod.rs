//! Media I/O collaborator: audio extraction and container remuxing.
//!
//! The core never inspects container internals; it only relies on the
//! engine honoring "output duration equals master duration" and leaving the
//! video stream untouched.

pub mod ffmpeg;
pub mod tools;
pub mod wav;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub use ffmpeg::FfmpegEngine;

/// Audio to install into the output container
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Replace the original audio with this track (a WAV file on disk)
    Track(PathBuf),
    /// Leave the original audio untouched; used when no speech was detected
    Passthrough,
}

/// Container-level collaborator contract
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Extract the audio stream to `out_wav` (mono PCM at `sample_rate`)
    /// and return the master media duration in seconds.
    async fn extract_audio(&self, video: &Path, out_wav: &Path, sample_rate: u32) -> Result<f64>;

    /// Write `output` with the original video stream copied unchanged and
    /// the audio stream replaced (or passed through) per `audio`.
    async fn remux(&self, video: &Path, audio: AudioSource, output: &Path) -> Result<PathBuf>;
}
