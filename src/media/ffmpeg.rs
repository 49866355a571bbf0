//! ffmpeg-backed implementation of the media engine.

use async_trait::async_trait;
use log::info;
use std::path::{Path, PathBuf};

use super::{tools, AudioSource, MediaEngine};
use crate::error::{DubSyncError, Result};

/// Media engine shelling out to ffmpeg/ffprobe
pub struct FfmpegEngine;

impl FfmpegEngine {
    pub fn new() -> Result<Self> {
        tools::ensure_tools_installed()?;
        Ok(Self)
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn extract_audio(&self, video: &Path, out_wav: &Path, sample_rate: u32) -> Result<f64> {
        let master_duration = tools::probe_duration(video).await?;

        let rate = sample_rate.to_string();
        let input = video.to_string_lossy().to_string();
        let output = out_wav.to_string_lossy().to_string();

        tools::run_ffmpeg(&[
            "-i", &input, "-vn", "-acodec", "pcm_s16le", "-ar", &rate, "-ac", "1", "-y", &output,
        ])
        .await
        .map_err(|e| DubSyncError::Ingestion(format!("audio extraction failed: {}", e)))?;

        info!(
            "Extracted audio from {} ({:.3}s) to {}",
            video.display(),
            master_duration,
            out_wav.display()
        );
        Ok(master_duration)
    }

    async fn remux(&self, video: &Path, audio: AudioSource, output: &Path) -> Result<PathBuf> {
        match audio {
            AudioSource::Track(wav_path) => {
                let video_in = video.to_string_lossy().to_string();
                let audio_in = wav_path.to_string_lossy().to_string();
                let out = output.to_string_lossy().to_string();

                tools::run_ffmpeg(&[
                    "-i", &video_in,
                    "-i", &audio_in,
                    // Video from the first input, untouched
                    "-map", "0:v:0",
                    // Audio from the second input
                    "-map", "1:a:0",
                    "-c:v", "copy",
                    "-c:a", "aac",
                    "-b:a", "192k",
                    "-movflags", "+faststart",
                    "-y", &out,
                ])
                .await?;

                info!("Remuxed {} with dubbed audio", output.display());
            }
            AudioSource::Passthrough => {
                // No speech detected: the output keeps the original audio
                tokio::fs::copy(video, output).await.map_err(|e| {
                    DubSyncError::Mux(format!("passthrough copy failed: {}", e))
                })?;

                info!("Passed original audio through to {}", output.display());
            }
        }

        Ok(output.to_path_buf())
    }
}
