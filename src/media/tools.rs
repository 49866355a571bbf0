//! ffmpeg/ffprobe subprocess helpers.

use std::path::Path;
use std::process::Stdio;

use log::{debug, info};
use tokio::process::Command;

use crate::error::{DubSyncError, Result};

/// Check that ffmpeg and ffprobe are reachable on PATH
pub fn ensure_tools_installed() -> Result<()> {
    for tool in ["ffmpeg", "ffprobe"] {
        which::which(tool).map_err(|_| {
            DubSyncError::Configuration(format!(
                "{} not found on PATH; install ffmpeg to use the media engine",
                tool
            ))
        })?;
    }
    Ok(())
}

/// Run ffmpeg with the given arguments, failing on a non-zero exit
pub async fn run_ffmpeg(args: &[&str]) -> Result<()> {
    debug!("Running FFmpeg command: ffmpeg {}", args.join(" "));

    let output = Command::new("ffmpeg")
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DubSyncError::Mux(format!(
            "ffmpeg failed with status {}: {}",
            output.status,
            stderr.lines().last().unwrap_or("").trim()
        )));
    }

    Ok(())
}

/// Media duration in seconds via ffprobe
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await?;

    if !output.status.success() {
        return Err(DubSyncError::Ingestion(format!(
            "ffprobe failed with status {} for {}",
            output.status,
            path.display()
        )));
    }

    let duration_str = String::from_utf8_lossy(&output.stdout);
    let duration = duration_str.trim().parse::<f64>().map_err(|_| {
        DubSyncError::Ingestion(format!("failed to parse media duration: {}", duration_str))
    })?;

    info!("Probed duration of {}: {:.3}s", path.display(), duration);
    Ok(duration)
}

/// Convert any audio input to mono 16-bit PCM WAV at the given rate
pub async fn convert_to_wav_mono(input: &Path, output: &Path, sample_rate: u32) -> Result<()> {
    let rate = sample_rate.to_string();
    let input = input.to_string_lossy().to_string();
    let output = output.to_string_lossy().to_string();

    run_ffmpeg(&[
        "-i", &input, "-acodec", "pcm_s16le", "-ar", &rate, "-ac", "1", "-y", &output,
    ])
    .await
}
