//! WAV reading and writing for mono PCM buffers.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::debug;

use crate::error::{DubSyncError, Result};
use crate::segment::SpeechBuffer;

/// Read a WAV file into a mono f32 buffer, averaging channels if needed
pub fn read_wav_mono(path: &Path) -> Result<SpeechBuffer> {
    let reader = WavReader::open(path)
        .map_err(|e| DubSyncError::Ingestion(format!("failed to open {}: {}", path.display(), e)))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(DubSyncError::Ingestion(format!(
            "{} declares zero channels",
            path.display()
        )));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| DubSyncError::Ingestion(e.to_string()))?,
        SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| DubSyncError::Ingestion(e.to_string()))?
        }
    };

    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    debug!(
        "Read {}: {} samples at {} Hz ({} channel(s))",
        path.display(),
        samples.len(),
        spec.sample_rate,
        channels
    );

    Ok(SpeechBuffer::new(samples, spec.sample_rate))
}

/// Write a mono f32 buffer as 16-bit PCM WAV
pub fn write_wav_mono(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .map_err(|e| DubSyncError::Mux(format!("failed to create {}: {}", path.display(), e)))?;

    for &sample in samples {
        let clamped = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(clamped)
            .map_err(|e| DubSyncError::Mux(e.to_string()))?;
    }

    writer
        .finalize()
        .map_err(|e| DubSyncError::Mux(e.to_string()))?;

    debug!(
        "Wrote {}: {} samples at {} Hz",
        path.display(),
        samples.len(),
        sample_rate
    );
    Ok(())
}
