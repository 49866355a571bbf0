//! Segment Aligner: fit one synthesized clip into its segment window.

use std::f32::consts::PI;

use log::debug;

use crate::error::{DubSyncError, Result};
use crate::segment::{Segment, SynthesizedClip};

/// Alignment parameters
#[derive(Debug, Clone)]
pub struct AlignmentConfig {
    /// Guard interval keeping the clip's tail off the next segment's onset,
    /// in seconds
    pub guard: f64,
    /// Fade-out applied to the tail of a truncated clip, in seconds
    pub fade_out: f32,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            guard: 0.05,
            fade_out: 0.02, // 20ms
        }
    }
}

/// A clip positioned on the master timeline, trimmed to its segment window.
///
/// Invariants: `start` equals the source segment's start; `end` never
/// exceeds the segment's end; `end - start` never exceeds the clip's
/// native duration. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct PlacedClip {
    /// Start time on the master timeline, in seconds
    pub start: f64,
    /// End time on the master timeline, in seconds
    pub end: f64,
    /// PCM samples, 32-bit float, mono, trimmed to `end - start`
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl PlacedClip {
    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Place a synthesized clip at its segment's start time, truncating it as
/// needed so it cannot bleed into the next segment's window.
///
/// The clip is cut to `window - guard` seconds when it runs longer; a
/// segment shorter than the guard keeps its full window. Speech is never
/// stretched or sped up to fill the window. Pure and deterministic.
pub fn align(
    segment: &Segment,
    clip: SynthesizedClip,
    config: &AlignmentConfig,
) -> Result<PlacedClip> {
    if segment.end <= segment.start {
        return Err(DubSyncError::Alignment(format!(
            "segment {} has end {:.3}s <= start {:.3}s",
            clip.source_segment_index, segment.end, segment.start
        )));
    }
    if clip.buffer.sample_rate == 0 {
        return Err(DubSyncError::Alignment(format!(
            "clip for segment {} has zero sample rate",
            clip.source_segment_index
        )));
    }

    let window = segment.window();
    // A segment shorter than the guard keeps its full window; shrinking it
    // further would leave no usable room at all.
    let allowed = if window > config.guard {
        window - config.guard
    } else {
        window
    };

    let native = clip.native_duration();
    let sample_rate = clip.buffer.sample_rate;
    let mut samples = clip.buffer.samples;

    let end = if native > allowed {
        let keep = ((allowed * sample_rate as f64).round() as usize).min(samples.len());
        debug!(
            "Truncating clip for segment {}: native {:.3}s > allowed {:.3}s",
            clip.source_segment_index, native, allowed
        );
        samples.truncate(keep);

        // Soften the hard cut so it does not click
        let fade_samples = (config.fade_out * sample_rate as f32) as usize;
        apply_fade_out(&mut samples, fade_samples);

        segment.start + allowed
    } else {
        segment.start + native
    };

    Ok(PlacedClip {
        start: segment.start,
        end,
        samples,
        sample_rate,
    })
}

/// Apply a raised-cosine fade-out to the tail of a sample buffer
pub fn apply_fade_out(samples: &mut [f32], duration_samples: usize) {
    let start = samples.len().saturating_sub(duration_samples);
    let span = samples.len() - start;
    for i in 0..span {
        let factor = 0.5 * (1.0 + (PI * i as f32 / span.max(1) as f32).cos());
        samples[start + i] *= factor;
    }
}
