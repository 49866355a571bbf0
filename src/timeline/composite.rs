//! Composite Track Builder: assemble placed clips and silence fill into one
//! continuous track spanning exactly the master media duration.

use log::debug;

use crate::error::{DubSyncError, Result};
use crate::timeline::align::PlacedClip;

/// The full-duration dubbed audio track.
///
/// Built once per job, consumed once by the muxer.
#[derive(Debug, Clone)]
pub struct CompositeTrack {
    /// PCM samples, 32-bit float, mono
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl CompositeTrack {
    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Walk the placed clips once and copy each into position, leaving silence
/// in every gap. The output length is fixed up front from `master_duration`,
/// so per-clip rounding can never drift the total.
///
/// Clips must arrive in non-decreasing start order, must not overlap and
/// must fall inside `[0, master_duration]`; anything else is an upstream
/// defect reported as a `Composite` error, never retried.
///
/// An empty clip list yields a fully silent track. The pipeline treats that
/// case as a passthrough signal instead of installing the silent track.
pub fn build(
    clips: &[PlacedClip],
    master_duration: f64,
    sample_rate: u32,
) -> Result<CompositeTrack> {
    if !master_duration.is_finite() || master_duration < 0.0 {
        return Err(DubSyncError::Composite(format!(
            "invalid master duration {master_duration}"
        )));
    }
    if sample_rate == 0 {
        return Err(DubSyncError::Composite("zero sample rate".to_string()));
    }

    let total_samples = (master_duration * sample_rate as f64).round() as usize;
    let mut samples = vec![0.0f32; total_samples];

    // Timeline tolerance for float comparisons; well below one sample
    let eps = 1e-9;
    let mut cursor = 0.0f64;

    for (i, clip) in clips.iter().enumerate() {
        if clip.sample_rate != sample_rate {
            return Err(DubSyncError::Composite(format!(
                "clip {} has sample rate {}, composite is {}",
                i, clip.sample_rate, sample_rate
            )));
        }
        if clip.start < -eps || clip.end > master_duration + eps || clip.end < clip.start {
            return Err(DubSyncError::Composite(format!(
                "clip {} [{:.3}s, {:.3}s] falls outside [0, {:.3}s]",
                i, clip.start, clip.end, master_duration
            )));
        }
        if clip.start < cursor - eps {
            return Err(DubSyncError::Composite(format!(
                "clip {} starts at {:.3}s before cursor {:.3}s (out of order or overlapping)",
                i, clip.start, cursor
            )));
        }

        let offset = (clip.start * sample_rate as f64).round() as usize;
        let len = clip.samples.len().min(total_samples.saturating_sub(offset));
        samples[offset..offset + len].copy_from_slice(&clip.samples[..len]);

        cursor = clip.end;
    }

    debug!(
        "Composite track built: {} clips, {} samples ({:.3}s at {} Hz)",
        clips.len(),
        total_samples,
        total_samples as f64 / sample_rate as f64,
        sample_rate
    );

    Ok(CompositeTrack {
        samples,
        sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(start: f64, end: f64, sample_rate: u32) -> PlacedClip {
        let n = ((end - start) * sample_rate as f64).round() as usize;
        PlacedClip {
            start,
            end,
            samples: vec![1.0; n],
            sample_rate,
        }
    }

    #[test]
    fn test_total_duration_matches_master_exactly() {
        let clips = vec![placed(2.0, 3.0, 44100)];
        let track = build(&clips, 5.0, 44100).unwrap();

        assert_eq!(track.samples.len(), 5 * 44100);
        assert_eq!(track.duration(), 5.0);
    }

    #[test]
    fn test_gaps_are_silent() {
        let clips = vec![placed(1.0, 2.0, 1000), placed(3.0, 4.0, 1000)];
        let track = build(&clips, 5.0, 1000).unwrap();

        // Leading gap, middle gap, trailing gap
        assert!(track.samples[..1000].iter().all(|&s| s == 0.0));
        assert!(track.samples[2000..3000].iter().all(|&s| s == 0.0));
        assert!(track.samples[4000..].iter().all(|&s| s == 0.0));
        // Clip bodies are present
        assert!(track.samples[1000..2000].iter().all(|&s| s == 1.0));
        assert!(track.samples[3000..4000].iter().all(|&s| s == 1.0));
    }

    #[test]
    fn test_empty_input_yields_silent_track() {
        let track = build(&[], 3.0, 44100).unwrap();

        assert_eq!(track.samples.len(), 3 * 44100);
        assert!(track.samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_rounding_drift_is_absorbed() {
        // Clip durations that do not land on whole samples
        let clips = vec![placed(0.0, 0.333, 44100), placed(0.5, 0.777, 44100)];
        let track = build(&clips, 1.0, 44100).unwrap();

        assert_eq!(track.samples.len(), 44100);
    }

    #[test]
    fn test_out_of_order_clips_fail() {
        let clips = vec![placed(2.0, 3.0, 44100), placed(0.0, 1.0, 44100)];
        let result = build(&clips, 5.0, 44100);
        assert!(matches!(result, Err(DubSyncError::Composite(_))));
    }

    #[test]
    fn test_overlapping_clips_fail() {
        let clips = vec![placed(0.0, 2.0, 44100), placed(1.5, 3.0, 44100)];
        let result = build(&clips, 5.0, 44100);
        assert!(matches!(result, Err(DubSyncError::Composite(_))));
    }

    #[test]
    fn test_clip_outside_master_bounds_fails() {
        let clips = vec![placed(4.0, 6.0, 44100)];
        let result = build(&clips, 5.0, 44100);
        assert!(matches!(result, Err(DubSyncError::Composite(_))));
    }

    #[test]
    fn test_sample_rate_mismatch_fails() {
        let clips = vec![placed(0.0, 1.0, 22050)];
        let result = build(&clips, 5.0, 44100);
        assert!(matches!(result, Err(DubSyncError::Composite(_))));
    }

    #[test]
    fn test_adjacent_clips_are_accepted() {
        let clips = vec![placed(0.0, 1.0, 1000), placed(1.0, 2.0, 1000)];
        let track = build(&clips, 2.0, 1000).unwrap();
        assert_eq!(track.samples.len(), 2000);
    }

    #[test]
    fn test_build_is_deterministic() {
        let clips = vec![placed(0.25, 1.3, 44100), placed(2.0, 2.6, 44100)];
        let a = build(&clips, 4.0, 44100).unwrap();
        let b = build(&clips, 4.0, 44100).unwrap();
        assert_eq!(a.samples, b.samples);
    }
}
