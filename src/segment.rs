//! Data model for timestamped speech segments and synthesized clips.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{DubSyncError, Result};

/// A time-bounded span of the source audio with its transcribed text.
///
/// Segments are immutable after normalization: sorted ascending by `start`
/// and non-overlapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Start time in seconds, >= 0
    pub start: f64,
    /// End time in seconds, > start
    pub end: f64,
    /// Transcribed text
    pub text: String,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Window length in seconds
    pub fn window(&self) -> f64 {
        self.end - self.start
    }
}

/// A segment paired with its translation; timing fields are unchanged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatedSegment {
    pub segment: Segment,
    pub translated_text: String,
}

/// Mono PCM audio produced by the speech-synthesis collaborator.
///
/// Duration is determined by the text and voice, never by the segment
/// window the buffer will eventually be placed into.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechBuffer {
    /// PCM samples, 32-bit float, mono
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl SpeechBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// A synthesized clip tied back to the segment it was produced for
#[derive(Debug, Clone)]
pub struct SynthesizedClip {
    /// Index of the source segment in the normalized segment list
    pub source_segment_index: usize,
    /// Synthesized audio
    pub buffer: SpeechBuffer,
}

impl SynthesizedClip {
    /// Duration of the synthesized audio in seconds
    pub fn native_duration(&self) -> f64 {
        self.buffer.duration()
    }
}

/// Validate and normalize transcription output.
///
/// Collaborator output is not trusted: segments are sorted by start time,
/// overlaps are clamped to the next segment's onset, spans that end up
/// degenerate or carry no text are dropped, and non-finite timestamps are
/// rejected outright.
pub fn normalize_segments(mut segments: Vec<Segment>) -> Result<Vec<Segment>> {
    for segment in &segments {
        if !segment.start.is_finite() || !segment.end.is_finite() {
            return Err(DubSyncError::Ingestion(format!(
                "non-finite segment timestamps: start={}, end={}",
                segment.start, segment.end
            )));
        }
    }

    segments.sort_by(|a, b| a.start.total_cmp(&b.start));

    let total = segments.len();
    let mut normalized: Vec<Segment> = Vec::with_capacity(total);

    for (i, mut segment) in segments.into_iter().enumerate() {
        if segment.start < 0.0 {
            warn!(
                "Segment {} starts at {:.3}s, clamping to 0",
                i, segment.start
            );
            segment.start = 0.0;
        }

        // Clamp into the previous segment's shadow
        if let Some(prev) = normalized.last() {
            if segment.start < prev.end {
                warn!(
                    "Segment {} overlaps previous (starts {:.3}s before its end), clamping",
                    i,
                    prev.end - segment.start
                );
                segment.start = prev.end;
            }
        }

        if segment.end <= segment.start {
            warn!("Dropping degenerate segment {} ({:.3}s window)", i, segment.window());
            continue;
        }

        if segment.text.trim().is_empty() {
            warn!("Dropping segment {} with empty text", i);
            continue;
        }

        normalized.push(segment);
    }

    if normalized.len() < total {
        warn!(
            "Normalization kept {} of {} transcribed segments",
            normalized.len(),
            total
        );
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_sorts_by_start() {
        let segments = vec![
            Segment::new(5.0, 6.0, "b"),
            Segment::new(0.0, 2.0, "a"),
        ];

        let result = normalize_segments(segments).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].text, "a");
        assert_eq!(result[1].text, "b");
    }

    #[test]
    fn test_normalize_clamps_overlap() {
        let segments = vec![
            Segment::new(0.0, 2.5, "a"),
            Segment::new(2.0, 4.0, "b"),
        ];

        let result = normalize_segments(segments).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[1].start, 2.5);
        assert_eq!(result[1].end, 4.0);
    }

    #[test]
    fn test_normalize_drops_degenerate_and_empty() {
        let segments = vec![
            Segment::new(0.0, 2.0, "a"),
            // Fully shadowed by the previous segment once clamped
            Segment::new(1.0, 2.0, "shadowed"),
            Segment::new(2.0, 3.0, "   "),
            Segment::new(3.0, 4.0, "b"),
        ];

        let result = normalize_segments(segments).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].text, "a");
        assert_eq!(result[1].text, "b");
    }

    #[test]
    fn test_normalize_clamps_negative_start() {
        let segments = vec![Segment::new(-0.5, 1.0, "a")];

        let result = normalize_segments(segments).unwrap();
        assert_eq!(result[0].start, 0.0);
    }

    #[test]
    fn test_normalize_rejects_non_finite() {
        let segments = vec![Segment::new(0.0, f64::NAN, "a")];
        assert!(normalize_segments(segments).is_err());
    }

    #[test]
    fn test_speech_buffer_duration() {
        let buffer = SpeechBuffer::new(vec![0.0; 44100], 44100);
        assert_eq!(buffer.duration(), 1.0);

        let empty = SpeechBuffer::new(Vec::new(), 0);
        assert_eq!(empty.duration(), 0.0);
    }
}
