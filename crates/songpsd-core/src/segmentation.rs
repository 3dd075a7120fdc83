//! Syllable-aligned segment extraction
//!
//! Maps an annotated `[onset, offset]` window, widened by a context
//! buffer, onto sample indices of a recording.

use std::ops::Range;

/// Samples of a recording falling inside a time window
#[derive(Debug, Clone, PartialEq)]
pub struct Segment<'a> {
    /// Indices `i` with `start <= timestamps[i] <= end`
    pub indices: Range<usize>,
    /// Timestamps (ms) of the selected samples
    pub timestamps: &'a [f64],
}

impl<'a> Segment<'a> {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The selected slice of a sample buffer aligned with the timestamps
    pub fn samples<'s>(&self, samples: &'s [f64]) -> &'s [f64] {
        let end = self.indices.end.min(samples.len());
        let start = self.indices.start.min(end);
        &samples[start..end]
    }
}

/// Select the samples whose timestamp lies in `[start, end]`, both inclusive.
///
/// `timestamps` must be non-decreasing. A window outside the recording, or
/// an inverted one, yields an empty segment.
pub fn extract_segment(timestamps: &[f64], start: f64, end: f64) -> Segment<'_> {
    let first = timestamps.partition_point(|&t| t < start);
    let last = timestamps.partition_point(|&t| t <= end);
    let last = last.max(first);

    Segment {
        indices: first..last,
        timestamps: &timestamps[first..last],
    }
}

/// Window `[onset - buffer, offset + buffer]` around a syllable
pub fn syllable_window(onset: f64, offset: f64, buffer_ms: f64) -> (f64, f64) {
    (onset - buffer_ms, offset + buffer_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inclusive_boundaries() {
        let timestamps = [0.0, 10.0, 20.0, 30.0, 40.0];
        let segment = extract_segment(&timestamps, 10.0, 30.0);

        assert_eq!(segment.indices, 1..4);
        assert_eq!(segment.timestamps, &[10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_window_between_samples() {
        let timestamps = [0.0, 10.0, 20.0, 30.0, 40.0];
        let segment = extract_segment(&timestamps, 5.0, 25.0);
        assert_eq!(segment.timestamps, &[10.0, 20.0]);
    }

    #[test]
    fn test_window_past_track_bounds_is_clipped() {
        let timestamps = [0.0, 10.0, 20.0];
        let segment = extract_segment(&timestamps, -20.0, 100.0);
        assert_eq!(segment.indices, 0..3);
    }

    #[test]
    fn test_empty_selection() {
        let timestamps = [0.0, 10.0, 20.0];

        assert!(extract_segment(&timestamps, 50.0, 60.0).is_empty());
        assert!(extract_segment(&timestamps, 11.0, 19.0).is_empty());
        assert!(extract_segment(&timestamps, 20.0, 10.0).is_empty());
        assert!(extract_segment(&[], 0.0, 10.0).is_empty());
    }

    #[test]
    fn test_repeated_timestamps_are_all_selected() {
        let timestamps = [0.0, 10.0, 10.0, 10.0, 20.0];
        let segment = extract_segment(&timestamps, 10.0, 10.0);
        assert_eq!(segment.indices, 1..4);
    }

    #[test]
    fn test_samples_slice_and_buffer() {
        let timestamps = [0.0, 10.0, 20.0, 30.0, 40.0];
        let samples = [0.5, 1.5, 2.5, 3.5, 4.5];

        let (start, end) = syllable_window(20.0, 20.0, 10.0);
        assert_eq!((start, end), (10.0, 30.0));

        let segment = extract_segment(&timestamps, start, end);
        assert_eq!(segment.samples(&samples), &[1.5, 2.5, 3.5]);
    }
}
