//! Audio decoding and sample timing
//!
//! Recordings are uncompressed WAV files; only the sample rate and the
//! (mono) amplitude sequence are consumed downstream.

mod decoder;

pub use decoder::decode_wav;

/// A decoded mono recording
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    pub sample_rate: u32,
    pub samples: Vec<f64>,
}

impl AudioTrack {
    pub fn new(sample_rate: u32, samples: Vec<f64>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    /// Duration in seconds
    pub fn duration_s(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Elapsed time of every sample in ms.
    ///
    /// Samples are spread linearly over `[0, duration]` (first at 0, last at
    /// the full duration) and rounded to 3 decimals, ties to even.
    pub fn timestamps(&self) -> Vec<f64> {
        let n = self.samples.len();
        let duration = self.duration_s();

        match n {
            0 => Vec::new(),
            1 => vec![0.0],
            _ => {
                let step = duration / (n - 1) as f64;
                (0..n)
                    .map(|i| {
                        // Pin the last sample to the exact duration
                        let t = if i == n - 1 { duration } else { i as f64 * step };
                        round_to_micros(t * 1e3)
                    })
                    .collect()
            }
        }
    }
}

/// Round a millisecond value to 3 decimals
fn round_to_micros(ms: f64) -> f64 {
    (ms * 1e3).round_ties_even() / 1e3
}
