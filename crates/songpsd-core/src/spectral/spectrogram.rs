//! Short-time power spectrogram for syllable figures

use super::window::hann_window;
use crate::config::SpectrogramConfig;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::Serialize;
use std::sync::Arc;

/// Time-frequency power grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spectrogram {
    /// Power values [frequency_bin][time_frame]
    pub power: Vec<Vec<f64>>,
    /// Bin frequencies in Hz
    pub freqs: Vec<f64>,
    /// Frame centre times in seconds from the segment start
    pub times: Vec<f64>,
}

impl Spectrogram {
    pub fn num_frames(&self) -> usize {
        self.times.len()
    }

    pub fn num_bins(&self) -> usize {
        self.freqs.len()
    }
}

/// STFT with a fixed Hann window and hop
pub struct SpectrogramEstimator {
    nfft: usize,
    hop: usize,
    window: Vec<f64>,
    fft: Arc<dyn Fft<f64>>,
}

impl SpectrogramEstimator {
    pub fn new(config: &SpectrogramConfig) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(config.nfft);
        Self {
            nfft: config.nfft,
            hop: config.hop,
            window: hann_window(config.nfft),
            fft,
        }
    }

    /// Compute the spectrogram of `samples`, keeping bins within
    /// `[freq_lo, freq_hi]` Hz. Short inputs give one zero-padded frame.
    pub fn compute(
        &self,
        samples: &[f64],
        sample_rate: f64,
        freq_lo: f64,
        freq_hi: f64,
    ) -> Spectrogram {
        let num_frames = if samples.len() <= self.nfft {
            1
        } else {
            1 + (samples.len() - self.nfft) / self.hop
        };

        let resolution = sample_rate / self.nfft as f64;
        let kept: Vec<usize> = (0..=self.nfft / 2)
            .filter(|&k| {
                let f = k as f64 * resolution;
                f >= freq_lo && f <= freq_hi
            })
            .collect();

        let mut power = vec![Vec::with_capacity(num_frames); kept.len()];
        let mut times = Vec::with_capacity(num_frames);
        let mut frame = vec![Complex::new(0.0, 0.0); self.nfft];

        for frame_idx in 0..num_frames {
            let start = frame_idx * self.hop;

            for (i, slot) in frame.iter_mut().enumerate() {
                let sample = samples.get(start + i).copied().unwrap_or(0.0);
                *slot = Complex::new(sample * self.window[i], 0.0);
            }

            self.fft.process(&mut frame);

            for (row, &k) in power.iter_mut().zip(kept.iter()) {
                row.push(frame[k].norm_sqr());
            }

            times.push((start as f64 + self.nfft as f64 / 2.0) / sample_rate);
        }

        let freqs = kept.iter().map(|&k| k as f64 * resolution).collect();

        Spectrogram {
            power,
            freqs,
            times,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_frame_count_and_band() {
        let estimator = SpectrogramEstimator::new(&SpectrogramConfig { nfft: 256, hop: 64 });
        let samples: Vec<f64> = (0..1024)
            .map(|i| (2.0 * PI * 2000.0 * i as f64 / 16000.0).sin())
            .collect();

        let spect = estimator.compute(&samples, 16000.0, 1000.0, 4000.0);

        // 1 + (1024 - 256) / 64
        assert_eq!(spect.num_frames(), 13);
        assert!(spect.freqs.iter().all(|&f| (1000.0..=4000.0).contains(&f)));
        assert_eq!(spect.freqs[0], 1000.0);
        assert_eq!(*spect.freqs.last().unwrap(), 4000.0);
        assert!(spect.power.iter().all(|row| row.len() == 13));

        // Energy concentrates at 2000 Hz
        let peak_row = spect
            .power
            .iter()
            .enumerate()
            .max_by(|a, b| a.1[6].total_cmp(&b.1[6]))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(spect.freqs[peak_row], 2000.0);
    }

    #[test]
    fn test_short_input_single_frame() {
        let estimator = SpectrogramEstimator::new(&SpectrogramConfig { nfft: 512, hop: 32 });
        let spect = estimator.compute(&[1.0, -1.0, 0.5], 32000.0, 0.0, 16000.0);
        assert_eq!(spect.num_frames(), 1);
        assert_eq!(spect.num_bins(), 257);
    }
}
