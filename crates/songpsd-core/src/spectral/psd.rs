//! Welch power spectral density
//!
//! One-sided PSD averaged over non-overlapping Hann-windowed segments,
//! scaled to power per Hz.

use super::window::hann_window;
use crate::error::{PsdError, Result};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// One-sided spectrum estimate
#[derive(Debug, Clone, PartialEq)]
pub struct Psd {
    /// Power per Hz, `nfft / 2 + 1` bins
    pub power: Vec<f64>,
    /// Bin frequencies in Hz, `k * fs / nfft`
    pub freqs: Vec<f64>,
}

/// Welch estimator with a fixed resolution
pub struct WelchPsd {
    nfft: usize,
    window: Vec<f64>,
    window_power: f64,
    fft: Arc<dyn Fft<f64>>,
}

impl WelchPsd {
    /// `nfft` must be even (a power of two in practice)
    pub fn new(nfft: usize) -> Self {
        let window = hann_window(nfft);
        let window_power = window.iter().map(|w| w * w).sum();
        let fft = FftPlanner::new().plan_fft_forward(nfft);

        Self {
            nfft,
            window,
            window_power,
            fft,
        }
    }

    pub fn nfft(&self) -> usize {
        self.nfft
    }

    /// Number of one-sided bins
    pub fn num_bins(&self) -> usize {
        self.nfft / 2 + 1
    }

    /// Estimate the PSD of `signal` sampled at `sample_rate` Hz.
    ///
    /// Signals shorter than `nfft` are zero-padded to one segment; longer
    /// ones are cut into `len / nfft` segments and any remainder dropped.
    pub fn estimate(&self, signal: &[f64], sample_rate: f64) -> Result<Psd> {
        if signal.is_empty() {
            return Err(PsdError::Numeric("PSD of an empty signal".to_string()));
        }

        let num_bins = self.num_bins();
        let num_segments = (signal.len() / self.nfft).max(1);
        let mut accum = vec![0.0; num_bins];
        let mut frame = vec![Complex::new(0.0, 0.0); self.nfft];

        for seg in 0..num_segments {
            let start = seg * self.nfft;
            let end = (start + self.nfft).min(signal.len());

            for (i, slot) in frame.iter_mut().enumerate() {
                let sample = if start + i < end { signal[start + i] } else { 0.0 };
                *slot = Complex::new(sample * self.window[i], 0.0);
            }

            self.fft.process(&mut frame);

            for (acc, bin) in accum.iter_mut().zip(frame.iter()) {
                *acc += bin.norm_sqr();
            }
        }

        let scale = 1.0 / (sample_rate * self.window_power * num_segments as f64);
        let nyquist = num_bins - 1;
        let power = accum
            .iter()
            .enumerate()
            .map(|(k, &p)| {
                // Fold negative frequencies onto their positive twins
                let fold = if k == 0 || k == nyquist { 1.0 } else { 2.0 };
                p * fold * scale
            })
            .collect();

        let resolution = sample_rate / self.nfft as f64;
        let freqs = (0..num_bins).map(|k| k as f64 * resolution).collect();

        Ok(Psd { power, freqs })
    }
}
