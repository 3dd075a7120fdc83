//! Spectral feature engine
//!
//! Turns one syllable segment into a normalized, band-restricted PSD
//! feature, plus a spectrogram when a figure is requested.

mod psd;
mod spectrogram;
mod window;

pub use psd::{Psd, WelchPsd};
pub use spectrogram::{Spectrogram, SpectrogramEstimator};
pub use window::hann_window;

use crate::config::PsdConfig;
use crate::error::{PsdError, Result};
use std::ops::Range;

/// Band-restricted PSD of one segment
#[derive(Debug, Clone, PartialEq)]
pub struct PsdFeature {
    /// Zero-mean, unit-variance power
    pub power: Vec<f64>,
    /// Frequency axis in Hz (not normalized)
    pub freq: Vec<f64>,
}

/// Feature plus the spectrogram of the same segment
#[derive(Debug, Clone)]
pub struct SpectralAnalysis {
    pub psd: PsdFeature,
    pub spectrogram: Spectrogram,
}

/// Subtract the mean and divide by the population standard deviation
pub fn normalize(values: &[f64]) -> Result<Vec<f64>> {
    if values.is_empty() {
        return Err(PsdError::Numeric("cannot normalize an empty sequence".to_string()));
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();

    if std == 0.0 || !std.is_finite() {
        return Err(PsdError::Numeric(format!(
            "cannot normalize a sequence with standard deviation {}",
            std
        )));
    }

    Ok(values.iter().map(|v| (v - mean) / std).collect())
}

/// Spectral feature engine, configured once per corpus pass
pub struct SpectralEngine {
    freq_lo: f64,
    freq_hi: f64,
    welch: WelchPsd,
    spectrogram: SpectrogramEstimator,
}

impl SpectralEngine {
    pub fn new(config: &PsdConfig) -> Self {
        Self {
            freq_lo: config.freq_lo_hz,
            freq_hi: config.freq_hi_hz,
            welch: WelchPsd::new(config.nfft),
            spectrogram: SpectrogramEstimator::new(&config.spectrogram),
        }
    }

    /// PSD bin range `[round(lo / res), round(hi / res))` with
    /// `res = sample_rate / nfft`, rounding ties to even.
    pub fn band_bins(&self, sample_rate: u32) -> Result<Range<usize>> {
        if sample_rate == 0 {
            return Err(PsdError::Precondition("sample rate must be > 0".to_string()));
        }

        let resolution = sample_rate as f64 / self.welch.nfft() as f64;
        let start = (self.freq_lo / resolution).round_ties_even() as usize;
        let end = (self.freq_hi / resolution).round_ties_even() as usize;

        if end > self.welch.num_bins() {
            return Err(PsdError::Shape(format!(
                "band end {} Hz exceeds the Nyquist frequency of {} Hz",
                self.freq_hi,
                sample_rate as f64 / 2.0
            )));
        }
        if end <= start {
            return Err(PsdError::Shape(format!(
                "band {}..{} Hz is narrower than one bin at {} Hz",
                self.freq_lo, self.freq_hi, resolution
            )));
        }

        Ok(start..end)
    }

    /// Length of every feature computed at `sample_rate`
    pub fn feature_len(&self, sample_rate: u32) -> Result<usize> {
        Ok(self.band_bins(sample_rate)?.len())
    }

    /// Normalized band-restricted PSD of a segment
    pub fn psd_feature(&self, segment: &[f64], sample_rate: u32) -> Result<PsdFeature> {
        let bins = self.band_bins(sample_rate)?;
        let normalized = normalize(segment)?;
        let psd = self.welch.estimate(&normalized, sample_rate as f64)?;

        let power = normalize(&psd.power[bins.clone()])?;
        let freq = psd.freqs[bins].to_vec();

        Ok(PsdFeature { power, freq })
    }

    /// Feature plus spectrogram of the normalized segment
    pub fn analyze(&self, segment: &[f64], sample_rate: u32) -> Result<SpectralAnalysis> {
        let psd = self.psd_feature(segment, sample_rate)?;
        let normalized = normalize(segment)?;
        let spectrogram =
            self.spectrogram
                .compute(&normalized, sample_rate as f64, self.freq_lo, self.freq_hi);

        Ok(SpectralAnalysis { psd, spectrogram })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn chirp(len: usize, sample_rate: f64) -> Vec<f64> {
        (0..len)
            .map(|i| {
                let t = i as f64 / sample_rate;
                (2.0 * PI * (1000.0 + 2000.0 * t) * t).sin() + 0.1 * (2.0 * PI * 3100.0 * t).cos()
            })
            .collect()
    }

    #[test]
    fn test_normalize() {
        let out = normalize(&[1.0, 2.0, 3.0]).unwrap();
        let expected = 1.0 / (2.0f64 / 3.0).sqrt();
        assert_relative_eq!(out[0], -expected);
        assert_relative_eq!(out[1], 0.0);
        assert_relative_eq!(out[2], expected);
    }

    #[test]
    fn test_normalize_rejects_constant_and_empty() {
        assert!(matches!(normalize(&[0.3; 10]), Err(PsdError::Numeric(_))));
        assert!(matches!(normalize(&[]), Err(PsdError::Numeric(_))));
    }

    #[test]
    fn test_band_bins() {
        let engine = SpectralEngine::new(&PsdConfig::default());
        // 32 kHz / 1024 = 31.25 Hz per bin: 300 -> 9.6 -> 10, 8000 -> 256
        assert_eq!(engine.band_bins(32000).unwrap(), 10..256);
        assert_eq!(engine.feature_len(32000).unwrap(), 246);
    }

    #[test]
    fn test_band_bins_ties_round_to_even() {
        let config = PsdConfig {
            nfft: 8,
            freq_lo_hz: 250.0,
            freq_hi_hz: 750.0,
            ..PsdConfig::default()
        };
        let engine = SpectralEngine::new(&config);
        // 8 kHz / 8 = 1000 Hz per bin: 0.25 -> 0, 0.75 -> 1
        assert_eq!(engine.band_bins(8000).unwrap(), 0..1);

        let config = PsdConfig {
            nfft: 8,
            freq_lo_hz: 500.0,
            freq_hi_hz: 2500.0,
            ..PsdConfig::default()
        };
        let engine = SpectralEngine::new(&config);
        // 0.5 -> 0, 2.5 -> 2
        assert_eq!(engine.band_bins(8000).unwrap(), 0..2);
    }

    #[test]
    fn test_band_beyond_nyquist_is_shape_error() {
        let engine = SpectralEngine::new(&PsdConfig::default());
        assert!(matches!(engine.band_bins(8000), Err(PsdError::Shape(_))));
    }

    #[test]
    fn test_feature_is_normalized_and_band_limited() {
        let engine = SpectralEngine::new(&PsdConfig::default());
        let feature = engine.psd_feature(&chirp(4096, 32000.0), 32000).unwrap();

        assert_eq!(feature.power.len(), 246);
        assert_eq!(feature.freq.len(), 246);
        assert_relative_eq!(feature.freq[0], 312.5);
        assert_relative_eq!(*feature.freq.last().unwrap(), 7968.75);

        let n = feature.power.len() as f64;
        let mean = feature.power.iter().sum::<f64>() / n;
        let var = feature.power.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
        assert_relative_eq!(mean, 0.0, epsilon = 1e-9);
        assert_relative_eq!(var, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_feature_is_deterministic() {
        let engine = SpectralEngine::new(&PsdConfig::default());
        let segment = chirp(3000, 32000.0);

        let a = engine.psd_feature(&segment, 32000).unwrap();
        let b = engine.psd_feature(&segment, 32000).unwrap();
        assert_eq!(a, b);

        let other = SpectralEngine::new(&PsdConfig::default());
        assert_eq!(other.psd_feature(&segment, 32000).unwrap(), a);
    }

    #[test]
    fn test_feature_is_scale_invariant() {
        let engine = SpectralEngine::new(&PsdConfig::default());
        let segment = chirp(2048, 32000.0);
        let scaled: Vec<f64> = segment.iter().map(|s| s * 1000.0 + 3.0).collect();

        let a = engine.psd_feature(&segment, 32000).unwrap();
        let b = engine.psd_feature(&scaled, 32000).unwrap();
        for (x, y) in a.power.iter().zip(b.power.iter()) {
            assert_relative_eq!(x, y, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_constant_segment_is_numeric_error() {
        let engine = SpectralEngine::new(&PsdConfig::default());
        assert!(matches!(
            engine.psd_feature(&[0.25; 2048], 32000),
            Err(PsdError::Numeric(_))
        ));
        assert!(matches!(
            engine.psd_feature(&[], 32000),
            Err(PsdError::Numeric(_))
        ));
    }

    #[test]
    fn test_analyze_includes_band_limited_spectrogram() {
        let engine = SpectralEngine::new(&PsdConfig::default());
        let analysis = engine.analyze(&chirp(4096, 32000.0), 32000).unwrap();

        assert_eq!(analysis.psd.power.len(), 246);
        assert!(analysis.spectrogram.num_frames() > 1);
        assert!(analysis
            .spectrogram
            .freqs
            .iter()
            .all(|&f| (300.0..=8000.0).contains(&f)));
    }
}
