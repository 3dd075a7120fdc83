//! Configuration parameters for PSD feature extraction
//!
//! Every value the pipeline needs is carried here and passed explicitly;
//! nothing is looked up from ambient state.

use crate::error::{PsdError, Result};
use serde::{Deserialize, Serialize};
use songpsd_cache::CacheFormat;
use std::path::Path;

/// Feature extraction and basis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PsdConfig {
    // Frequency band kept in the PSD feature
    pub freq_lo_hz: f64,
    pub freq_hi_hz: f64,

    // Welch PSD resolution (power of two)
    pub nfft: usize,

    // Context padding before onset and after offset
    pub note_buffer_ms: f64,

    // Basis building
    pub min_basis_count: usize,
    pub vocabulary: String,

    pub spectrogram: SpectrogramConfig,
    pub cache_format: CacheFormat,
    pub song: SongDatabase,
}

impl Default for PsdConfig {
    fn default() -> Self {
        Self {
            freq_lo_hz: 300.0,
            freq_hi_hz: 8000.0,
            nfft: 1024,
            note_buffer_ms: 20.0,
            min_basis_count: 30,
            vocabulary: String::new(),
            spectrogram: SpectrogramConfig::default(),
            cache_format: CacheFormat::default(),
            song: SongDatabase::default(),
        }
    }
}

/// Short-time spectrogram used for figures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrogramConfig {
    pub nfft: usize,
    pub hop: usize,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        Self { nfft: 512, hop: 32 }
    }
}

/// Syllable categories of a bird's song
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SongDatabase {
    pub motif: String,
    pub calls: String,
    pub intro_notes: String,
}

impl PsdConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PsdError::Precondition(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: PsdConfig = toml::from_str(&content)
            .map_err(|e| PsdError::Precondition(format!("Failed to parse TOML config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.nfft < 2 || !self.nfft.is_power_of_two() {
            return Err(PsdError::Precondition(format!(
                "nfft must be a power of two >= 2, got {}",
                self.nfft
            )));
        }
        if !(self.freq_lo_hz >= 0.0) {
            return Err(PsdError::Precondition(
                "freq_lo_hz must be >= 0".to_string(),
            ));
        }
        if !(self.freq_lo_hz < self.freq_hi_hz) {
            return Err(PsdError::Precondition(
                "freq_lo_hz must be < freq_hi_hz".to_string(),
            ));
        }
        if !(self.note_buffer_ms >= 0.0) {
            return Err(PsdError::Precondition(
                "note_buffer_ms must be >= 0".to_string(),
            ));
        }
        if self.spectrogram.nfft < 2 {
            return Err(PsdError::Precondition(
                "spectrogram nfft must be >= 2".to_string(),
            ));
        }
        if self.spectrogram.hop == 0 {
            return Err(PsdError::Precondition(
                "spectrogram hop must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PsdConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.nfft, 1024);
        assert_eq!(config.min_basis_count, 30);
        assert_eq!(config.cache_format, CacheFormat::Bin);
    }

    #[test]
    fn test_rejects_non_power_of_two_nfft() {
        let config = PsdConfig {
            nfft: 1000,
            ..PsdConfig::default()
        };
        assert!(matches!(config.validate(), Err(PsdError::Precondition(_))));
    }

    #[test]
    fn test_rejects_inverted_band() {
        let config = PsdConfig {
            freq_lo_hz: 8000.0,
            freq_hi_hz: 300.0,
            ..PsdConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
            freq_lo_hz = 500.0
            vocabulary = "abcdeij"
            cache_format = "json"

            [song]
            motif = "abcde"
            calls = "j"
            intro_notes = "i"
        "#;

        let config: PsdConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.freq_lo_hz, 500.0);
        assert_eq!(config.freq_hi_hz, 8000.0);
        assert_eq!(config.vocabulary, "abcdeij");
        assert_eq!(config.cache_format, CacheFormat::Json);
        assert_eq!(config.song.motif, "abcde");
        assert_eq!(config.spectrogram.hop, 32);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("songpsd.toml");
        std::fs::write(&path, "nfft = 2048\nmin_basis_count = 10\n").unwrap();

        let config = PsdConfig::load(&path).unwrap();
        assert_eq!(config.nfft, 2048);
        assert_eq!(config.min_basis_count, 10);

        std::fs::write(&path, "nfft = 3\n").unwrap();
        assert!(PsdConfig::load(&path).is_err());
    }
}
