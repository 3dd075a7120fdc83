//! PSD cache file structures

use crate::error::CacheError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File stem of the cache artifact inside a corpus directory
pub const CACHE_STEM: &str = "PSD";

/// Serialization used for the cache artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheFormat {
    /// bincode payload, `.bin`
    #[default]
    Bin,
    /// Pretty-printed JSON, `.json`
    Json,
}

impl CacheFormat {
    /// File extension (without the dot)
    pub fn extension(&self) -> &'static str {
        match self {
            CacheFormat::Bin => "bin",
            CacheFormat::Json => "json",
        }
    }

    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Result<Self, CacheError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("bin") => Ok(CacheFormat::Bin),
            Some("json") => Ok(CacheFormat::Json),
            other => Err(CacheError::UnknownFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }
}

/// Location of the cache artifact for a corpus directory: `<dir>/PSD.<ext>`
pub fn cache_path(corpus_dir: &Path, format: CacheFormat) -> PathBuf {
    corpus_dir.join(format!("{}.{}", CACHE_STEM, format.extension()))
}

/// Flat on-disk layout of a feature bundle.
///
/// Element `i` of every field describes the same syllable instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PsdCacheFile {
    /// Normalized, band-restricted PSD power per syllable
    pub psd_list: Vec<Vec<f64>>,
    /// Recording file name each PSD came from
    pub file_list: Vec<String>,
    /// Concatenated syllable labels, one char per PSD
    pub psd_notes: String,
    /// Social context per PSD: `U`, `D` or none
    pub psd_context: Vec<Option<char>>,
}

impl PsdCacheFile {
    /// Number of syllable entries
    pub fn len(&self) -> usize {
        self.psd_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.psd_list.is_empty()
    }

    /// Check that the four fields are index-aligned
    pub fn validate(&self) -> Result<(), CacheError> {
        let psd = self.psd_list.len();
        let files = self.file_list.len();
        let notes = self.psd_notes.chars().count();
        let contexts = self.psd_context.len();

        if psd == files && psd == notes && psd == contexts {
            Ok(())
        } else {
            Err(CacheError::Inconsistent {
                psd,
                files,
                notes,
                contexts,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_path() {
        let path = cache_path(Path::new("/data/bird1"), CacheFormat::Bin);
        assert_eq!(path, PathBuf::from("/data/bird1/PSD.bin"));

        let path = cache_path(Path::new("/data/bird1"), CacheFormat::Json);
        assert_eq!(path, PathBuf::from("/data/bird1/PSD.json"));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            CacheFormat::from_path(Path::new("PSD.json")).unwrap(),
            CacheFormat::Json
        );
        assert_eq!(
            CacheFormat::from_path(Path::new("PSD.bin")).unwrap(),
            CacheFormat::Bin
        );
        assert!(CacheFormat::from_path(Path::new("PSD.npy")).is_err());
    }

    #[test]
    fn test_validate_detects_desync() {
        let file = PsdCacheFile {
            psd_list: vec![vec![0.0; 4], vec![1.0; 4]],
            file_list: vec!["a.wav".into(), "a.wav".into()],
            psd_notes: "ab".into(),
            psd_context: vec![Some('U')],
        };

        match file.validate() {
            Err(CacheError::Inconsistent { contexts, .. }) => assert_eq!(contexts, 1),
            other => panic!("expected inconsistency, got {:?}", other),
        }
    }
}
