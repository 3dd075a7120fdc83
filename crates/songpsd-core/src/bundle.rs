//! Corpus feature bundle
//!
//! Held as one record per syllable instance so the PSD, file, label and
//! context of a syllable can never drift apart. The four parallel
//! sequences only exist at the cache boundary.

use crate::annotation::Context;
use crate::error::{PsdError, Result};
use songpsd_cache::{CacheReader, CacheWriter, PsdCacheFile};
use std::path::Path;

/// Feature of one syllable instance
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    /// Normalized band-restricted PSD power
    pub power: Vec<f64>,
    pub source_file: String,
    pub label: char,
    pub context: Context,
}

/// All syllable features of a corpus, in extraction order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureBundle {
    records: Vec<FeatureRecord>,
}

impl FeatureBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record; every PSD must have the same length
    pub fn push(&mut self, record: FeatureRecord) -> Result<()> {
        if let Some(len) = self.feature_len() {
            if record.power.len() != len {
                return Err(PsdError::Shape(format!(
                    "PSD of length {} from {} does not match bundle length {}",
                    record.power.len(),
                    record.source_file,
                    len
                )));
            }
        }
        self.records.push(record);
        Ok(())
    }

    pub fn records(&self) -> &[FeatureRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Length shared by every PSD, once one exists
    pub fn feature_len(&self) -> Option<usize> {
        self.records.first().map(|r| r.power.len())
    }

    pub fn psd_list(&self) -> Vec<Vec<f64>> {
        self.records.iter().map(|r| r.power.clone()).collect()
    }

    pub fn file_list(&self) -> Vec<String> {
        self.records.iter().map(|r| r.source_file.clone()).collect()
    }

    /// Concatenated labels, one char per record
    pub fn notes(&self) -> String {
        self.records.iter().map(|r| r.label).collect()
    }

    pub fn contexts(&self) -> Vec<Context> {
        self.records.iter().map(|r| r.context).collect()
    }

    /// Flatten into the on-disk layout
    pub fn to_cache_file(&self) -> PsdCacheFile {
        PsdCacheFile {
            psd_list: self.psd_list(),
            file_list: self.file_list(),
            psd_notes: self.notes(),
            psd_context: self.records.iter().map(|r| r.context.tag()).collect(),
        }
    }

    /// Rebuild from the on-disk layout
    pub fn from_cache_file(cache: PsdCacheFile) -> Result<Self> {
        cache.validate()?;

        let PsdCacheFile {
            psd_list,
            file_list,
            psd_notes,
            psd_context,
        } = cache;

        let mut bundle = Self::new();
        for (((power, source_file), label), context) in psd_list
            .into_iter()
            .zip(file_list)
            .zip(psd_notes.chars())
            .zip(psd_context)
        {
            bundle.push(FeatureRecord {
                power,
                source_file,
                label,
                context: Context::from_tag(context),
            })?;
        }

        Ok(bundle)
    }

    /// Load a cached bundle
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_cache_file(CacheReader::read(path)?)
    }

    /// Persist the bundle, replacing any existing artifact
    pub fn store(&self, path: &Path) -> Result<()> {
        CacheWriter::new().write(path, &self.to_cache_file())?;
        Ok(())
    }
}
