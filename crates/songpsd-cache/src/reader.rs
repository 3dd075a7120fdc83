//! PSD cache reader

use crate::error::CacheError;
use crate::format::{CacheFormat, PsdCacheFile};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub struct CacheReader;

impl CacheReader {
    /// Read a cache artifact, decoding by file extension
    pub fn read(path: &Path) -> Result<PsdCacheFile, CacheError> {
        let format = CacheFormat::from_path(path)?;
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let cache: PsdCacheFile = match format {
            CacheFormat::Bin => bincode::deserialize_from(reader)?,
            CacheFormat::Json => serde_json::from_reader(reader)?,
        };

        cache.validate()?;

        Ok(cache)
    }
}
