//! PSD cache writer

use crate::error::CacheError;
use crate::format::{CacheFormat, PsdCacheFile};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct CacheWriter {}

impl CacheWriter {
    pub fn new() -> Self {
        Self {}
    }

    /// Write a cache artifact, encoding by file extension.
    ///
    /// The artifact is written next to `path` and renamed over it once
    /// complete; a failed write leaves any previous artifact in place.
    pub fn write(&self, path: &Path, cache: &PsdCacheFile) -> Result<(), CacheError> {
        cache.validate()?;
        let format = CacheFormat::from_path(path)?;

        let staging = staging_path(path);
        if let Err(e) = Self::encode(&staging, format, cache) {
            let _ = std::fs::remove_file(&staging);
            return Err(e);
        }
        std::fs::rename(&staging, path)?;

        Ok(())
    }

    fn encode(path: &Path, format: CacheFormat, cache: &PsdCacheFile) -> Result<(), CacheError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        match format {
            CacheFormat::Bin => bincode::serialize_into(&mut writer, cache)?,
            CacheFormat::Json => serde_json::to_writer_pretty(&mut writer, cache)?,
        }

        writer.flush()?;
        Ok(())
    }
}

/// `<path>.tmp`, in the same directory so the rename stays on one filesystem
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

impl Default for CacheWriter {
    fn default() -> Self {
        Self::new()
    }
}
