//! Songpsd feature-cache file format library
//!
//! A corpus keeps its extracted PSD features in a single artifact next to
//! the recordings (`PSD.bin` or `PSD.json`). The artifact holds four flat,
//! index-aligned fields; this crate owns that schema and its codecs.

pub mod error;
pub mod format;
pub mod reader;
pub mod writer;

pub use error::CacheError;
pub use format::{cache_path, CacheFormat, PsdCacheFile, CACHE_STEM};
pub use reader::CacheReader;
pub use writer::CacheWriter;
