//! Cache error type

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bincode cache codec error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("JSON cache codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// The four parallel fields disagree in length
    #[error(
        "inconsistent cache: psd_list={psd}, file_list={files}, psd_notes={notes}, psd_context={contexts}"
    )]
    Inconsistent {
        psd: usize,
        files: usize,
        notes: usize,
        contexts: usize,
    },

    #[error("unknown cache file extension: {0}")]
    UnknownFormat(String),
}
