//! Error taxonomy for the feature pipeline

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PsdError>;

#[derive(Debug, Error)]
pub enum PsdError {
    /// Malformed annotation or audio pairing; the recording is skipped
    #[error("data format error: {0}")]
    DataFormat(String),

    /// Degenerate signal (empty or constant); the syllable is skipped
    #[error("numeric error: {0}")]
    Numeric(String),

    /// Parallel sequences disagree in length; caller contract violation
    #[error("shape error: {0}")]
    Shape(String),

    /// Invalid configuration, missing corpus, or invalid flag combination
    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("WAV decode error: {0}")]
    Wav(#[from] hound::Error),

    #[error(transparent)]
    Cache(#[from] songpsd_cache::CacheError),
}

impl PsdError {
    /// Whether the error only invalidates the current recording or syllable
    /// and the corpus pass may continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PsdError::DataFormat(_) | PsdError::Numeric(_) | PsdError::Wav(_) | PsdError::Io(_)
        )
    }
}
