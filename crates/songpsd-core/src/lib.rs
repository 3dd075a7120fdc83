//! Songpsd Core - Birdsong syllable PSD features
//!
//! This crate reads annotated birdsong recordings, extracts the power
//! spectral density of every labeled syllable and aggregates the features
//! of a whole corpus into a cached bundle, from which per-label basis
//! templates are built.

pub mod annotation;
pub mod audio;
pub mod basis;
pub mod bundle;
pub mod cache_policy;
pub mod config;
pub mod corpus;
pub mod error;
pub mod note_type;
pub mod segmentation;
pub mod spectral;
pub mod visualization;

pub use annotation::{read_annotation, Annotation, AnnotationRecord, Context, TimeUnit};
pub use basis::{build_basis, find_label, unique_labels, BasisSet, BasisTemplate};
pub use bundle::{FeatureBundle, FeatureRecord};
pub use cache_policy::{CacheAction, CachePolicy};
pub use config::PsdConfig;
pub use corpus::{BundleSource, CorpusAggregator, CorpusOptions, CorpusOutcome, CorpusReport};
pub use error::{PsdError, Result};
pub use note_type::{note_types, NoteType};
pub use segmentation::{extract_segment, Segment};
pub use spectral::{normalize, PsdFeature, SpectralEngine};
pub use visualization::{FigureExportOptions, FigureExporter, SyllableFigure, VisualizationSink};

