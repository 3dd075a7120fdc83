//! Corpus-wide PSD feature extraction
//!
//! Walks every recording of a corpus directory, extracts one PSD feature
//! per annotated syllable and caches the resulting bundle next to the
//! recordings.

use crate::annotation::{annotation_path_for, read_annotation, TimeUnit};
use crate::audio::decode_wav;
use crate::bundle::{FeatureBundle, FeatureRecord};
use crate::cache_policy::{CacheAction, CachePolicy};
use crate::config::PsdConfig;
use crate::error::{PsdError, Result};
use crate::segmentation::{extract_segment, syllable_window};
use crate::spectral::SpectralEngine;
use crate::visualization::{SyllableFigure, VisualizationSink};
use serde::Serialize;
use songpsd_cache::cache_path;
use std::path::{Path, PathBuf};


/// Options of one corpus pass
#[derive(Debug, Clone, Copy, Default)]
pub struct CorpusOptions {
    pub policy: CachePolicy,
    /// Emit a figure per syllable; needs a sink and a recomputing pass
    pub persist_visualizations: bool,
}

impl CorpusOptions {
    pub fn new(update: bool, persist_visualizations: bool) -> Self {
        Self {
            policy: CachePolicy::from_update_flag(update),
            persist_visualizations,
        }
    }
}

/// Where the returned bundle came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleSource {
    Cached,
    Computed,
}

/// Summary of a corpus pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusReport {
    pub source: BundleSource,
    pub recordings_total: usize,
    pub recordings_processed: usize,
    pub recordings_skipped: usize,
    pub syllables_extracted: usize,
    pub syllables_skipped: usize,
    pub figures_emitted: usize,
}

impl CorpusReport {
    fn new(source: BundleSource) -> Self {
        Self {
            source,
            recordings_total: 0,
            recordings_processed: 0,
            recordings_skipped: 0,
            syllables_extracted: 0,
            syllables_skipped: 0,
            figures_emitted: 0,
        }
    }
}

/// Result of a corpus pass
#[derive(Debug, Clone)]
pub struct CorpusOutcome {
    pub bundle: FeatureBundle,
    pub report: CorpusReport,
    pub cache_path: PathBuf,
}

/// Drives annotation reading, segment extraction and PSD computation over
/// a corpus directory.
pub struct CorpusAggregator {
    config: PsdConfig,
    engine: SpectralEngine,
    sink: Option<Box<dyn VisualizationSink>>,
}

impl CorpusAggregator {
    pub fn new(config: &PsdConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
            engine: SpectralEngine::new(config),
            sink: None,
        })
    }

    /// Attach the receiver of per-syllable figures
    pub fn with_sink(mut self, sink: Box<dyn VisualizationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Path of the cache artifact for a corpus directory
    pub fn cache_path(&self, corpus_dir: &Path) -> PathBuf {
        cache_path(corpus_dir, self.config.cache_format)
    }

    /// Load or compute the feature bundle of `corpus_dir`
    pub fn run(&mut self, corpus_dir: &Path, options: &CorpusOptions) -> Result<CorpusOutcome> {
        if !corpus_dir.is_dir() {
            return Err(PsdError::Precondition(format!(
                "corpus directory not found: {}",
                corpus_dir.display()
            )));
        }

        let cache_path = self.cache_path(corpus_dir);
        let cache_exists = cache_path.is_file();

        if options.persist_visualizations {
            if !options.policy.permits_visualizations(cache_exists) {
                return Err(PsdError::Precondition(format!(
                    "figures can only be saved when recomputing; {} exists, request an update",
                    cache_path.display()
                )));
            }
            if self.sink.is_none() {
                return Err(PsdError::Precondition(
                    "figures requested but no visualization sink attached".to_string(),
                ));
            }
        }

        if options.policy.action(cache_exists) == CacheAction::Load {
            log::info!("Loading cached features from {}", cache_path.display());
            let bundle = FeatureBundle::load(&cache_path)?;
            let mut report = CorpusReport::new(BundleSource::Cached);
            report.syllables_extracted = bundle.len();
            return Ok(CorpusOutcome {
                bundle,
                report,
                cache_path,
            });
        }

        let recordings = list_recordings(corpus_dir)?;
        if recordings.is_empty() {
            return Err(PsdError::Precondition(format!(
                "no .wav recordings in {}",
                corpus_dir.display()
            )));
        }

        let mut bundle = FeatureBundle::new();
        let mut report = CorpusReport::new(BundleSource::Computed);
        report.recordings_total = recordings.len();

        for path in &recordings {
            match self.process_recording(path, options, &mut bundle, &mut report) {
                Ok(count) => {
                    report.recordings_processed += 1;
                    log::info!("{}: {} syllable features", path.display(), count);
                }
                Err(e) if e.is_recoverable() => {
                    report.recordings_skipped += 1;
                    log::error!("Skipping {}: {}", path.display(), e);
                }
                Err(e) => return Err(e),
            }
        }

        report.syllables_extracted = bundle.len();

        // Replaces any previous artifact only once the new one is complete
        bundle.store(&cache_path)?;

        log::info!(
            "Cached {} features from {} recordings ({} skipped) to {}",
            bundle.len(),
            report.recordings_processed,
            report.recordings_skipped,
            cache_path.display()
        );

        Ok(CorpusOutcome {
            bundle,
            report,
            cache_path,
        })
    }

    /// Extract the features of one recording, returning how many were added
    fn process_recording(
        &mut self,
        path: &Path,
        options: &CorpusOptions,
        bundle: &mut FeatureBundle,
        report: &mut CorpusReport,
    ) -> Result<usize> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PsdError::DataFormat(format!("invalid file name: {}", path.display())))?
            .to_string();

        let annotation_path = annotation_path_for(path).ok_or_else(|| {
            PsdError::DataFormat(format!("no annotation paired with {}", file_name))
        })?;
        let annotation = read_annotation(&annotation_path, TimeUnit::Milliseconds)?;
        let track = decode_wav(path)?;

        let feature_len = self
            .engine
            .feature_len(track.sample_rate)
            .map_err(|e| PsdError::DataFormat(format!("{}: {}", file_name, e)))?;
        if let Some(expected) = bundle.feature_len() {
            if feature_len != expected {
                return Err(PsdError::DataFormat(format!(
                    "{} @ {} Hz yields {} PSD bins, corpus uses {}",
                    file_name, track.sample_rate, feature_len, expected
                )));
            }
        }

        let timestamps = track.timestamps();
        let visualize = options.persist_visualizations && self.sink.is_some();
        let mut added = 0;

        for (i, instance) in annotation.record.instances(&file_name).into_iter().enumerate() {
            let (start, end) =
                syllable_window(instance.onset, instance.offset, self.config.note_buffer_ms);
            let segment = extract_segment(&timestamps, start, end);
            let samples = segment.samples(&track.samples);

            let result = if visualize {
                self.engine
                    .analyze(samples, track.sample_rate)
                    .map(|a| (a.psd, Some(a.spectrogram)))
            } else {
                self.engine
                    .psd_feature(samples, track.sample_rate)
                    .map(|psd| (psd, None))
            };

            let (psd, spectrogram) = match result {
                Ok(output) => output,
                Err(e) if e.is_recoverable() => {
                    report.syllables_skipped += 1;
                    log::warn!(
                        "{}: skipping note#{} '{}' ({:.1}-{:.1} ms): {}",
                        file_name,
                        i,
                        instance.label,
                        instance.onset,
                        instance.offset,
                        e
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };

            if let (Some(sink), Some(spectrogram)) = (self.sink.as_mut(), spectrogram) {
                let figure = SyllableFigure {
                    title: SyllableFigure::title_for(&file_name, i, instance.label, instance.context),
                    source_file: file_name.clone(),
                    note_index: i,
                    label: instance.label,
                    context: instance.context.tag(),
                    freq_range: (self.config.freq_lo_hz, self.config.freq_hi_hz),
                    spectrogram,
                    psd_power: psd.power.clone(),
                    psd_freq: psd.freq,
                };
                match sink.emit(&figure) {
                    Ok(()) => report.figures_emitted += 1,
                    Err(e) => log::warn!("Failed to emit figure '{}': {}", figure.title, e),
                }
            }

            log::debug!(
                "{}: note#{} '{}' -> {} samples",
                file_name,
                i,
                instance.label,
                segment.len()
            );

            bundle.push(FeatureRecord {
                power: psd.power,
                source_file: instance.source_file,
                label: instance.label,
                context: instance.context,
            })?;
            added += 1;
        }

        Ok(added)
    }
}

/// `.wav` files of a directory, sorted by name
pub fn list_recordings(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut recordings: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("wav"))
                    .unwrap_or(false)
        })
        .collect();
    recordings.sort();
    Ok(recordings)
}
