//! Per-syllable figure output
//!
//! The feature path hands each syllable's spectrogram and PSD to a
//! [`VisualizationSink`]. Rendering is left to whatever consumes the sink;
//! [`FigureExporter`] simply writes every figure's data to disk.

use crate::annotation::Context;
use crate::error::Result;
use crate::spectral::Spectrogram;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Data behind one spectrogram + PSD figure
#[derive(Debug, Clone, Serialize)]
pub struct SyllableFigure {
    /// `"<file>, note#<i> - <label> - <context>"`
    pub title: String,
    pub source_file: String,
    pub note_index: usize,
    pub label: char,
    pub context: Option<char>,
    /// Band shown on the frequency axis, Hz
    pub freq_range: (f64, f64),
    pub spectrogram: Spectrogram,
    pub psd_power: Vec<f64>,
    pub psd_freq: Vec<f64>,
}

impl SyllableFigure {
    pub fn title_for(source_file: &str, note_index: usize, label: char, context: Context) -> String {
        format!(
            "{}, note#{} - {} - {}",
            source_file, note_index, label, context
        )
    }
}

/// Receiver of syllable figures
pub trait VisualizationSink {
    fn emit(&mut self, figure: &SyllableFigure) -> Result<()>;
}

/// Where and how figures are written
#[derive(Debug, Clone)]
pub struct FigureExportOptions {
    pub output_dir: PathBuf,
    /// Nest figures under a `YYYY-MM-DD` subdirectory
    pub add_date: bool,
    /// File extension without the dot
    pub extension: String,
}

impl FigureExportOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            add_date: false,
            extension: "json".to_string(),
        }
    }
}

/// Writes each figure as a JSON document
///
/// The output directory is created with the first figure, so an exporter
/// for a pass that never emits leaves nothing on disk.
pub struct FigureExporter {
    dir: PathBuf,
    extension: String,
    written: usize,
}

impl FigureExporter {
    /// Resolve the output directory, nesting today's date when requested
    pub fn new(options: &FigureExportOptions) -> Self {
        let dir = if options.add_date {
            let today = chrono::Local::now().format("%Y-%m-%d").to_string();
            options.output_dir.join(today)
        } else {
            options.output_dir.clone()
        };

        Self {
            dir,
            extension: options.extension.trim_start_matches('.').to_string(),
            written: 0,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.dir
    }

    /// Number of figures written so far
    pub fn written(&self) -> usize {
        self.written
    }

    fn figure_path(&self, title: &str) -> PathBuf {
        let name: String = title
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect();
        self.dir.join(format!("{}.{}", name, self.extension))
    }
}

impl VisualizationSink for FigureExporter {
    fn emit(&mut self, figure: &SyllableFigure) -> Result<()> {
        if self.written == 0 {
            std::fs::create_dir_all(&self.dir)?;
            log::info!("Writing syllable figures to {}", self.dir.display());
        }

        let path = self.figure_path(&figure.title);
        let json = serde_json::to_string(figure).map_err(std::io::Error::from)?;
        std::fs::write(&path, json)?;
        self.written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn figure() -> SyllableFigure {
        SyllableFigure {
            title: SyllableFigure::title_for("b1_D.wav", 3, 'a', Context::Directed),
            source_file: "b1_D.wav".to_string(),
            note_index: 3,
            label: 'a',
            context: Some('D'),
            freq_range: (300.0, 8000.0),
            spectrogram: Spectrogram {
                power: vec![vec![1.0, 2.0]],
                freqs: vec![500.0],
                times: vec![0.0, 0.001],
            },
            psd_power: vec![0.5, -0.5],
            psd_freq: vec![500.0, 531.25],
        }
    }

    #[test]
    fn test_title_format() {
        assert_eq!(figure().title, "b1_D.wav, note#3 - a - D");
        assert_eq!(
            SyllableFigure::title_for("b2.wav", 0, 'c', Context::Unknown),
            "b2.wav, note#0 - c - None"
        );
    }

    #[test]
    fn test_exporter_writes_figures() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = FigureExportOptions::new(dir.path().join("figs"));
        options.extension = ".fig.json".to_string();

        let mut exporter = FigureExporter::new(&options);
        assert!(!dir.path().join("figs").exists());
        exporter.emit(&figure()).unwrap();

        let path = dir
            .path()
            .join("figs")
            .join("b1_D.wav, note#3 - a - D.fig.json");
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["label"], "a");
        assert_eq!(value["psd_freq"][1], 531.25);
        assert_eq!(exporter.written(), 1);
    }

    #[test]
    fn test_exporter_date_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let options = FigureExportOptions {
            add_date: true,
            ..FigureExportOptions::new(dir.path())
        };

        let exporter = FigureExporter::new(&options);
        let leaf = exporter.output_dir().file_name().unwrap().to_str().unwrap();
        assert_eq!(leaf.len(), 10);
        assert!(chrono::NaiveDate::parse_from_str(leaf, "%Y-%m-%d").is_ok());
    }
}
