//! JSON output formatting

use serde::Serialize;
use songpsd_core::{BasisSet, CorpusOutcome, CorpusReport, NoteType};

#[derive(Serialize)]
struct GenerateOutput<'a> {
    status: &'static str,
    cache_file: String,
    num_features: usize,
    feature_len: Option<usize>,
    report: &'a CorpusReport,
    processing_time_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    figures_dir: Option<String>,
}

#[derive(Serialize)]
struct BasisOutput<'a> {
    cache_file: String,
    labels: Vec<char>,
    note_types: Vec<Option<char>>,
    counts: Vec<usize>,
    basis: Vec<&'a [f64]>,
}

fn print_pretty<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing output: {}", e),
    }
}

/// Print the summary of a corpus pass
pub fn print_generate_summary(
    outcome: &CorpusOutcome,
    elapsed_s: f64,
    figures_dir: Option<String>,
) {
    print_pretty(&GenerateOutput {
        status: "success",
        cache_file: outcome.cache_path.display().to_string(),
        num_features: outcome.bundle.len(),
        feature_len: outcome.bundle.feature_len(),
        report: &outcome.report,
        processing_time_seconds: elapsed_s,
        figures_dir,
    });
}

/// Basis templates with the category of each label, as pretty JSON
pub fn basis_json(
    cache_file: &str,
    basis: &BasisSet,
    note_types: &[Option<NoteType>],
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&build_basis_output(cache_file, basis, note_types))
}

fn build_basis_output<'a>(
    cache_file: &str,
    basis: &'a BasisSet,
    note_types: &[Option<NoteType>],
) -> BasisOutput<'a> {
    BasisOutput {
        cache_file: cache_file.to_string(),
        labels: basis.labels(),
        note_types: note_types.iter().map(|t| t.map(|t| t.code())).collect(),
        counts: basis.templates.iter().map(|t| t.count).collect(),
        basis: basis
            .templates
            .iter()
            .map(|t| t.mean_power.as_slice())
            .collect(),
    }
}
