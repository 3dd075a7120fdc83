//! psdgen - Build the syllable PSD cache of a corpus directory
//!
//! Usage: psdgen [--config <path>] [--update] [--save-figures <dir>] <corpus_dir>

use anyhow::{Context, Result};
use clap::Parser;
use songpsd_cli::{init_logger, output::print_generate_summary};
use songpsd_core::{
    CorpusAggregator, CorpusOptions, FigureExportOptions, FigureExporter, PsdConfig,
};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "psdgen")]
#[command(about = "Extract per-syllable PSD features from annotated recordings", long_about = None)]
struct Args {
    /// Directory holding `<name>.wav` recordings and their annotations
    corpus_dir: PathBuf,

    /// Path to configuration file (TOML). Defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Delete any existing cache and recompute every feature
    #[arg(short, long)]
    update: bool,

    /// Write one figure document per syllable into this directory
    #[arg(long, value_name = "DIR")]
    save_figures: Option<PathBuf>,

    /// Nest saved figures under a dated subdirectory
    #[arg(long, requires = "save_figures")]
    add_date: bool,

    /// File extension of saved figures
    #[arg(long, default_value = "json")]
    fig_ext: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logger(args.verbose);

    run_psdgen(&args)
}

fn load_config(path: Option<&Path>) -> Result<PsdConfig> {
    match path {
        Some(path) => PsdConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(PsdConfig::default()),
    }
}

fn run_psdgen(args: &Args) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    let mut aggregator = CorpusAggregator::new(&config)?;

    let mut figures_dir = None;
    if let Some(dir) = &args.save_figures {
        let options = FigureExportOptions {
            add_date: args.add_date,
            extension: args.fig_ext.clone(),
            ..FigureExportOptions::new(dir)
        };
        let exporter = FigureExporter::new(&options);
        figures_dir = Some(exporter.output_dir().display().to_string());
        aggregator = aggregator.with_sink(Box::new(exporter));
    }

    let options = CorpusOptions::new(args.update, args.save_figures.is_some());

    log::info!("Processing corpus: {}", args.corpus_dir.display());

    let start = std::time::Instant::now();
    let outcome = aggregator
        .run(&args.corpus_dir, &options)
        .with_context(|| format!("Failed to build PSD cache for {}", args.corpus_dir.display()))?;
    let elapsed = start.elapsed();

    log::info!(
        "{} features ready in {:.2}s",
        outcome.bundle.len(),
        elapsed.as_secs_f64()
    );

    print_generate_summary(&outcome, elapsed.as_secs_f64(), figures_dir);

    Ok(())
}
