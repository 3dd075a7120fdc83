//! psdbasis - Build basis PSD templates from a corpus cache
//!
//! Usage: psdbasis [--config <path>] [--vocabulary <labels>] [--min-count <n>] [--output <file>] <corpus_dir>

use anyhow::{Context, Result};
use clap::Parser;
use songpsd_cli::{init_logger, output::basis_json};
use songpsd_core::{build_basis, note_types, FeatureBundle, PsdConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "psdbasis")]
#[command(about = "Average cached syllable PSDs into per-label basis templates", long_about = None)]
struct Args {
    /// Corpus directory whose cache was built by psdgen
    corpus_dir: PathBuf,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Labels eligible for a basis (overrides the config)
    #[arg(long)]
    vocabulary: Option<String>,

    /// Minimum samples per label (overrides the config)
    #[arg(long)]
    min_count: Option<usize>,

    /// Write the basis JSON to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logger(args.verbose);

    run_psdbasis(&args)
}

fn run_psdbasis(args: &Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => PsdConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PsdConfig::default(),
    };
    if let Some(vocabulary) = &args.vocabulary {
        config.vocabulary = vocabulary.clone();
    }
    if let Some(min_count) = args.min_count {
        config.min_basis_count = min_count;
    }

    if config.vocabulary.is_empty() {
        anyhow::bail!("No vocabulary given; set `vocabulary` in the config or pass --vocabulary");
    }

    let cache_path = songpsd_cache::cache_path(&args.corpus_dir, config.cache_format);
    if !cache_path.is_file() {
        anyhow::bail!(
            "Cache not found: {} (run psdgen first)",
            cache_path.display()
        );
    }

    let bundle = FeatureBundle::load(&cache_path)
        .with_context(|| format!("Failed to read cache {}", cache_path.display()))?;
    log::info!(
        "Loaded {} features from {}",
        bundle.len(),
        cache_path.display()
    );

    let basis = build_basis(
        &bundle.psd_list(),
        &bundle.notes(),
        &config.vocabulary,
        config.min_basis_count,
    )?;

    log::info!(
        "{} basis templates (vocabulary '{}', min count {})",
        basis.len(),
        config.vocabulary,
        config.min_basis_count
    );

    let types = note_types(basis.labels(), &config.song);
    let json = basis_json(&cache_path.display().to_string(), &basis, &types)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Basis written to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
