//! wcmo-ca - Collection Analyzer
//!
//! Classifies a wood-carving media library from path and filename evidence
//! alone: per file it infers subject candidates, production stage, sequence
//! position and cover desirability, then emits one reorganization
//! recommendation per file plus new-collection proposals once enough files
//! corroborate a subject. A stateless offline batch: no database, no network.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use wcmo_ca::config::AnalyzerParams;
use wcmo_ca::services::batch;
use wcmo_ca::taxonomy::Registry;
use wcmo_common::config::{resolve_library_root, TomlConfig};

#[derive(Parser, Debug)]
#[command(name = "wcmo-ca", version, about = "Wood-carving media collection analyzer")]
struct Cli {
    /// Media library root (falls back to WCMO_LIBRARY_ROOT, then config file)
    root: Option<String>,

    /// Taxonomy registry TOML (built-in vocabulary when omitted)
    #[arg(long)]
    taxonomy: Option<PathBuf>,

    /// Output directory for JSON artifacts
    #[arg(long)]
    output: Option<PathBuf>,

    /// Analysis profile: default, strict or lenient
    #[arg(long, default_value = "default")]
    profile: String,

    /// Override the candidate inclusion floor
    #[arg(long)]
    inclusion_floor: Option<f32>,

    /// Override the corroborating-file count for collection proposals
    #[arg(long)]
    min_members: Option<usize>,

    /// Override the directory recursion depth limit
    #[arg(long)]
    max_depth: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting wcmo-ca (Collection Analyzer) v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let toml_config = TomlConfig::load_default();

    let root = resolve_library_root(
        cli.root.as_deref(),
        "WCMO_LIBRARY_ROOT",
        toml_config.as_ref(),
    );
    info!("Library root: {}", root.display());

    // Registry problems silently degrade every downstream decision, so a
    // malformed taxonomy is fatal here rather than recovered from
    let registry = match cli
        .taxonomy
        .or_else(|| toml_config.as_ref().and_then(|c| c.taxonomy_path.as_ref().map(PathBuf::from)))
    {
        Some(path) => Registry::load(&path)?,
        None => {
            info!("Using built-in taxonomy vocabulary");
            Registry::builtin()
        }
    };
    info!("Taxonomy version: {}", registry.version());

    let mut params = AnalyzerParams::for_profile(&cli.profile)?;
    if let Some(floor) = cli.inclusion_floor {
        params.inclusion_floor = floor;
    }
    if let Some(min_members) = cli.min_members {
        params.min_member_count = min_members;
    }
    if let Some(max_depth) = cli.max_depth {
        params.max_depth = max_depth;
    }
    params.validate()?;

    let cancel = AtomicBool::new(false);
    let report = batch::run(&root, &registry, &params, &cancel)?;

    let out_dir = cli
        .output
        .or_else(|| toml_config.as_ref().and_then(|c| c.output_dir.as_ref().map(PathBuf::from)))
        .unwrap_or_else(|| PathBuf::from("wcmo-report"));
    wcmo_ca::report::write_artifacts(&report, &out_dir)?;

    info!(
        "Analyzed {} files ({} skipped): {} proposals, {} for review",
        report.files_analyzed,
        report.files_skipped,
        report.proposals.len(),
        report.review_queue.len()
    );

    Ok(())
}
