//! Batch orchestration
//!
//! One run over a library subtree: scan, analyze every file in parallel,
//! aggregate once the corpus is fully seen, and assemble the BatchReport.
//! Per-file work shares no mutable state, so rayon may schedule it in any
//! order; the aggregation itself is order-independent.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::Utc;
use rayon::prelude::*;

use wcmo_common::Result;

use crate::config::AnalyzerParams;
use crate::report;
use crate::services::file_scanner::FileScanner;
use crate::services::{aggregator, placement_verifier, recommendation, signal_extractor};
use crate::taxonomy::Registry;
use crate::types::{BatchReport, FileAnalysis, FileRecord, MediaKind};

/// Run one complete analysis batch
///
/// The cancel flag stops scheduling of not-yet-started files; analyses
/// already computed stay in the report and the unprocessed remainder is
/// counted as skipped. Unreadable files are skipped and counted by the
/// scanner — the batch itself never fails on a bad file.
pub fn run(
    root: &Path,
    registry: &Registry,
    params: &AnalyzerParams,
    cancel: &AtomicBool,
) -> Result<BatchReport> {
    let started = Instant::now();

    let scanner = FileScanner::new(params.max_depth);
    let scan = scanner.scan(root)?;
    let files_seen = scan.files.len();

    tracing::info!(
        files = files_seen,
        skipped = scan.skipped,
        "Scan complete, analyzing"
    );

    let analyses: Vec<Option<FileAnalysis>> = scan
        .files
        .par_iter()
        .map(|path| {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            Some(analyze_file(root, path, registry, params))
        })
        .collect();

    let cancelled = analyses.iter().filter(|a| a.is_none()).count();
    if cancelled > 0 {
        tracing::warn!(cancelled, "Batch cancelled before completion");
    }
    let analyses: Vec<FileAnalysis> = analyses.into_iter().flatten().collect();

    // Single serialization point: proposals only materialize over the
    // complete analysis set
    let proposals = aggregator::collect_proposals(&analyses, registry, params);
    let collection_stats = aggregator::collect_stats(&analyses, params);
    let review_queue = report::build_review_queue(&analyses);
    let action_counts = report::count_actions(&analyses);

    let report = BatchReport {
        generated_at: Utc::now(),
        root: root.to_path_buf(),
        registry_version: registry.version().to_string(),
        files_seen,
        files_analyzed: analyses.len(),
        files_skipped: scan.skipped + cancelled,
        elapsed_seconds: started.elapsed().as_secs_f64(),
        action_counts,
        recommendations: analyses
            .iter()
            .map(|a| a.recommendation.clone())
            .collect(),
        proposals,
        collection_stats,
        review_queue,
    };

    tracing::info!(
        analyzed = report.files_analyzed,
        skipped = report.files_skipped,
        proposals = report.proposals.len(),
        review = report.review_queue.len(),
        "Batch complete in {:.2}s",
        report.elapsed_seconds
    );

    Ok(report)
}

/// Analyze one file: record -> signals -> verdict -> recommendation
fn analyze_file(
    root: &Path,
    path: &Path,
    registry: &Registry,
    params: &AnalyzerParams,
) -> FileAnalysis {
    let record = build_record(root, path, registry, params);
    let signals = signal_extractor::extract(&record, registry, params);
    let verdict = placement_verifier::verify(&record, &signals, registry);
    let recommendation =
        recommendation::synthesize(&record, &signals, &verdict, registry, params);

    FileAnalysis {
        record,
        signals,
        verdict,
        recommendation,
    }
}

/// Build the immutable FileRecord for one scanned path
fn build_record(
    root: &Path,
    path: &Path,
    registry: &Registry,
    params: &AnalyzerParams,
) -> FileRecord {
    let relative_path: PathBuf = path
        .strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf());

    let filename = relative_path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let kind = relative_path
        .extension()
        .and_then(|ext| MediaKind::from_extension(&ext.to_string_lossy().to_lowercase()))
        .unwrap_or(MediaKind::Image);

    let mut record = FileRecord {
        absolute_path: path.to_path_buf(),
        relative_path,
        filename,
        current_collection: String::new(),
        kind,
    };

    let segments = signal_extractor::path_segments(&record);
    record.current_collection = placement_verifier::resolve_collection(&segments, registry, params);
    record
}
