//! Report assembly and artifact output
//!
//! Serializes the batch results into the JSON artifacts consumed by the
//! downstream tools: the move-execution tool (recommendations), the
//! collection scaffolder (proposals), reporting (statistics) and the manual
//! adjudication UI (review queue). The analyzer renders nothing itself.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde_json::json;

use wcmo_common::{Error, Result};

use crate::types::{Action, BatchReport, FileAnalysis, ReviewItem};

/// Collect the adjudication payload for every ambiguous file
///
/// `review` and `split` recommendations need a human decision; everything
/// the UI must render travels in the item.
pub fn build_review_queue(analyses: &[FileAnalysis]) -> Vec<ReviewItem> {
    analyses
        .iter()
        .filter(|a| matches!(a.recommendation.action, Action::Review | Action::Split))
        .map(|a| ReviewItem {
            path: a.record.relative_path.clone(),
            action: a.recommendation.action,
            subject_candidates: a.signals.subject_candidates.clone(),
            stage: a.signals.stage.clone(),
            issues: a.verdict.issues.clone(),
        })
        .collect()
}

/// Count recommendations per action name
pub fn count_actions(analyses: &[FileAnalysis]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for analysis in analyses {
        *counts
            .entry(analysis.recommendation.action.as_str().to_string())
            .or_insert(0) += 1;
    }
    counts
}

/// Write all batch artifacts into the output directory
pub fn write_artifacts(report: &BatchReport, out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir)?;

    write_json(&out_dir.join("recommendations.json"), &report.recommendations)?;
    write_json(&out_dir.join("proposals.json"), &report.proposals)?;
    write_json(&out_dir.join("collection_stats.json"), &report.collection_stats)?;
    write_json(&out_dir.join("review_queue.json"), &report.review_queue)?;

    let summary = json!({
        "generated_at": report.generated_at,
        "root": report.root,
        "registry_version": report.registry_version,
        "files_seen": report.files_seen,
        "files_analyzed": report.files_analyzed,
        "files_skipped": report.files_skipped,
        "elapsed_seconds": report.elapsed_seconds,
        "action_counts": report.action_counts,
        "proposal_count": report.proposals.len(),
        "review_count": report.review_queue.len(),
    });
    write_json(&out_dir.join("summary.json"), &summary)?;

    tracing::info!("Artifacts written to {}", out_dir.display());
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .map_err(|e| Error::Internal(format!("Serialize {} failed: {}", path.display(), e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerParams;
    use crate::services::{placement_verifier, recommendation, signal_extractor};
    use crate::taxonomy::Registry;
    use crate::types::{FileRecord, MediaKind};
    use std::path::PathBuf;

    fn analyze(relative: &str) -> FileAnalysis {
        let registry = Registry::builtin();
        let params = AnalyzerParams::default();

        let relative_path = PathBuf::from(relative);
        let filename = relative_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        let mut record = FileRecord {
            absolute_path: PathBuf::from("/library").join(relative),
            relative_path,
            filename,
            current_collection: String::new(),
            kind: MediaKind::Image,
        };
        let segments = signal_extractor::path_segments(&record);
        record.current_collection =
            placement_verifier::resolve_collection(&segments, &registry, &params);

        let signals = signal_extractor::extract(&record, &registry, &params);
        let verdict = placement_verifier::verify(&record, &signals, &registry);
        let recommendation =
            recommendation::synthesize(&record, &signals, &verdict, &registry, &params);
        FileAnalysis {
            record,
            signals,
            verdict,
            recommendation,
        }
    }

    #[test]
    fn test_review_queue_contains_only_ambiguous_files() {
        let analyses = vec![
            analyze("projects/bass/final/IMG_9001.JPG"), // keep
            analyze("unsorted/bass_eagle_display.jpg"),  // split
            analyze("randomstuff/IMG_1234.jpg"),         // review
        ];
        let queue = build_review_queue(&analyses);
        assert_eq!(queue.len(), 2);
        assert!(queue.iter().any(|i| i.action == Action::Split));
        assert!(queue.iter().any(|i| i.action == Action::Review));
        // Split payload carries every candidate for adjudication
        let split = queue.iter().find(|i| i.action == Action::Split).unwrap();
        assert_eq!(split.subject_candidates.len(), 2);
    }

    #[test]
    fn test_action_counts() {
        let analyses = vec![
            analyze("projects/bass/final/IMG_9001.JPG"),
            analyze("projects/bass/final/IMG_9002.JPG"),
            analyze("unsorted/bass_eagle_display.jpg"),
        ];
        let counts = count_actions(&analyses);
        assert_eq!(counts.get("keep"), Some(&2));
        assert_eq!(counts.get("split"), Some(&1));
    }
}
