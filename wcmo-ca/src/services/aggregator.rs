//! Cross-file aggregation
//!
//! The only component holding cross-file state. Two independent reductions
//! over the complete set of per-file analyses:
//!
//! - descriptive per-collection statistics (never decision-bearing)
//! - proposal votes per subject id, materialized into CollectionProposals
//!   once the corroboration threshold is reached
//!
//! Both reductions are order-independent: grouping uses ordered maps, member
//! lists are sorted by path, and ties in the cover argmax break by path. The
//! result never depends on file processing order or parallel scheduling.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::AnalyzerParams;
use crate::taxonomy::Registry;
use crate::types::{Action, CollectionProposal, CollectionStats, FileAnalysis};

/// One file's vote toward a subject's CollectionProposal
#[derive(Debug, Clone)]
struct ProposalVote {
    path: PathBuf,
    confidence: f32,
    cover_score: f32,
}

/// Materialize CollectionProposals from the complete analysis set
///
/// Every `propose_new_collection` recommendation votes for its target
/// subject; every `split` recommendation votes once per subject candidate
/// (the file is simultaneous evidence for several collections). A proposal
/// materializes only when a subject accumulates at least
/// `min_member_count` corroborating files.
pub fn collect_proposals(
    analyses: &[FileAnalysis],
    registry: &Registry,
    params: &AnalyzerParams,
) -> Vec<CollectionProposal> {
    let mut votes: BTreeMap<String, Vec<ProposalVote>> = BTreeMap::new();

    for analysis in analyses {
        match analysis.recommendation.action {
            Action::ProposeNewCollection => {
                if let Some(top) = analysis.signals.top_candidate() {
                    votes.entry(top.subject_id.clone()).or_default().push(ProposalVote {
                        path: analysis.record.relative_path.clone(),
                        confidence: top.confidence,
                        cover_score: analysis.signals.cover_score,
                    });
                }
            }
            Action::Split => {
                for candidate in &analysis.signals.subject_candidates {
                    votes.entry(candidate.subject_id.clone()).or_default().push(ProposalVote {
                        path: analysis.record.relative_path.clone(),
                        confidence: candidate.confidence,
                        cover_score: analysis.signals.cover_score,
                    });
                }
            }
            _ => {}
        }
    }

    let mut proposals = Vec::new();
    for (subject_id, mut members) in votes {
        if members.len() < params.min_member_count {
            continue;
        }
        members.sort_by(|a, b| a.path.cmp(&b.path));

        let cover_file = members
            .iter()
            .max_by(|a, b| {
                let score_a = a.cover_score * a.confidence;
                let score_b = b.cover_score * b.confidence;
                score_a
                    .partial_cmp(&score_b)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    // Ties break toward the lexically smaller path
                    .then_with(|| b.path.cmp(&a.path))
            })
            .map(|v| v.path.clone())
            .unwrap_or_default();

        let aggregate_confidence =
            members.iter().map(|v| v.confidence).sum::<f32>() / members.len() as f32;

        let proposed_collection = registry
            .subject_by_id(&subject_id)
            .map(|s| s.collection_name())
            .unwrap_or_else(|| subject_id.clone());

        tracing::debug!(
            subject = %subject_id,
            members = members.len(),
            confidence = aggregate_confidence,
            "Collection proposal materialized"
        );

        proposals.push(CollectionProposal {
            subject_id,
            proposed_collection,
            member_files: members.iter().map(|v| v.path.clone()).collect(),
            cover_file,
            aggregate_confidence,
        });
    }

    proposals
}

/// Per-collection statistics accumulator
#[derive(Default)]
struct StatsAccumulator {
    file_count: usize,
    stage_counts: BTreeMap<String, usize>,
    with_sequence: usize,
    high_quality: usize,
    cover_sum: f32,
}

/// Compute descriptive statistics per origin collection
pub fn collect_stats(analyses: &[FileAnalysis], params: &AnalyzerParams) -> Vec<CollectionStats> {
    let mut by_collection: BTreeMap<String, StatsAccumulator> = BTreeMap::new();

    for analysis in analyses {
        let acc = by_collection
            .entry(analysis.record.current_collection.clone())
            .or_default();

        acc.file_count += 1;

        let stage_key = analysis
            .signals
            .stage
            .as_ref()
            .map(|s| s.stage_id.clone())
            .unwrap_or_else(|| "unclassified".to_string());
        *acc.stage_counts.entry(stage_key).or_insert(0) += 1;

        if analysis.signals.sequence_number.is_some() {
            acc.with_sequence += 1;
        }
        if analysis.signals.cover_score >= params.cover_quality_threshold {
            acc.high_quality += 1;
        }
        acc.cover_sum += analysis.signals.cover_score;
    }

    by_collection
        .into_iter()
        .map(|(collection, acc)| {
            let n = acc.file_count as f32;
            CollectionStats {
                collection,
                file_count: acc.file_count,
                stage_distribution: acc.stage_counts,
                sequence_fraction: acc.with_sequence as f32 / n,
                high_quality_fraction: acc.high_quality as f32 / n,
                mean_cover_score: acc.cover_sum / n,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{placement_verifier, recommendation, signal_extractor};
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
    fn test_proposal_gating_below_threshold() {
        let analyses = vec![
            analyze("nature/dragonfly_011.jpg"),
            analyze("nature/dragonfly_012.jpg"),
        ];
        let proposals =
            collect_proposals(&analyses, &Registry::builtin(), &AnalyzerParams::default());
        assert!(proposals.is_empty());
    }

    #[test]
    fn test_third_corroborating_file_materializes_one_proposal() {
        let analyses = vec![
            analyze("nature/dragonfly_011.jpg"),
            analyze("nature/dragonfly_012.jpg"),
            analyze("nature/dragonfly_013.jpg"),
        ];
        let proposals =
            collect_proposals(&analyses, &Registry::builtin(), &AnalyzerParams::default());

        assert_eq!(proposals.len(), 1);
        let proposal = &proposals[0];
        assert_eq!(proposal.subject_id, "dragonfly");
        assert_eq!(proposal.proposed_collection, "nature_dragonfly");
        assert_eq!(proposal.member_files.len(), 3);
        assert!(proposal.aggregate_confidence > 0.0);
    }

    #[test]
    fn test_proposals_are_order_independent() {
        let forward = vec![
            analyze("nature/dragonfly_011.jpg"),
            analyze("nature/dragonfly_012.jpg"),
            analyze("nature/dragonfly_013.jpg"),
            analyze("unsorted/bass_eagle_display.jpg"),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let registry = Registry::builtin();
        let params = AnalyzerParams::default();
        let a = collect_proposals(&forward, &registry, &params);
        let b = collect_proposals(&reversed, &registry, &params);

        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.subject_id, y.subject_id);
            assert_eq!(x.member_files, y.member_files);
            assert_eq!(x.cover_file, y.cover_file);
            assert!((x.aggregate_confidence - y.aggregate_confidence).abs() < 1e-6);
        }
    }

    #[test]
    fn test_split_votes_count_toward_each_candidate() {
        // Each split file is evidence for both subjects at once
        let analyses = vec![
            analyze("unsorted/bass_eagle_01.jpg"),
            analyze("unsorted/bass_eagle_02.jpg"),
            analyze("unsorted/bass_eagle_03.jpg"),
        ];
        assert!(analyses
            .iter()
            .all(|a| a.recommendation.action == Action::Split));

        let proposals =
            collect_proposals(&analyses, &Registry::builtin(), &AnalyzerParams::default());
        let subjects: Vec<&str> = proposals.iter().map(|p| p.subject_id.as_str()).collect();
        assert_eq!(subjects, vec!["bass", "eagle"]);
        assert_eq!(proposals[0].member_files.len(), 3);
    }

    #[test]
    fn test_cover_file_is_best_weighted_candidate() {
        let analyses = vec![
            analyze("nature/dragonfly_raw_011.jpg"),
            analyze("nature/dragonfly_012.jpg"),
            analyze("nature/dragonfly_showcase_013.jpg"),
        ];
        let proposals =
            collect_proposals(&analyses, &Registry::builtin(), &AnalyzerParams::default());
        assert_eq!(proposals.len(), 1);
        assert!(proposals[0]
            .cover_file
            .to_string_lossy()
            .contains("showcase"));
    }

    #[test]
    fn test_stats_stage_distribution_and_fractions() {
        let analyses = vec![
            analyze("projects/bass/final/IMG_9001.JPG"),
            analyze("projects/bass/rough/IMG_9002.JPG"),
            analyze("projects/bass/IMG_9003.JPG"),
        ];
        let stats = collect_stats(&analyses, &AnalyzerParams::default());

        assert_eq!(stats.len(), 1);
        let s = &stats[0];
        assert_eq!(s.collection, "bass");
        assert_eq!(s.file_count, 3);
        assert_eq!(s.stage_distribution.get("final_complete"), Some(&1));
        assert_eq!(s.stage_distribution.get("roughing"), Some(&1));
        assert_eq!(s.stage_distribution.get("unclassified"), Some(&1));
        // Every filename embeds a camera ordinal
        assert!((s.sequence_fraction - 1.0).abs() < 1e-6);
        assert!(s.mean_cover_score >= 0.0 && s.mean_cover_score <= 1.0);
    }

    #[test]
    fn test_stats_group_by_origin_collection() {
        let analyses = vec![
            analyze("projects/bass/IMG_9001.JPG"),
            analyze("projects/owl/IMG_9002.JPG"),
        ];
        let stats = collect_stats(&analyses, &AnalyzerParams::default());
        let collections: Vec<&str> = stats.iter().map(|s| s.collection.as_str()).collect();
        assert_eq!(collections, vec!["bass", "owl"]);
    }
}
