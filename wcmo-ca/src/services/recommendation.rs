//! Recommendation synthesis
//!
//! A priority-ordered rule chain turning one file's signals and placement
//! verdict into exactly one Recommendation. First match wins. Identity-level
//! problems always outrank stage-level problems: files must be filed under
//! the right subject before stage folders mean anything.

use crate::config::AnalyzerParams;
use crate::taxonomy::Registry;
use crate::types::{
    Action, FileRecord, PlacementVerdict, Priority, Recommendation, SignalSet,
};

/// Synthesize the single Recommendation for one file
pub fn synthesize(
    record: &FileRecord,
    signals: &SignalSet,
    verdict: &PlacementVerdict,
    registry: &Registry,
    params: &AnalyzerParams,
) -> Recommendation {
    let confidence = signals
        .top_candidate()
        .map(|c| c.confidence)
        .unwrap_or(0.0);

    let build = |action: Action, target: Option<String>, reason: String, priority: Priority| {
        Recommendation {
            path: record.relative_path.clone(),
            action,
            target,
            reason,
            priority,
            confidence,
        }
    };

    let top_subject = signals
        .top_candidate()
        .and_then(|c| registry.subject_by_id(&c.subject_id));

    // Rule 1: subject always gets its own collection
    if let Some(subject) = top_subject {
        if subject.requires_own_collection
            && verdict.current_collection != subject.collection_name()
            && verdict.current_collection != subject.id
        {
            return build(
                Action::ProposeNewCollection,
                Some(subject.collection_name()),
                format!("subject \"{}\" always gets its own collection", subject.id),
                Priority::High,
            );
        }
    }

    // Rule 2: several subjects cleared the inclusion floor; carry the
    // ambiguity forward as simultaneous evidence for multiple collections
    if signals.subject_candidates.len() >= 2 {
        let ids: Vec<&str> = signals
            .subject_candidates
            .iter()
            .map(|c| c.subject_id.as_str())
            .collect();
        return build(
            Action::Split,
            None,
            format!("file matches multiple subjects: {}", ids.join(", ")),
            Priority::High,
        );
    }

    // Rule 3: nature-reference subject not yet housed in its nature collection
    if let Some(subject) = top_subject {
        if subject.nature_eligible
            && verdict.current_collection != subject.collection_name()
            && verdict.current_collection != subject.id
        {
            return build(
                Action::Move,
                Some(subject.collection_name()),
                format!(
                    "nature subject \"{}\" belongs in \"{}\"",
                    subject.id,
                    subject.collection_name()
                ),
                Priority::Medium,
            );
        }
    }

    // Rule 4: confident subject mismatch forces a move
    if let Some(subject) = top_subject {
        if !verdict.subject_matches_collection && confidence >= params.high_confidence {
            return build(
                Action::Move,
                Some(subject.collection_name()),
                format!(
                    "high-confidence subject \"{}\" filed under \"{}\"",
                    subject.id, verdict.current_collection
                ),
                Priority::High,
            );
        }
    }

    // Rule 5: stage conflicts with the folder the file sits in
    if !verdict.stage_matches_folder {
        let reason = verdict
            .issues
            .iter()
            .find(|i| i.contains("stage"))
            .cloned()
            .unwrap_or_else(|| "stage conflicts with current folder".to_string());
        return build(Action::Review, None, reason, Priority::Medium);
    }

    // Rule 6: no subject evidence at all, outside the catch-all bucket
    if signals.subject_candidates.is_empty()
        && verdict.current_collection != params.catch_all_collection
    {
        return build(
            Action::Review,
            None,
            format!(
                "no subject evidence for file in \"{}\"",
                verdict.current_collection
            ),
            Priority::Low,
        );
    }

    // Rule 7: placement is consistent with everything we detected
    build(
        Action::Keep,
        None,
        "placement consistent with detected signals".to_string(),
        Priority::Low,
    )
}
