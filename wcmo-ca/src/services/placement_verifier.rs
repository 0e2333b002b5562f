//! Placement verification
//!
//! Compares a file's extracted signals against where the file currently
//! lives. Collection and stage folders are resolved from fixed known
//! folder-name sets; each mismatch produces a human-readable issue string
//! for downstream review.

use crate::config::AnalyzerParams;
use crate::services::signal_extractor::{filename_stage, filename_stem, path_segments, tokenize};
use crate::taxonomy::Registry;
use crate::types::{FileRecord, PlacementVerdict, SignalSet};

/// Namespace folders that group collections without being collections
const CONTAINER_FOLDERS: &[&str] = &["projects", "collections", "gallery", "library", "media"];

/// Resolve the collection a path belongs to
///
/// Skips container folders, then takes the first segment that is not a
/// recognized stage folder. Files directly under the root (or under nothing
/// but stage folders) land in the catch-all bucket.
pub fn resolve_collection(
    segments: &[String],
    registry: &Registry,
    params: &AnalyzerParams,
) -> String {
    for segment in segments {
        if CONTAINER_FOLDERS.contains(&segment.as_str()) {
            continue;
        }
        if is_stage_folder(segment, registry) {
            continue;
        }
        return segment.clone();
    }
    params.catch_all_collection.clone()
}

/// Whether a path segment names a production-stage folder
fn is_stage_folder(segment: &str, registry: &Registry) -> bool {
    tokenize(segment)
        .iter()
        .any(|t| registry.stages().iter().any(|s| s.matches_folder_token(t)))
}

/// Find the first stage folder in the path, scanning stages in production order
fn current_stage_folder(segments: &[String], registry: &Registry) -> Option<(String, String)> {
    for stage in registry.stages() {
        for segment in segments {
            if tokenize(segment).iter().any(|t| stage.matches_folder_token(t)) {
                return Some((segment.clone(), stage.id.clone()));
            }
        }
    }
    None
}

/// Verify a file's current placement against its extracted signals
///
/// The subject check compares the top candidate against the current
/// collection name; a generic placeholder match never satisfies it while a
/// more specific subject is also detected in the same file. The stage check
/// compares the stage the filename claims against the category
/// (finished / in-progress) of the stage folder the file sits in — folder
/// evidence already dominates the detected stage itself, so the filename
/// claim is what can disagree with the placement.
pub fn verify(record: &FileRecord, signals: &SignalSet, registry: &Registry) -> PlacementVerdict {
    let segments = path_segments(record);
    let current_collection = record.current_collection.clone();
    let stage_folder = current_stage_folder(&segments, registry);

    let mut issues = Vec::new();

    let subject_matches_collection = match signals.top_candidate() {
        None => false,
        Some(top) => {
            let subject = registry.subject_by_id(&top.subject_id);
            let named_match = subject
                .map(|s| current_collection == s.id || current_collection == s.collection_name())
                .unwrap_or(false);

            let shadowed = subject.map(|s| s.generic).unwrap_or(false)
                && signals.subject_candidates.iter().any(|c| {
                    registry
                        .subject_by_id(&c.subject_id)
                        .map(|s| !s.generic)
                        .unwrap_or(false)
                });

            if named_match && shadowed {
                let specific = signals
                    .subject_candidates
                    .iter()
                    .find(|c| {
                        registry
                            .subject_by_id(&c.subject_id)
                            .map(|s| !s.generic)
                            .unwrap_or(false)
                    })
                    .map(|c| c.subject_id.clone())
                    .unwrap_or_default();
                issues.push(format!(
                    "generic subject \"{}\" is shadowed by more specific \"{}\"",
                    top.subject_id, specific
                ));
            } else if !named_match {
                issues.push(format!(
                    "top subject \"{}\" does not match collection \"{}\"",
                    top.subject_id, current_collection
                ));
            }

            named_match && !shadowed
        }
    };

    let filename_tokens = tokenize(&filename_stem(record));
    let claimed_stage = filename_stage(&filename_tokens, registry);

    let stage_matches_folder = match (&claimed_stage, &stage_folder) {
        (Some(claimed), Some((folder_segment, folder_stage_id))) => {
            let claimed_finished = registry
                .stage_by_id(&claimed.stage_id)
                .map(|s| s.finished)
                .unwrap_or(false);
            let folder_finished = registry
                .stage_by_id(folder_stage_id)
                .map(|s| s.finished)
                .unwrap_or(false);
            let matches = claimed_finished == folder_finished;
            if !matches {
                issues.push(format!(
                    "filename suggests stage \"{}\" but file sits in stage folder \"{}\"",
                    claimed.stage_id, folder_segment
                ));
            }
            matches
        }
        // Nothing to compare on one side or the other
        _ => true,
    };

    PlacementVerdict {
        current_collection,
        current_stage_folder: stage_folder.map(|(segment, _)| segment),
        subject_matches_collection,
        stage_matches_folder,
        issues,
    }
}
