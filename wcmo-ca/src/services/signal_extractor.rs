//! Signal extraction
//!
//! Turns one file's normalized path and filename tokens into a SignalSet:
//! subject identity candidates, production stage, sequence number and cover
//! desirability. All reasoning is over path/filename tokens; there is no
//! pixel-level analysis anywhere in the pipeline.

use crate::config::AnalyzerParams;
use crate::services::sequence_parser;
use crate::taxonomy::Registry;
use crate::types::{FileRecord, SignalSet, StageSignal, SubjectCandidate};

/// Confidence added per keyword/alias match in the filename
const FILENAME_MATCH_SCORE: f32 = 0.4;
/// Confidence added per keyword/alias match in a path segment
const SEGMENT_MATCH_SCORE: f32 = 0.3;
/// Bonus when a path segment equals the subject id exactly
const EXACT_SEGMENT_BONUS: f32 = 0.5;
/// Confidence of a stage derived from a recognized folder token
const STAGE_FOLDER_CONFIDENCE: f32 = 0.8;
/// Confidence added per stage keyword match in the filename (fallback only)
const STAGE_KEYWORD_SCORE: f32 = 0.3;
/// Cover score starting point before stage weighting and token bonuses
const COVER_BASELINE: f32 = 0.5;
/// Cover bonus/penalty per quality-signaling token
const COVER_TOKEN_DELTA: f32 = 0.15;

/// Tokens that make a file more attractive as a collection cover
const COVER_QUALITY_TOKENS: &[&str] = &["final", "showcase", "hero", "beauty", "display"];
/// Tokens that make a file less attractive as a collection cover
const COVER_DETRACTOR_TOKENS: &[&str] = &["rough", "test", "temp", "wip", "blur"];

/// Extract all heuristic signals for one file
pub fn extract(record: &FileRecord, registry: &Registry, params: &AnalyzerParams) -> SignalSet {
    let segments = path_segments(record);
    let filename_tokens = tokenize(&filename_stem(record));

    let subject_candidates = detect_subjects(&segments, &filename_tokens, registry, params);
    let stage = detect_stage(&segments, &filename_tokens, registry);
    let sequence_number = sequence_parser::parse_sequence(&filename_stem(record));
    let cover_score = compute_cover_score(stage.as_ref(), &segments, &filename_tokens, registry);

    tracing::trace!(
        path = %record.relative_path.display(),
        candidates = subject_candidates.len(),
        stage = stage.as_ref().map(|s| s.stage_id.as_str()),
        sequence = sequence_number,
        cover = cover_score,
        "Signals extracted"
    );

    SignalSet {
        subject_candidates,
        stage,
        sequence_number,
        cover_score,
    }
}

/// Directory segments of the relative path, case-folded, separators unified
pub(crate) fn path_segments(record: &FileRecord) -> Vec<String> {
    let normalized = record
        .relative_path
        .to_string_lossy()
        .replace('\\', "/")
        .to_lowercase();

    let mut segments: Vec<String> = normalized
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    // The last component is the filename, not a folder
    segments.pop();
    segments
}

/// Lowercased filename without its extension
pub(crate) fn filename_stem(record: &FileRecord) -> String {
    std::path::Path::new(&record.filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| record.filename.to_lowercase())
}

/// Split a normalized string into alphanumeric tokens
pub(crate) fn tokenize(s: &str) -> Vec<String> {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Accumulate subject confidence from filename tokens, path segments, and
/// exact-id folder placement
///
/// Candidates below the inclusion floor are dropped; the survivors are sorted
/// by non-increasing confidence (ties broken by id so the ordering is
/// reproducible). Several surviving candidates mean genuine ambiguity, which
/// downstream rules handle explicitly.
fn detect_subjects(
    segments: &[String],
    filename_tokens: &[String],
    registry: &Registry,
    params: &AnalyzerParams,
) -> Vec<SubjectCandidate> {
    let mut candidates = Vec::new();

    for subject in registry.subjects() {
        let mut confidence = 0.0f32;
        let mut evidence = Vec::new();

        for token in filename_tokens {
            if subject.matches_token(token) {
                confidence += FILENAME_MATCH_SCORE;
                evidence.push(format!("filename token \"{}\"", token));
            }
        }

        for segment in segments {
            if tokenize(segment).iter().any(|t| subject.matches_token(t)) {
                confidence += SEGMENT_MATCH_SCORE;
                evidence.push(format!("path segment \"{}\"", segment));
            }
        }

        if segments.iter().any(|s| *s == subject.id) {
            confidence += EXACT_SEGMENT_BONUS;
            evidence.push(format!("path segment equals id \"{}\"", subject.id));
        }

        let confidence = confidence.clamp(0.0, 1.0);
        if confidence > params.inclusion_floor {
            candidates.push(SubjectCandidate {
                subject_id: subject.id.clone(),
                confidence,
                evidence,
            });
        }
    }

    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.subject_id.cmp(&b.subject_id))
    });

    candidates
}

/// Detect the production stage
///
/// Folder evidence strictly dominates: stages are checked in production order
/// and the first stage with a folder token present in any path segment wins at
/// fixed confidence. Filename keywords are only consulted when no folder
/// token matched anywhere.
fn detect_stage(
    segments: &[String],
    filename_tokens: &[String],
    registry: &Registry,
) -> Option<StageSignal> {
    folder_stage(segments, registry).or_else(|| filename_stage(filename_tokens, registry))
}

/// Stage derived from folder placement, in fixed production-order priority
pub(crate) fn folder_stage(segments: &[String], registry: &Registry) -> Option<StageSignal> {
    for stage in registry.stages() {
        let folder_hit = segments
            .iter()
            .any(|seg| tokenize(seg).iter().any(|t| stage.matches_folder_token(t)));
        if folder_hit {
            return Some(StageSignal {
                stage_id: stage.id.clone(),
                confidence: STAGE_FOLDER_CONFIDENCE,
            });
        }
    }
    None
}

/// Stage claimed by filename keywords: keyword accumulation, highest score wins
pub(crate) fn filename_stage(
    filename_tokens: &[String],
    registry: &Registry,
) -> Option<StageSignal> {
    let mut best: Option<StageSignal> = None;
    for stage in registry.stages() {
        let hits = filename_tokens
            .iter()
            .filter(|t| stage.matches_keyword(t))
            .count();
        if hits == 0 {
            continue;
        }
        let confidence = (hits as f32 * STAGE_KEYWORD_SCORE).clamp(0.0, 1.0);
        let better = match &best {
            Some(current) => confidence > current.confidence,
            None => true,
        };
        if better {
            best = Some(StageSignal {
                stage_id: stage.id.clone(),
                confidence,
            });
        }
    }
    best
}

/// Compute cover-image desirability
///
/// Baseline scaled by the detected stage's cover weight, nudged by
/// quality-signaling tokens found anywhere in the path or filename, and
/// clamped to [0, 1].
fn compute_cover_score(
    stage: Option<&StageSignal>,
    segments: &[String],
    filename_tokens: &[String],
    registry: &Registry,
) -> f32 {
    let mut score = COVER_BASELINE;

    if let Some(signal) = stage {
        if let Some(entry) = registry.stage_by_id(&signal.stage_id) {
            score *= entry.cover_weight;
        }
    }

    let all_tokens: Vec<String> = segments
        .iter()
        .flat_map(|s| tokenize(s))
        .chain(filename_tokens.iter().cloned())
        .collect();

    for token in COVER_QUALITY_TOKENS {
        if all_tokens.iter().any(|t| t == token) {
            score += COVER_TOKEN_DELTA;
        }
    }
    for token in COVER_DETRACTOR_TOKENS {
        if all_tokens.iter().any(|t| t == token) {
            score -= COVER_TOKEN_DELTA;
        }
    }

    score.clamp(0.0, 1.0)
}
