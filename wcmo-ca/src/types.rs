//! Core data model for the collection analyzer
//!
//! Per-file inputs (FileRecord), derived signals (SignalSet, PlacementVerdict),
//! the per-file Recommendation, and the aggregate outputs (CollectionProposal,
//! CollectionStats, ReviewItem, BatchReport). Everything the analyzer emits is
//! serializable; downstream tools (mover, scaffolder, review UI) consume the
//! JSON artifacts and do their own rendering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Media kind, derived from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a lowercase file extension; `None` for non-media extensions
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "jpg" | "jpeg" | "png" | "gif" | "tif" | "tiff" | "bmp" | "webp" | "heic" => {
                Some(MediaKind::Image)
            }
            "mp4" | "mov" | "avi" | "mkv" | "webm" | "m4v" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

/// One file as seen by traversal; identity is the path, never mutated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub absolute_path: PathBuf,
    pub relative_path: PathBuf,
    pub filename: String,
    /// Collection the file currently lives in (catch-all bucket if none)
    pub current_collection: String,
    pub kind: MediaKind,
}

/// One subject identity hypothesis with its supporting evidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectCandidate {
    pub subject_id: String,
    /// Accumulated confidence, clamped to [0, 1]
    pub confidence: f32,
    /// Human-readable evidence strings, one per scoring contribution
    pub evidence: Vec<String>,
}

/// Detected production stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSignal {
    pub stage_id: String,
    pub confidence: f32,
}

/// All heuristic signals extracted from one file's path and filename
///
/// Recomputed every run; `subject_candidates` is always sorted by
/// non-increasing confidence (ties broken by id). Multiple candidates are
/// intentional: ambiguity is carried forward, not collapsed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalSet {
    pub subject_candidates: Vec<SubjectCandidate>,
    pub stage: Option<StageSignal>,
    pub sequence_number: Option<u32>,
    /// Cover-image desirability, clamped to [0, 1]
    pub cover_score: f32,
}

impl SignalSet {
    /// Highest-confidence subject candidate, if any cleared the inclusion floor
    pub fn top_candidate(&self) -> Option<&SubjectCandidate> {
        self.subject_candidates.first()
    }
}

/// Comparison of extracted signals against the file's current folder placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementVerdict {
    pub current_collection: String,
    /// Path segment recognized as a stage folder, if any
    pub current_stage_folder: Option<String>,
    pub subject_matches_collection: bool,
    pub stage_matches_folder: bool,
    /// One human-readable string per detected mismatch
    pub issues: Vec<String>,
}

/// Recommended reorganization action for one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Keep,
    Move,
    Split,
    ProposeNewCollection,
    Review,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Keep => "keep",
            Action::Move => "move",
            Action::Split => "split",
            Action::ProposeNewCollection => "propose_new_collection",
            Action::Review => "review",
        }
    }
}

/// Recommendation priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// The single per-file output of the rule chain; exactly one per file per run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub path: PathBuf,
    pub action: Action,
    /// Target collection for move/propose actions
    pub target: Option<String>,
    pub reason: String,
    pub priority: Priority,
    pub confidence: f32,
}

/// Everything derived for one file, kept together for aggregation and review
#[derive(Debug, Clone, Serialize)]
pub struct FileAnalysis {
    pub record: FileRecord,
    pub signals: SignalSet,
    pub verdict: PlacementVerdict,
    pub recommendation: Recommendation,
}

/// A proposed new collection, materialized once enough files corroborate it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionProposal {
    pub subject_id: String,
    /// Folder name the scaffolding tool should create
    pub proposed_collection: String,
    /// Corroborating files, sorted by path
    pub member_files: Vec<PathBuf>,
    /// Representative image: argmax of cover_score x confidence
    pub cover_file: PathBuf,
    /// Mean of member confidences
    pub aggregate_confidence: f32,
}

/// Descriptive statistics for one origin collection (non-decision-bearing)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    pub collection: String,
    pub file_count: usize,
    /// Stage id (or "unclassified") -> file count
    pub stage_distribution: BTreeMap<String, usize>,
    /// Fraction of files with a recoverable sequence number
    pub sequence_fraction: f32,
    /// Fraction of files at or above the high-quality cover threshold
    pub high_quality_fraction: f32,
    pub mean_cover_score: f32,
}

/// Payload for the downstream manual-adjudication UI
///
/// Emitted for every ambiguous (`review`/`split`) file; the core does no
/// rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewItem {
    pub path: PathBuf,
    pub action: Action,
    pub subject_candidates: Vec<SubjectCandidate>,
    pub stage: Option<StageSignal>,
    pub issues: Vec<String>,
}

/// Complete output of one batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    pub root: PathBuf,
    pub registry_version: String,
    /// Media files discovered by the scanner
    pub files_seen: usize,
    /// Files that produced a Recommendation
    pub files_analyzed: usize,
    /// Unreadable or cancelled files; never silently dropped
    pub files_skipped: usize,
    pub elapsed_seconds: f64,
    /// Action name -> count
    pub action_counts: BTreeMap<String, usize>,
    pub recommendations: Vec<Recommendation>,
    pub proposals: Vec<CollectionProposal>,
    pub collection_stats: Vec<CollectionStats>,
    pub review_queue: Vec<ReviewItem>,
}
