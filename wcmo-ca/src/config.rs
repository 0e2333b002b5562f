//! Analyzer parameters
//!
//! All decision thresholds are named, tunable values carried in one struct.
//! The historical analyzer variants (strict vs. loose matching) are expressed
//! as configuration profiles over the same code path rather than separate
//! implementations.

use serde::{Deserialize, Serialize};
use wcmo_common::{Error, Result};

/// Named thresholds and knobs for one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerParams {
    /// Minimum confidence for a subject candidate to be considered at all
    pub inclusion_floor: f32,
    /// Confidence at or above which a subject mismatch forces a move
    pub high_confidence: f32,
    /// Corroborating files required before a CollectionProposal materializes
    pub min_member_count: usize,
    /// Cover score at or above which a file counts as high-quality
    pub cover_quality_threshold: f32,
    /// Name of the undifferentiated catch-all bucket
    pub catch_all_collection: String,
    /// Directory recursion depth limit (symlink-cycle guard)
    pub max_depth: usize,
}

impl Default for AnalyzerParams {
    fn default() -> Self {
        Self {
            inclusion_floor: 0.2,
            high_confidence: 0.7,
            min_member_count: 3,
            cover_quality_threshold: 0.75,
            catch_all_collection: "unsorted".to_string(),
            max_depth: 16,
        }
    }
}

impl AnalyzerParams {
    /// Stricter variant: fewer candidates survive, moves need more evidence
    pub fn strict() -> Self {
        Self {
            inclusion_floor: 0.3,
            high_confidence: 0.8,
            ..Self::default()
        }
    }

    /// Looser variant: weak evidence is carried forward for manual review
    pub fn lenient() -> Self {
        Self {
            inclusion_floor: 0.1,
            high_confidence: 0.6,
            ..Self::default()
        }
    }

    /// Resolve a named profile
    pub fn for_profile(name: &str) -> Result<Self> {
        match name {
            "default" => Ok(Self::default()),
            "strict" => Ok(Self::strict()),
            "lenient" => Ok(Self::lenient()),
            other => Err(Error::InvalidInput(format!(
                "Unknown analysis profile \"{}\" (expected default, strict or lenient)",
                other
            ))),
        }
    }

    /// Validate parameter ranges; fatal at startup when out of range
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.inclusion_floor) {
            return Err(Error::Config(format!(
                "inclusion_floor {} outside [0, 1]",
                self.inclusion_floor
            )));
        }
        if !(0.0..=1.0).contains(&self.high_confidence) {
            return Err(Error::Config(format!(
                "high_confidence {} outside [0, 1]",
                self.high_confidence
            )));
        }
        if !(0.0..=1.0).contains(&self.cover_quality_threshold) {
            return Err(Error::Config(format!(
                "cover_quality_threshold {} outside [0, 1]",
                self.cover_quality_threshold
            )));
        }
        if self.min_member_count == 0 {
            return Err(Error::Config("min_member_count must be at least 1".into()));
        }
        if self.max_depth == 0 {
            return Err(Error::Config("max_depth must be at least 1".into()));
        }
        if self.catch_all_collection.trim().is_empty() {
            return Err(Error::Config("catch_all_collection must not be empty".into()));
        }
        Ok(())
    }
}
