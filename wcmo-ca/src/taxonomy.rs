//! Taxonomy registry
//!
//! Canonical, versioned vocabulary of carving subjects and production stages.
//! Loaded once at startup from TOML configuration (or the built-in default
//! vocabulary) and immutable afterwards. Malformed entries are fatal at load
//! time since every downstream decision depends on the registry.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use wcmo_common::{Error, Result};

/// A subject entry: the identity of a carved (or photographed) object
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectEntry {
    /// Canonical subject id, also the name of the subject's own collection folder
    pub id: String,
    /// Tokens that identify this subject in filenames and folder names
    pub keywords: Vec<String>,
    /// Alternate spellings and common names
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Whether many instances of this subject are expected inside one collection
    /// (expected diversity rather than misplacement evidence)
    #[serde(default)]
    pub multiplicity_allowed: bool,
    /// Subject always gets a collection of its own
    #[serde(default)]
    pub requires_own_collection: bool,
    /// Nature-reference subject, housed under a `nature_<id>` collection
    #[serde(default)]
    pub nature_eligible: bool,
    /// Placeholder entry (e.g. "fish") that more specific subjects shadow
    #[serde(default)]
    pub generic: bool,
}

impl SubjectEntry {
    /// Name of the collection this subject should be housed in
    pub fn collection_name(&self) -> String {
        if self.nature_eligible {
            format!("nature_{}", self.id)
        } else {
            self.id.clone()
        }
    }

    /// Check whether a normalized token names this subject
    pub fn matches_token(&self, token: &str) -> bool {
        token == self.id
            || self.keywords.iter().any(|k| k == token)
            || self.aliases.iter().any(|a| a == token)
    }
}

/// A production stage entry, from raw material through finished piece
#[derive(Debug, Clone, Deserialize)]
pub struct StageEntry {
    /// Canonical stage id
    pub id: String,
    /// Folder-name tokens mapped to this stage
    pub folder_tokens: Vec<String>,
    /// Filename keywords used as fallback evidence when no folder token matches
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Multiplier applied to a file's cover desirability score
    pub cover_weight: f32,
    /// Whether this stage depicts a finished piece (vs. work in progress)
    #[serde(default)]
    pub finished: bool,
}

impl StageEntry {
    /// Check whether a normalized token names this stage's folder
    pub fn matches_folder_token(&self, token: &str) -> bool {
        self.folder_tokens.iter().any(|t| t == token)
    }

    /// Check whether a normalized token is a fallback keyword for this stage
    pub fn matches_keyword(&self, token: &str) -> bool {
        self.keywords.iter().any(|k| k == token)
    }
}

/// TOML document shape for a registry file
#[derive(Debug, Deserialize)]
struct RegistryDoc {
    version: String,
    #[serde(default)]
    subjects: Vec<SubjectEntry>,
    #[serde(default)]
    stages: Vec<StageEntry>,
}

/// The taxonomy registry: closed, versioned vocabulary of subjects and stages
///
/// Stages are held in fixed production order (raw material first, finished
/// piece last); that order doubles as the folder-token match priority.
#[derive(Debug, Clone)]
pub struct Registry {
    version: String,
    subjects: Vec<SubjectEntry>,
    stages: Vec<StageEntry>,
}

impl Registry {
    /// Registry version string
    pub fn version(&self) -> &str {
        &self.version
    }

    /// All subject entries
    pub fn subjects(&self) -> &[SubjectEntry] {
        &self.subjects
    }

    /// All stage entries, in production order
    pub fn stages(&self) -> &[StageEntry] {
        &self.stages
    }

    /// Look up the subject named by a normalized token (id, keyword or alias)
    pub fn lookup_subject(&self, token: &str) -> Option<&SubjectEntry> {
        self.subjects.iter().find(|s| s.matches_token(token))
    }

    /// Look up the stage whose folder tokens or keywords include a normalized token
    pub fn lookup_stage(&self, token: &str) -> Option<&StageEntry> {
        self.stages
            .iter()
            .find(|s| s.matches_folder_token(token) || s.matches_keyword(token))
    }

    /// Subject entry by canonical id
    pub fn subject_by_id(&self, id: &str) -> Option<&SubjectEntry> {
        self.subjects.iter().find(|s| s.id == id)
    }

    /// Stage entry by canonical id
    pub fn stage_by_id(&self, id: &str) -> Option<&StageEntry> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// Parse a registry from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let doc: RegistryDoc = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse taxonomy failed: {}", e)))?;

        let registry = Self {
            version: doc.version,
            subjects: doc.subjects,
            stages: doc.stages,
        }
        .normalized();

        registry.validate()?;
        Ok(registry)
    }

    /// Load a registry from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        let registry = Self::from_toml_str(&content)?;
        tracing::info!(
            version = %registry.version,
            subjects = registry.subjects.len(),
            stages = registry.stages.len(),
            "Taxonomy registry loaded from {}",
            path.display()
        );
        Ok(registry)
    }

    /// Lowercase all vocabulary so matching is done over normalized tokens
    fn normalized(mut self) -> Self {
        for subject in &mut self.subjects {
            subject.id = subject.id.to_lowercase();
            for k in &mut subject.keywords {
                *k = k.to_lowercase();
            }
            for a in &mut subject.aliases {
                *a = a.to_lowercase();
            }
        }
        for stage in &mut self.stages {
            stage.id = stage.id.to_lowercase();
            for t in &mut stage.folder_tokens {
                *t = t.to_lowercase();
            }
            for k in &mut stage.keywords {
                *k = k.to_lowercase();
            }
        }
        self
    }

    /// Validate registry entries; any malformed entry is fatal at startup
    fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(Error::Config("Taxonomy version must not be empty".into()));
        }
        if self.subjects.is_empty() {
            return Err(Error::Config("Taxonomy defines no subjects".into()));
        }
        if self.stages.is_empty() {
            return Err(Error::Config("Taxonomy defines no stages".into()));
        }

        let mut seen = HashSet::new();
        for subject in &self.subjects {
            if subject.id.trim().is_empty() {
                return Err(Error::Config("Subject with empty id".into()));
            }
            if !seen.insert(subject.id.clone()) {
                return Err(Error::Config(format!(
                    "Duplicate taxonomy id: {}",
                    subject.id
                )));
            }
            if subject.keywords.iter().all(|k| k.trim().is_empty()) || subject.keywords.is_empty() {
                return Err(Error::Config(format!(
                    "Subject \"{}\" has an empty keyword set",
                    subject.id
                )));
            }
        }
        for stage in &self.stages {
            if stage.id.trim().is_empty() {
                return Err(Error::Config("Stage with empty id".into()));
            }
            if !seen.insert(stage.id.clone()) {
                return Err(Error::Config(format!("Duplicate taxonomy id: {}", stage.id)));
            }
            if stage.folder_tokens.iter().all(|t| t.trim().is_empty())
                || stage.folder_tokens.is_empty()
            {
                return Err(Error::Config(format!(
                    "Stage \"{}\" has an empty folder token set",
                    stage.id
                )));
            }
            if !(stage.cover_weight > 0.0 && stage.cover_weight <= 2.0) {
                return Err(Error::Config(format!(
                    "Stage \"{}\" cover weight {} outside (0, 2]",
                    stage.id, stage.cover_weight
                )));
            }
        }

        Ok(())
    }

    /// Built-in default vocabulary
    ///
    /// Used when no taxonomy file is supplied. Carving subjects are housed
    /// under a collection named after the subject; nature-reference subjects
    /// under `nature_<id>`.
    pub fn builtin() -> Self {
        let registry = Self {
            version: "builtin-2026.1".to_string(),
            subjects: vec![
                subject("bass", &["bass"], &["largemouth", "smallmouth"])
                    .multiplicity(),
                subject("trout", &["trout"], &["rainbow", "brook"]).multiplicity(),
                subject("fish", &["fish"], &[]).multiplicity().generic(),
                subject("eagle", &["eagle"], &["baldeagle"]),
                subject("owl", &["owl"], &["barnowl"]),
                subject("bird", &["bird"], &[]).generic(),
                subject("bear", &["bear"], &["grizzly"]),
                subject("santa", &["santa"], &["claus"]).own_collection(),
                subject("butterfly", &["butterfly"], &["monarch"])
                    .multiplicity()
                    .nature(),
                subject("dragonfly", &["dragonfly"], &[])
                    .multiplicity()
                    .nature()
                    .own_collection(),
                subject("hummingbird", &["hummingbird"], &["hummer"])
                    .multiplicity()
                    .nature(),
            ],
            stages: vec![
                stage("raw_material", &["raw", "blank", "blanks", "wood"], &["raw", "blank"], 0.4, false),
                stage("roughing", &["rough", "roughing", "roughed"], &["rough", "roughout"], 0.6, false),
                stage("detail_work", &["detail", "details", "process", "progress", "wip"], &["detail", "process", "wip"], 0.8, false),
                stage("finishing", &["finish", "finishing", "sanding", "paint", "painted"], &["finish", "sanded", "paint"], 1.1, true),
                stage("final_complete", &["final", "complete", "done", "finished", "showcase"], &["final", "complete", "done"], 1.3, true),
            ],
        };

        // The built-in vocabulary is compile-time data; a validation failure
        // here is a programming error, not a runtime condition.
        debug_assert!(registry.validate().is_ok());
        registry
    }
}

fn subject(id: &str, keywords: &[&str], aliases: &[&str]) -> SubjectEntry {
    SubjectEntry {
        id: id.to_string(),
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        aliases: aliases.iter().map(|s| s.to_string()).collect(),
        multiplicity_allowed: false,
        requires_own_collection: false,
        nature_eligible: false,
        generic: false,
    }
}

fn stage(id: &str, folder_tokens: &[&str], keywords: &[&str], cover_weight: f32, finished: bool) -> StageEntry {
    StageEntry {
        id: id.to_string(),
        folder_tokens: folder_tokens.iter().map(|s| s.to_string()).collect(),
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        cover_weight,
        finished,
    }
}

impl SubjectEntry {
    fn multiplicity(mut self) -> Self {
        self.multiplicity_allowed = true;
        self
    }

    fn own_collection(mut self) -> Self {
        self.requires_own_collection = true;
        self
    }

    fn nature(mut self) -> Self {
        self.nature_eligible = true;
        self
    }

    fn generic(mut self) -> Self {
        self.generic = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_is_valid() {
        let registry = Registry::builtin();
        assert!(registry.validate().is_ok());
        assert!(!registry.subjects().is_empty());
        assert_eq!(registry.stages().len(), 5);
    }

    #[test]
    fn test_lookup_subject_by_keyword_and_alias() {
        let registry = Registry::builtin();
        assert_eq!(registry.lookup_subject("bass").unwrap().id, "bass");
        assert_eq!(registry.lookup_subject("largemouth").unwrap().id, "bass");
        assert!(registry.lookup_subject("kazoo").is_none());
    }

    #[test]
    fn test_lookup_stage_by_folder_token() {
        let registry = Registry::builtin();
        assert_eq!(registry.lookup_stage("final").unwrap().id, "final_complete");
        assert_eq!(registry.lookup_stage("rough").unwrap().id, "roughing");
        assert!(registry.lookup_stage("attic").is_none());
    }

    #[test]
    fn test_stages_in_production_order() {
        let registry = Registry::builtin();
        let ids: Vec<&str> = registry.stages().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["raw_material", "roughing", "detail_work", "finishing", "final_complete"]
        );
    }

    #[test]
    fn test_nature_collection_name() {
        let registry = Registry::builtin();
        let butterfly = registry.subject_by_id("butterfly").unwrap();
        assert_eq!(butterfly.collection_name(), "nature_butterfly");
        let bass = registry.subject_by_id("bass").unwrap();
        assert_eq!(bass.collection_name(), "bass");
    }

    #[test]
    fn test_from_toml() {
        let content = r#"
            version = "test-1"

            [[subjects]]
            id = "Heron"
            keywords = ["heron"]
            aliases = ["blueheron"]
            nature_eligible = true

            [[stages]]
            id = "roughing"
            folder_tokens = ["rough"]
            keywords = ["rough"]
            cover_weight = 0.6
        "#;
        let registry = Registry::from_toml_str(content).unwrap();
        assert_eq!(registry.version(), "test-1");
        // Vocabulary is normalized to lowercase
        assert_eq!(registry.lookup_subject("heron").unwrap().id, "heron");
        assert_eq!(registry.lookup_subject("blueheron").unwrap().id, "heron");
    }

    #[test]
    fn test_empty_keyword_set_is_fatal() {
        let content = r#"
            version = "test-1"

            [[subjects]]
            id = "heron"
            keywords = []

            [[stages]]
            id = "roughing"
            folder_tokens = ["rough"]
            cover_weight = 0.6
        "#;
        let err = Registry::from_toml_str(content).unwrap_err();
        assert!(err.to_string().contains("empty keyword set"));
    }

    #[test]
    fn test_duplicate_id_is_fatal() {
        let content = r#"
            version = "test-1"

            [[subjects]]
            id = "heron"
            keywords = ["heron"]

            [[subjects]]
            id = "heron"
            keywords = ["heron2"]

            [[stages]]
            id = "roughing"
            folder_tokens = ["rough"]
            cover_weight = 0.6
        "#;
        let err = Registry::from_toml_str(content).unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_bad_cover_weight_is_fatal() {
        let content = r#"
            version = "test-1"

            [[subjects]]
            id = "heron"
            keywords = ["heron"]

            [[stages]]
            id = "roughing"
            folder_tokens = ["rough"]
            cover_weight = 0.0
        "#;
        assert!(Registry::from_toml_str(content).is_err());
    }
}
