//! Media file scanner
//!
//! Recursive discovery of image/video files with format verification.
//! Two-phase: sequential traversal with symlink-loop detection, then parallel
//! magic-byte verification. Unreadable entries are counted as skipped, never
//! fatal to the batch.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::types::MediaKind;

/// Media file scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Cannot access file
    #[error("File access error {0}: {1}")]
    FileAccessError(PathBuf, String),
}

impl From<ScanError> for wcmo_common::Error {
    fn from(e: ScanError) -> Self {
        match e {
            ScanError::PathNotFound(p) => {
                wcmo_common::Error::NotFound(format!("scan root {}", p.display()))
            }
            ScanError::NotADirectory(p) => {
                wcmo_common::Error::InvalidInput(format!("{} is not a directory", p.display()))
            }
            ScanError::FileAccessError(p, msg) => {
                wcmo_common::Error::Internal(format!("{}: {}", p.display(), msg))
            }
        }
    }
}

/// Scan result with skip accounting
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Verified media file paths, sorted for deterministic downstream order
    pub files: Vec<PathBuf>,
    /// Entries that could not be read or verified
    pub skipped: usize,
    /// One message per skipped entry
    pub errors: Vec<String>,
}

/// Media file scanner
pub struct FileScanner {
    ignore_patterns: Vec<String>,
    max_depth: usize,
}

impl FileScanner {
    /// Create a scanner with default ignore patterns and the given depth limit
    ///
    /// Ignores system files like .DS_Store, Thumbs.db, .git, etc.
    pub fn new(max_depth: usize) -> Self {
        Self {
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                ".git".to_string(),
                ".svn".to_string(),
            ],
            max_depth,
        }
    }

    /// Scan a directory subtree for media files
    ///
    /// Phase 1 walks the tree sequentially (symlink_visited is mutable state),
    /// phase 2 verifies candidates in parallel since each thread reads a
    /// different file.
    pub fn scan(&self, root_path: &Path) -> Result<ScanOutcome, ScanError> {
        if !root_path.exists() {
            return Err(ScanError::PathNotFound(root_path.to_path_buf()));
        }
        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory(root_path.to_path_buf()));
        }

        let mut candidates = Vec::new();
        let mut skipped = 0usize;
        let mut errors = Vec::new();
        let mut symlink_visited = HashSet::new();

        let walker = WalkDir::new(root_path)
            .follow_links(false)
            .max_depth(self.max_depth)
            .into_iter()
            .filter_entry(|e| self.should_process_entry(e, &mut symlink_visited));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && has_media_extension(entry.path()) {
                        candidates.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                    skipped += 1;
                    errors.push(e.to_string());
                }
            }
        }

        tracing::debug!(
            "Phase 1 complete: {} candidate files discovered",
            candidates.len()
        );

        // Phase 2: parallel magic-byte verification
        let verified: Vec<Result<PathBuf, String>> = candidates
            .par_iter()
            .filter_map(|path| match self.verify_magic_bytes(path) {
                Ok(true) => Some(Ok(path.clone())),
                Ok(false) => None,
                Err(e) => Some(Err(format!("{}: {}", path.display(), e))),
            })
            .collect();

        let mut files = Vec::new();
        for item in verified {
            match item {
                Ok(path) => files.push(path),
                Err(msg) => {
                    tracing::warn!("Skipping unreadable file: {}", msg);
                    skipped += 1;
                    errors.push(msg);
                }
            }
        }

        files.sort();

        tracing::debug!(
            "Phase 2 complete: {} media files verified, {} skipped",
            files.len(),
            skipped
        );

        Ok(ScanOutcome {
            files,
            skipped,
            errors,
        })
    }

    /// Check if entry should be processed
    fn should_process_entry(
        &self,
        entry: &DirEntry,
        symlink_visited: &mut HashSet<PathBuf>,
    ) -> bool {
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy();

        for pattern in &self.ignore_patterns {
            if file_name.contains(pattern) {
                return false;
            }
        }

        // Detect symlink loops
        if entry.file_type().is_symlink() {
            if let Ok(canonical) = path.canonicalize() {
                if !symlink_visited.insert(canonical) {
                    tracing::warn!("Symlink loop detected: {}", path.display());
                    return false;
                }
            }
        }

        true
    }

    /// Verify file content matches a known media container
    fn verify_magic_bytes(&self, path: &Path) -> Result<bool, ScanError> {
        let mut file = File::open(path)
            .map_err(|e| ScanError::FileAccessError(path.to_path_buf(), e.to_string()))?;

        let mut buffer = [0u8; 12];
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| ScanError::FileAccessError(path.to_path_buf(), e.to_string()))?;

        if bytes_read < 4 {
            return Ok(false); // Too small to be media
        }

        let is_media = match &buffer[..bytes_read.min(12)] {
            // JPEG
            [0xFF, 0xD8, 0xFF, ..] => true,

            // PNG
            [0x89, b'P', b'N', b'G', ..] => true,

            // GIF
            [b'G', b'I', b'F', b'8', ..] => true,

            // TIFF (little/big endian)
            [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => true,

            // WebP
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P'] => true,

            // MP4/MOV/HEIC (ISO base media container)
            [_, _, _, _, b'f', b't', b'y', b'p', ..] => true,

            // AVI
            [b'R', b'I', b'F', b'F', _, _, _, _, b'A', b'V', b'I', b' '] => true,

            // Matroska/WebM
            [0x1A, 0x45, 0xDF, 0xA3, ..] => true,

            _ => false,
        };

        Ok(is_media)
    }
}

/// Check extension against the known media extension sets (fast pre-filter)
fn has_media_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| MediaKind::from_extension(&ext.to_string_lossy().to_lowercase()).is_some())
        .unwrap_or(false)
}
