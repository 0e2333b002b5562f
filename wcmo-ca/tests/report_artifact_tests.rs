//! Artifact output tests: every JSON file a downstream tool consumes

use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use wcmo_ca::config::AnalyzerParams;
use wcmo_ca::services::batch;
use wcmo_ca::taxonomy::Registry;
use wcmo_ca::types::{CollectionProposal, CollectionStats, Recommendation, ReviewItem};

const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

fn write_media(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, JPEG_HEADER).unwrap();
}

#[test]
fn test_artifacts_written_and_parseable() {
    let library = tempfile::tempdir().unwrap();
    write_media(library.path(), "projects/bass/final/IMG_9001.JPG");
    write_media(library.path(), "unsorted/bass_eagle_display.jpg");
    write_media(library.path(), "nature/dragonfly_011.jpg");
    write_media(library.path(), "nature/dragonfly_012.jpg");
    write_media(library.path(), "nature/dragonfly_013.jpg");

    let registry = Registry::builtin();
    let params = AnalyzerParams::default();
    let cancel = AtomicBool::new(false);
    let report = batch::run(library.path(), &registry, &params, &cancel).unwrap();

    let out = tempfile::tempdir().unwrap();
    wcmo_ca::report::write_artifacts(&report, out.path()).unwrap();

    // The mover consumes per-file recommendations
    let recs: Vec<Recommendation> = serde_json::from_str(
        &fs::read_to_string(out.path().join("recommendations.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(recs.len(), report.files_analyzed);

    // The scaffolder consumes collection proposals
    let proposals: Vec<CollectionProposal> =
        serde_json::from_str(&fs::read_to_string(out.path().join("proposals.json")).unwrap())
            .unwrap();
    assert_eq!(proposals.len(), 1);
    assert_eq!(proposals[0].proposed_collection, "nature_dragonfly");

    // Reporting consumes per-collection statistics
    let stats: Vec<CollectionStats> = serde_json::from_str(
        &fs::read_to_string(out.path().join("collection_stats.json")).unwrap(),
    )
    .unwrap();
    assert!(!stats.is_empty());

    // The adjudication UI consumes the review queue
    let queue: Vec<ReviewItem> =
        serde_json::from_str(&fs::read_to_string(out.path().join("review_queue.json")).unwrap())
            .unwrap();
    assert_eq!(queue.len(), 1);
    assert!(!queue[0].subject_candidates.is_empty());

    // Summary exists and carries the skip accounting
    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("summary.json")).unwrap())
            .unwrap();
    assert_eq!(summary["files_analyzed"], report.files_analyzed);
    assert_eq!(summary["files_skipped"], 0);
}

#[test]
fn test_artifacts_into_nested_output_dir() {
    let library = tempfile::tempdir().unwrap();
    write_media(library.path(), "projects/bass/IMG_0001.jpg");

    let registry = Registry::builtin();
    let params = AnalyzerParams::default();
    let cancel = AtomicBool::new(false);
    let report = batch::run(library.path(), &registry, &params, &cancel).unwrap();

    let out = tempfile::tempdir().unwrap();
    let nested = out.path().join("reports/run-1");
    wcmo_ca::report::write_artifacts(&report, &nested).unwrap();
    assert!(nested.join("recommendations.json").exists());
}
