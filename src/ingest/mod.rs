//! Ingestion: turn a directory of resume exports into stored candidates.
//!
//! Two input shapes are understood:
//! - `.txt`: slide-marker text, possibly holding several people; split by
//!   [`segment::segment_marked_text`]
//! - `.json`: structured deck export, one person per file; rendered with
//!   positional provenance tags by [`deck::deck_to_content`]
//!
//! One bad file is logged and skipped; ingestion is a batch operation and
//! never aborts over a single unreadable export.

pub mod deck;
pub mod segment;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::llm::extract::ProfileExtractor;
use crate::model::CandidateRecord;
use crate::storage::{CandidateStore, StorageError};

use self::segment::PersonDocument;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("data directory {0} does not exist or is not a directory")]
    MissingDataDir(PathBuf),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// What one ingestion run did.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub files_processed: usize,
    pub files_skipped: usize,
    pub candidates_stored: usize,
}

/// Ingest every recognized file directly under `data_dir`.
pub fn ingest_dir(
    data_dir: &Path,
    store: &CandidateStore,
    extractor: &dyn ProfileExtractor,
) -> Result<IngestReport, IngestError> {
    if !data_dir.is_dir() {
        return Err(IngestError::MissingDataDir(data_dir.to_path_buf()));
    }

    let mut report = IngestReport::default();
    let mut entries: Vec<PathBuf> = WalkDir::new(data_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    entries.sort();

    for path in entries {
        let Some(filename) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        let persons = match path.extension().and_then(|e| e.to_str()) {
            Some("txt") => match fs::read_to_string(&path) {
                Ok(raw) => segment::segment_marked_text(&filename, &raw),
                Err(err) => {
                    warn!(file = %filename, %err, "unreadable text export; skipping");
                    report.files_skipped += 1;
                    continue;
                }
            },
            Some("json") => match read_deck(&path) {
                Ok(content) if !content.trim().is_empty() => vec![PersonDocument {
                    synthetic_filename: filename.clone(),
                    content,
                }],
                Ok(_) => Vec::new(),
                Err(err) => {
                    warn!(file = %filename, %err, "unparseable deck export; skipping");
                    report.files_skipped += 1;
                    continue;
                }
            },
            _ => continue,
        };

        if persons.is_empty() {
            warn!(file = %filename, "no people found in export; skipping");
            report.files_skipped += 1;
            continue;
        }

        report.files_processed += 1;
        for person in persons {
            let meta = extractor.extract(&person.content);
            let record =
                CandidateRecord::from_parts(&person.synthetic_filename, meta, person.content);
            store.upsert(&record)?;
            report.candidates_stored += 1;
        }
    }

    info!(
        processed = report.files_processed,
        skipped = report.files_skipped,
        stored = report.candidates_stored,
        "ingestion finished"
    );
    Ok(report)
}

fn read_deck(path: &Path) -> anyhow::Result<String> {
    let raw = fs::read_to_string(path)?;
    let document: deck::DeckDocument = serde_json::from_str(&raw)?;
    Ok(deck::deck_to_content(&document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::extract::HeuristicExtractor;

    fn setup() -> (tempfile::TempDir, CandidateStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = CandidateStore::open(dir.path().join("candidates.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn text_export_with_two_people_stores_two_candidates() {
        let (dir, store) = setup();
        let data = dir.path().join("data");
        fs::create_dir(&data).unwrap();
        fs::write(
            data.join("pair.txt"),
            "Slide 1\nAlice Example\nNLP Lead\nalice@example.com\nSlide 2\nBob Builder\nArchitect\nbob@example.com\n",
        )
        .unwrap();

        let report = ingest_dir(&data, &store, &HeuristicExtractor).unwrap();
        assert_eq!(report.files_processed, 1);
        assert_eq!(report.candidates_stored, 2);

        let all = store.all().unwrap();
        assert_eq!(all[0].filename, "pair_person1.txt");
        assert_eq!(all[0].name, "Alice Example");
        assert_eq!(all[1].name, "Bob Builder");
    }

    #[test]
    fn deck_export_stores_tagged_content() {
        let (dir, store) = setup();
        let data = dir.path().join("data");
        fs::create_dir(&data).unwrap();
        fs::write(
            data.join("alice.json"),
            r#"{"slides": [{"shapes": ["Alice Example\nNLP Lead"]}]}"#,
        )
        .unwrap();

        let report = ingest_dir(&data, &store, &HeuristicExtractor).unwrap();
        assert_eq!(report.candidates_stored, 1);
        let row = store.all().unwrap().remove(0);
        assert_eq!(row.filename, "alice.json");
        assert!(row.content.contains("<s1_p1>"));
    }

    #[test]
    fn bad_and_empty_files_are_skipped_not_fatal() {
        let (dir, store) = setup();
        let data = dir.path().join("data");
        fs::create_dir(&data).unwrap();
        fs::write(data.join("broken.json"), "{ not json").unwrap();
        fs::write(data.join("blank.txt"), "Slide 1\n   \n").unwrap();
        fs::write(data.join("notes.md"), "ignored entirely").unwrap();
        fs::write(
            data.join("ok.txt"),
            "Slide 1\nCara Example\nDesigner\ncara@example.com\n",
        )
        .unwrap();

        let report = ingest_dir(&data, &store, &HeuristicExtractor).unwrap();
        assert_eq!(report.files_processed, 1);
        assert_eq!(report.files_skipped, 2);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn missing_data_dir_is_an_error() {
        let (dir, store) = setup();
        let err = ingest_dir(&dir.path().join("nope"), &store, &HeuristicExtractor).unwrap_err();
        assert!(matches!(err, IngestError::MissingDataDir(_)));
    }

    #[test]
    fn reingesting_the_same_file_does_not_duplicate() {
        let (dir, store) = setup();
        let data = dir.path().join("data");
        fs::create_dir(&data).unwrap();
        fs::write(
            data.join("alice.txt"),
            "Slide 1\nAlice Example\nNLP Lead\nalice@example.com\n",
        )
        .unwrap();

        ingest_dir(&data, &store, &HeuristicExtractor).unwrap();
        ingest_dir(&data, &store, &HeuristicExtractor).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }
}
