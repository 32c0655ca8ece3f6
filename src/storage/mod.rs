//! Durable candidate storage.
//!
//! SQLite is the system of record for candidate profiles; the search indices
//! are derived artifacts that can always be rebuilt from it.

pub mod sqlite;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to open candidate database at {path}: {source}")]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },

    #[error("database error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("failed to create database directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub use sqlite::CandidateStore;
