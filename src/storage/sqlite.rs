//! SQLite-backed candidate store.
//!
//! `filename` is the natural key: re-ingesting the same export refreshes the
//! stored profile instead of duplicating it. Multi-person documents upsert
//! one row per synthetic `_personN` filename.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::model::CandidateRecord;

use super::StorageError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS candidates (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL UNIQUE,
    name     TEXT NOT NULL,
    role     TEXT,
    email    TEXT,
    phone    TEXT,
    content  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_candidates_name ON candidates(name);
";

pub struct CandidateStore {
    conn: Connection,
    path: PathBuf,
}

impl CandidateStore {
    /// Open (or create) the store, applying the schema idempotently.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(&path).map_err(|source| StorageError::Open {
            path: path.clone(),
            source,
        })?;
        conn.execute_batch(SCHEMA)?;
        debug!(path = %path.display(), "candidate store opened");
        Ok(Self { conn, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or refresh one candidate keyed by filename. Returns the row id.
    pub fn upsert(&self, record: &CandidateRecord) -> Result<i64, StorageError> {
        self.conn.execute(
            "INSERT INTO candidates (filename, name, role, email, phone, content)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(filename) DO UPDATE SET
                 name = excluded.name,
                 role = excluded.role,
                 email = excluded.email,
                 phone = excluded.phone,
                 content = excluded.content",
            params![
                record.filename,
                record.name,
                record.role,
                record.email,
                record.phone,
                record.content
            ],
        )?;
        let id: i64 = self.conn.query_row(
            "SELECT id FROM candidates WHERE filename = ?1",
            params![record.filename],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Every stored candidate, in insertion (id) order.
    pub fn all(&self) -> Result<Vec<CandidateRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, filename, name, role, email, phone, content
             FROM candidates ORDER BY id",
        )?;
        let rows = stmt.query_map([], row_to_record)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Exact-name lookup; first match by id when several share a name.
    pub fn by_name(&self, name: &str) -> Result<Option<CandidateRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, filename, name, role, email, phone, content
             FROM candidates WHERE name = ?1 ORDER BY id LIMIT 1",
        )?;
        Ok(stmt.query_row(params![name], row_to_record).optional()?)
    }

    pub fn count(&self) -> Result<usize, StorageError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM candidates", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<CandidateRecord> {
    Ok(CandidateRecord {
        id: Some(row.get(0)?),
        filename: row.get(1)?,
        name: row.get(2)?,
        role: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        content: row.get(6)?,
    })
}
