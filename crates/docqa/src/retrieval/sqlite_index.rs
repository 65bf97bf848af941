//! SQLite-backed persistent vector index
//!
//! Each location is a directory holding a single `index.sqlite3` file with an
//! `index_meta` table (format version, vector dimension) and an `entries` table
//! (text, metadata as JSON, vector as a little-endian f32 blob). Search is a
//! brute-force cosine scan parallelized with rayon.

use async_trait::async_trait;
use rayon::prelude::*;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::providers::VectorIndexBackend;
use crate::types::{IndexEntry, Metadata, RetrievedFragment};

/// File name of the database inside a location
pub const INDEX_FILE: &str = "index.sqlite3";

const FORMAT_VERSION: &str = "1";

/// Default [`VectorIndexBackend`]
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteVectorIndex;

impl SqliteVectorIndex {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl VectorIndexBackend for SqliteVectorIndex {
    async fn exists(&self, location: &Path) -> Result<bool> {
        Ok(db_path(location).is_file())
    }

    async fn dimensions(&self, location: &Path) -> Result<Option<usize>> {
        let location = location.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let conn = open_read_only(&location)?;
            read_dimensions(&conn)
        })
        .await?
    }

    async fn replace(&self, location: &Path, entries: Vec<IndexEntry>) -> Result<()> {
        let location = location.to_path_buf();
        tokio::task::spawn_blocking(move || replace_blocking(&location, &entries)).await?
    }

    async fn append(&self, location: &Path, entries: Vec<IndexEntry>) -> Result<()> {
        let location = location.to_path_buf();
        tokio::task::spawn_blocking(move || {
            if !db_path(&location).is_file() {
                return replace_blocking(&location, &entries);
            }
            append_blocking(&location, &entries)
        })
        .await?
    }

    async fn search(
        &self,
        location: &Path,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedFragment>> {
        let location = location.to_path_buf();
        let query = query.to_vec();
        tokio::task::spawn_blocking(move || search_blocking(&location, &query, k)).await?
    }

    async fn len(&self, location: &Path) -> Result<usize> {
        let location = location.to_path_buf();
        tokio::task::spawn_blocking(move || {
            if !db_path(&location).is_file() {
                return Ok(0);
            }
            let conn = open_read_only(&location)?;
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await?
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

fn db_path(location: &Path) -> PathBuf {
    location.join(INDEX_FILE)
}

fn open_read_only(location: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        db_path(location),
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    check_format(&conn)?;
    Ok(conn)
}

fn check_format(conn: &Connection) -> Result<()> {
    let version: Option<String> = conn
        .query_row(
            "SELECT value FROM index_meta WHERE key = 'format_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    match version.as_deref() {
        Some(FORMAT_VERSION) => Ok(()),
        Some(other) => Err(Error::vector_db(format!("Unsupported index format version {}", other))),
        None => Err(Error::vector_db("Index metadata is missing")),
    }
}

/// Create the schema in a fresh database
fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS index_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            text TEXT NOT NULL,
            metadata TEXT NOT NULL,
            vector BLOB NOT NULL
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO index_meta (key, value) VALUES ('format_version', ?1)",
        params![FORMAT_VERSION],
    )?;
    Ok(())
}

fn read_dimensions(conn: &Connection) -> Result<Option<usize>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM index_meta WHERE key = 'dimensions'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    value
        .map(|v| {
            v.parse::<usize>()
                .map_err(|e| Error::vector_db(format!("Corrupt dimension value '{}': {}", v, e)))
        })
        .transpose()
}

/// Dimension shared by every entry; mixed dimensions are a configuration error
fn batch_dimensions(entries: &[IndexEntry]) -> Result<Option<usize>> {
    let Some(first) = entries.first() else {
        return Ok(None);
    };
    let dim = first.vector.len();
    if dim == 0 {
        return Err(Error::config("Embedding provider returned an empty vector"));
    }
    if let Some(bad) = entries.iter().find(|e| e.vector.len() != dim) {
        return Err(Error::config(format!(
            "Mixed embedding dimensions in one batch: {} and {}",
            dim,
            bad.vector.len()
        )));
    }
    Ok(Some(dim))
}

fn insert_entries(conn: &mut Connection, entries: &[IndexEntry], dim: Option<usize>) -> Result<()> {
    let tx = conn.transaction()?;
    {
        if let Some(dim) = dim {
            tx.execute(
                "INSERT OR REPLACE INTO index_meta (key, value) VALUES ('dimensions', ?1)",
                params![dim.to_string()],
            )?;
        }

        let mut stmt =
            tx.prepare("INSERT INTO entries (text, metadata, vector) VALUES (?1, ?2, ?3)")?;
        for entry in entries {
            let metadata = serde_json::to_string(&entry.metadata)?;
            stmt.execute(params![entry.text, metadata, encode_vector(&entry.vector)])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Build the new index in a sibling staging directory, then swap it in
fn replace_blocking(location: &Path, entries: &[IndexEntry]) -> Result<()> {
    let dim = batch_dimensions(entries)?;

    let parent = location
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let name = location
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index".to_string());
    let staging = parent.join(format!(".{}.staging-{}", name, uuid::Uuid::new_v4()));

    let built = (|| -> Result<()> {
        fs::create_dir_all(&staging)?;
        let mut conn = Connection::open(db_path(&staging))?;
        create_schema(&conn)?;
        insert_entries(&mut conn, entries, dim)?;
        conn.close().map_err(|(_, e)| Error::from(e))
    })();

    if let Err(e) = built {
        let _ = fs::remove_dir_all(&staging);
        return Err(e);
    }

    swap_into_place(&staging, location, parent, &name)?;
    tracing::info!("Rebuilt index at {} with {} entries", location.display(), entries.len());
    Ok(())
}

/// Two renames; a crash between them leaves the old index under its `.old-*` name
fn swap_into_place(staging: &Path, location: &Path, parent: &Path, name: &str) -> Result<()> {
    if !location.exists() {
        if let Err(e) = fs::rename(staging, location) {
            let _ = fs::remove_dir_all(staging);
            return Err(e.into());
        }
        return Ok(());
    }

    let retired = parent.join(format!(".{}.old-{}", name, uuid::Uuid::new_v4()));
    if let Err(e) = fs::rename(location, &retired) {
        let _ = fs::remove_dir_all(staging);
        return Err(e.into());
    }

    if let Err(e) = fs::rename(staging, location) {
        // Put the previous index back
        let _ = fs::rename(&retired, location);
        let _ = fs::remove_dir_all(staging);
        return Err(e.into());
    }

    if let Err(e) = fs::remove_dir_all(&retired) {
        tracing::warn!("Failed to remove retired index {}: {}", retired.display(), e);
    }
    Ok(())
}

fn append_blocking(location: &Path, entries: &[IndexEntry]) -> Result<()> {
    let incoming = batch_dimensions(entries)?;

    let mut conn = Connection::open_with_flags(db_path(location), OpenFlags::SQLITE_OPEN_READ_WRITE)?;
    check_format(&conn)?;

    let existing = read_dimensions(&conn)?;
    if let (Some(existing), Some(incoming)) = (existing, incoming) {
        if existing != incoming {
            return Err(Error::config(format!(
                "Index at {} holds {}-dimensional vectors, got {}; reset the index to change embedding models",
                location.display(),
                existing,
                incoming
            )));
        }
    }

    insert_entries(&mut conn, entries, existing.or(incoming))?;
    tracing::info!("Appended {} entries to {}", entries.len(), location.display());
    Ok(())
}

fn search_blocking(location: &Path, query: &[f32], k: usize) -> Result<Vec<RetrievedFragment>> {
    if k == 0 || !db_path(location).is_file() {
        return Ok(Vec::new());
    }

    let conn = open_read_only(location)?;
    if let Some(dim) = read_dimensions(&conn)? {
        if dim != query.len() {
            return Err(Error::config(format!(
                "Query vector has {} dimensions but the index holds {}",
                query.len(),
                dim
            )));
        }
    }

    let mut stmt = conn.prepare("SELECT text, metadata, vector FROM entries ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Vec<u8>>(2)?,
        ))
    })?;

    let mut stored = Vec::new();
    for row in rows {
        let (text, metadata, blob) = row?;
        let metadata: Metadata = serde_json::from_str(&metadata)?;
        stored.push((text, metadata, decode_vector(&blob)?));
    }

    let mut scored: Vec<(usize, f32)> = stored
        .par_iter()
        .enumerate()
        .map(|(i, (_, _, vector))| (i, cosine_similarity(query, vector)))
        .collect();

    // Stable: equal scores keep insertion order
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(k);

    let mut slots: Vec<Option<(String, Metadata, Vec<f32>)>> = stored.into_iter().map(Some).collect();
    Ok(scored
        .into_iter()
        .filter_map(|(i, score)| {
            slots[i].take().map(|(text, metadata, _)| RetrievedFragment {
                text,
                metadata,
                score,
            })
        })
        .collect())
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_vector(blob: &[u8]) -> Result<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return Err(Error::vector_db(format!("Corrupt vector blob of {} bytes", blob.len())));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Cosine similarity; 0.0 when either vector has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
