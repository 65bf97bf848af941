//! Ingestion request types

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::ChunkingConfig;

/// How an ingestion call treats an existing index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestMode {
    /// Discard existing entries and rebuild from the given sources
    Reset,
    /// Add entries; acts like `Reset` when no index exists yet
    Append,
}

/// A path to ingest, optionally reported under a different `source` label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// File or directory on disk
    pub path: PathBuf,
    /// Replaces `metadata.source` for every document loaded from `path`
    pub label: Option<String>,
}

impl Source {
    /// A source reported under its absolute path
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            label: None,
        }
    }

    /// A source reported under `label`
    pub fn labeled(path: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            label: Some(label.into()),
        }
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Self::path(path)
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Self::path(path)
    }
}

impl From<&str> for Source {
    fn from(path: &str) -> Self {
        Self::path(path)
    }
}

/// One ingestion call
#[derive(Debug, Clone)]
pub struct IngestRequest {
    /// Files or directories to load
    pub sources: Vec<Source>,
    /// Directory the index persists to
    pub persist_location: PathBuf,
    /// Chunking parameters
    pub chunking: ChunkingConfig,
    /// Reset or append
    pub mode: IngestMode,
}
