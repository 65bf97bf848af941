//! Loading files and directories into normalized documents

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::parser::FileParser;
use crate::error::Result;
use crate::types::{Document, FileType, Source};

/// Reads supported files beneath the given sources into [`Document`]s
///
/// Missing paths and unsupported extensions are skipped; a supported file that
/// fails to parse aborts the load.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentLoader;

impl DocumentLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load every source, in order; directories are walked recursively in sorted order
    pub fn load(&self, sources: &[Source]) -> Result<Vec<Document>> {
        let mut documents = Vec::new();

        for source in sources {
            if !source.path.exists() {
                tracing::debug!("Skipping missing source {}", source.path.display());
                continue;
            }

            for file in collect_files(&source.path) {
                let Some(file_type) = FileType::from_path(&file) else {
                    tracing::debug!("Skipping unsupported file {}", file.display());
                    continue;
                };

                let label = match &source.label {
                    Some(label) => label.clone(),
                    None => absolute(&file).display().to_string(),
                };

                let loaded = load_file(&file, file_type, &label)?;
                tracing::debug!("Loaded {} document(s) from {}", loaded.len(), label);
                documents.extend(loaded);
            }
        }

        Ok(documents)
    }
}

fn collect_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }

    WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {}: {}", path.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

fn load_file(path: &Path, file_type: FileType, source: &str) -> Result<Vec<Document>> {
    let data = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_string());

    let parsed = FileParser::parse(&filename, &data)?;

    let documents = match file_type {
        FileType::Pdf => {
            let total = parsed.total_pages.unwrap_or(parsed.pages.len() as u32);
            parsed
                .pages
                .into_iter()
                .map(|page| {
                    Document::new(page.content, source)
                        .with_metadata("page", page.page_number.to_string())
                        .with_metadata("total_pages", total.to_string())
                })
                .collect()
        }
        _ => {
            let title = parsed.title;
            parsed
                .pages
                .into_iter()
                .map(|page| {
                    let doc = Document::new(page.content, source);
                    match &title {
                        Some(title) => doc.with_metadata("title", title.clone()),
                        None => doc,
                    }
                })
                .collect()
        }
    };

    Ok(documents)
}

fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
