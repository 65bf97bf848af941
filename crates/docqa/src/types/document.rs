//! Document and fragment types with source attribution

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// String metadata attached to documents, fragments and index entries
pub type Metadata = BTreeMap<String, String>;

/// Metadata key holding the source path or upload identifier
pub const SOURCE_KEY: &str = "source";

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Plain text file
    Txt,
    /// Markdown file (loaded as plain text)
    Markdown,
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Old Microsoft Word document (.doc), read with the .docx reader
    Doc,
    /// HTML document
    Html,
}

impl FileType {
    /// Detect file type from extension; `None` for anything unsupported
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" => Some(Self::Txt),
            "md" | "markdown" => Some(Self::Markdown),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "doc" => Some(Self::Doc),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }

    /// Detect file type from a file name or path
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Txt => "Text File",
            Self::Markdown => "Markdown",
            Self::Pdf => "PDF",
            Self::Docx => "Word Document (.docx)",
            Self::Doc => "Word Document (.doc)",
            Self::Html => "HTML",
        }
    }
}

/// A normalized document produced by the loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Normalized text content
    pub content: String,
    /// Metadata; always contains `source`
    pub metadata: Metadata,
}

impl Document {
    /// Create a document attributed to `source`
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert(SOURCE_KEY.to_string(), source.into());
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Source path or upload identifier
    pub fn source(&self) -> &str {
        self.metadata
            .get(SOURCE_KEY)
            .map(String::as_str)
            .unwrap_or("unknown")
    }
}

/// A bounded slice of a document's text; the unit of embedding and retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Fragment text
    pub text: String,
    /// Owned copy of the parent document's metadata
    pub metadata: Metadata,
}

impl Fragment {
    /// Source path or upload identifier
    pub fn source(&self) -> &str {
        self.metadata
            .get(SOURCE_KEY)
            .map(String::as_str)
            .unwrap_or("unknown")
    }
}

/// A fragment together with its embedding, as persisted by the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Embedding vector
    pub vector: Vec<f32>,
    /// Fragment text
    pub text: String,
    /// Fragment metadata
    pub metadata: Metadata,
}

impl IndexEntry {
    /// Attach an embedding to a fragment
    pub fn new(fragment: Fragment, vector: Vec<f32>) -> Self {
        Self {
            vector,
            text: fragment.text,
            metadata: fragment.metadata,
        }
    }
}
