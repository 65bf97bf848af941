//! docqa: question answering over a local document collection
//!
//! Documents are split with a recursive character splitter, embedded and
//! stored in a persistent vector index. Questions retrieve the nearest
//! fragments, an LLM compresses each one to the passages relevant to the
//! question, and a final call writes a grounded answer with `doc_<i>` citations.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod service;
pub mod settings;
pub mod types;

pub use config::{ChunkingConfig, ProviderKind, QaConfig};
pub use error::{Error, Result};
pub use server::RagServer;
pub use service::{QaService, UploadedFile};
pub use types::{
    api::{AskRequest, AskResponse},
    AnswerResult, Document, Fragment, IngestMode, IngestReport, IngestRequest, Source,
};
