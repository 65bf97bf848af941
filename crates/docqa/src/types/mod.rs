//! Core types for the question-answering service

pub mod api;
pub mod document;
pub mod query;
pub mod response;

pub use document::{Document, FileType, Fragment, IndexEntry, Metadata, SOURCE_KEY};
pub use query::{IngestMode, IngestRequest, Source};
pub use response::{
    AnswerResult, CompressedFragment, IngestReport, RetrievedFragment, UsedFragment,
};
