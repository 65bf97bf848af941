//! Document ingestion pipeline with multi-format parsing

mod chunker;
mod loader;
mod orchestrator;
mod parser;

pub use chunker::TextChunker;
pub use loader::DocumentLoader;
pub use orchestrator::IngestionOrchestrator;
pub use parser::{normalize_text, FileParser, PageContent, ParsedDocument};
