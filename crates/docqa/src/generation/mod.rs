//! Contextual compression and answer generation

pub mod compressor;
pub mod prompt;
pub mod qa;
pub mod synthesizer;

pub use compressor::ContextCompressor;
pub use prompt::PromptBuilder;
pub use qa::QaOrchestrator;
pub use synthesizer::AnswerSynthesizer;
