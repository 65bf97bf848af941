//! Deterministic providers and fixtures shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use docqa::config::QaConfig;
use docqa::generation::prompt::NO_OUTPUT;
use docqa::providers::{EmbeddingProvider, LlmProvider, ProviderFactory, ProviderSettings};
use docqa::retrieval::SqliteVectorIndex;
use docqa::types::api::ModelInfo;
use docqa::{ChunkingConfig, Error, QaService, Result};

pub const DIMS: usize = 256;

/// Lowercase alphanumeric words
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Word-to-dimension assignment shared by every embedder a factory hands out
#[derive(Default)]
pub struct Vocabulary {
    words: Mutex<HashMap<String, usize>>,
}

impl Vocabulary {
    fn slot(&self, word: &str) -> usize {
        let mut words = self.words.lock();
        let next = words.len();
        *words.entry(word.to_string()).or_insert(next)
    }
}

/// Bag-of-words embedder; each distinct word owns one dimension
pub struct BagOfWordsEmbedder {
    vocabulary: Arc<Vocabulary>,
    dims: usize,
    calls: Arc<AtomicUsize>,
    /// Fail the call with this zero-based number
    fail_on: Option<usize>,
    seen: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for BagOfWordsEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on == Some(self.seen.fetch_add(1, Ordering::SeqCst)) {
            return Err(Error::provider("bag-of-words", "embedding service unavailable"));
        }
        let mut vector = vec![0.0; self.dims];
        for word in words(text) {
            vector[self.vocabulary.slot(&word) % self.dims] += 1.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dims)
    }

    fn name(&self) -> &str {
        "bag-of-words"
    }
}

/// Extraction keeps a fragment when it shares a word of three or more
/// letters with the question; answers echo their context.
#[derive(Default)]
pub struct EchoLlm {
    prompts: Mutex<Vec<String>>,
}

impl EchoLlm {
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

fn between<'a>(text: &'a str, start: &str, end: &str) -> &'a str {
    text.split_once(start)
        .and_then(|(_, rest)| rest.split_once(end))
        .map(|(inner, _)| inner)
        .unwrap_or("")
}

#[async_trait]
impl LlmProvider for EchoLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());

        if prompt.contains("Extracted relevant parts:") {
            let question = between(prompt, "> Question: ", "\n");
            let context = between(prompt, ">>>\n", "\n>>>");
            let context_words = words(context);
            let relevant = words(question)
                .iter()
                .filter(|w| w.len() >= 3)
                .any(|w| context_words.contains(w));
            return Ok(if relevant {
                context.to_string()
            } else {
                NO_OUTPUT.to_string()
            });
        }

        let context = between(prompt, "Context:\n", "\n\nQuestion:");
        Ok(format!("According to the documents: {}", context))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(vec![
            ModelInfo {
                id: "echo-large".to_string(),
                owned_by: Some("tests".to_string()),
            },
            ModelInfo {
                id: "echo-small".to_string(),
                owned_by: Some("tests".to_string()),
            },
        ])
    }

    fn name(&self) -> &str {
        "echo"
    }

    fn model(&self) -> &str {
        "echo-small"
    }
}

/// Factory handing out the stub providers
pub struct StubFactory {
    vocabulary: Arc<Vocabulary>,
    dims: usize,
    pub embed_calls: Arc<AtomicUsize>,
    pub llm: Arc<EchoLlm>,
    fail_on_embed: Option<usize>,
}

impl StubFactory {
    pub fn new() -> Self {
        Self::with_dims(DIMS)
    }

    pub fn with_dims(dims: usize) -> Self {
        Self {
            vocabulary: Arc::new(Vocabulary::default()),
            dims,
            embed_calls: Arc::new(AtomicUsize::new(0)),
            llm: Arc::new(EchoLlm::default()),
            fail_on_embed: None,
        }
    }

    /// Embedders from this factory fail their `n`th call (zero-based)
    pub fn failing_on_embed(mut self, n: usize) -> Self {
        self.fail_on_embed = Some(n);
        self
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    pub fn bag_of_words(&self) -> BagOfWordsEmbedder {
        BagOfWordsEmbedder {
            vocabulary: self.vocabulary.clone(),
            dims: self.dims,
            calls: self.embed_calls.clone(),
            fail_on: None,
            seen: AtomicUsize::new(0),
        }
    }
}

impl ProviderFactory for StubFactory {
    fn embedder(&self, _settings: &ProviderSettings) -> Result<Arc<dyn EmbeddingProvider>> {
        let mut embedder = self.bag_of_words();
        embedder.fail_on = self.fail_on_embed;
        Ok(Arc::new(embedder))
    }

    fn llm(&self, _settings: &ProviderSettings) -> Result<Arc<dyn LlmProvider>> {
        Ok(self.llm.clone())
    }
}

/// Configuration rooted in `dir` with a test key and the given chunking
pub fn test_config(dir: &Path, chunk_size: usize, chunk_overlap: usize) -> QaConfig {
    let mut config = QaConfig::default();
    config.providers.api_key = Some("test-key".to_string());
    config.chunking = ChunkingConfig::new(chunk_size, chunk_overlap);
    config.data.primary_path = dir.join("data").join("sky.txt");
    config.data.reindex_dir = dir.join("data");
    config.vector_db.persist_path = dir.join("index");
    config
}

/// Service over a SQLite index and the given factory
pub fn service(config: QaConfig, factory: Arc<StubFactory>) -> QaService {
    QaService::with_providers(config, Arc::new(SqliteVectorIndex::new()), factory)
}

/// Write `content` to `dir/name`, creating parent directories
pub fn write_file(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

pub const SKY: &str = "The sky is blue. Grass is green.";
