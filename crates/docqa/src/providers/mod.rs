//! Provider abstractions for embeddings, completion and vector storage
//!
//! The orchestrators only see the traits; concrete HTTP clients are chosen per
//! call by a [`ProviderFactory`] from a [`ProviderSettings`] snapshot.

pub mod embedding;
pub mod factory;
pub mod http;
pub mod llm;
pub mod ollama;
pub mod openai;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use factory::{HttpProviderFactory, ProviderFactory, ProviderSettings};
pub use http::RetryPolicy;
pub use llm::LlmProvider;
pub use vector_store::VectorIndexBackend;
