//! Knowledge base and embeddings
//!
//! Components:
//! - Embedding: `Embedder` trait and the local Candle sentence encoder
//! - Knowledge Store: fixed corpus with precomputed vectors
//! - Corpus: built-in shop facts and file loader

pub mod corpus;
pub mod embedding;
pub mod knowledge;

pub use corpus::{default_facts, load_facts_file, DEFAULT_FACTS};
pub use embedding::{Embedder, EmbeddingEngine};
pub use knowledge::KnowledgeStore;
