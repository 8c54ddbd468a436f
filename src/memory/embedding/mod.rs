// Embedding Module
pub mod engine;

pub use engine::{Embedder, EmbeddingEngine};
