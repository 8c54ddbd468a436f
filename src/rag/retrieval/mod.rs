// Retrieval Engine Module
pub mod engine;

pub use engine::{cosine_similarity, rank, RetrievalEngine, ScoredFact, RETRIEVAL_TOP_K};
