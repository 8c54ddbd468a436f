// RAG (Retrieval-Augmented Generation) components
//
// Components:
// - Retrieval Engine: cosine-similarity search over the knowledge store
// - Context Builder: fact lists for grounding prompts

pub mod context;
pub mod retrieval;

// Re-export key types
pub use context::ContextBuilder;
pub use retrieval::{RetrievalEngine, ScoredFact, RETRIEVAL_TOP_K};
