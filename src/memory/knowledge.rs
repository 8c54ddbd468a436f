//! Knowledge store: the fixed corpus and its embeddings
//!
//! Built once at startup and shared read-only (`Arc<KnowledgeStore>`)
//! between every session; there are no mutation operations.

use crate::errors::{AssistantError, Result};
use crate::memory::embedding::Embedder;
use tracing::info;

/// Ordered facts with aligned embedding vectors
#[derive(Debug, Clone, Default)]
pub struct KnowledgeStore {
    facts: Vec<String>,
    embeddings: Vec<Vec<f32>>,
}

impl KnowledgeStore {
    /// Encode every fact once with the given embedder
    ///
    /// An embedding failure here is fatal for startup.
    pub fn build(facts: Vec<String>, embedder: &dyn Embedder) -> Result<Self> {
        let refs: Vec<&str> = facts.iter().map(String::as_str).collect();
        let embeddings = embedder.encode_batch(&refs)?;
        let store = Self::from_parts(facts, embeddings)?;

        info!(
            facts = store.len(),
            dimension = embedder.dimension(),
            "knowledge store ready"
        );
        Ok(store)
    }

    /// Assemble a store from precomputed vectors
    pub fn from_parts(facts: Vec<String>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if facts.len() != embeddings.len() {
            return Err(AssistantError::ConfigError(format!(
                "{} facts but {} embeddings",
                facts.len(),
                embeddings.len()
            )));
        }
        Ok(Self { facts, embeddings })
    }

    /// Facts in corpus order
    pub fn facts(&self) -> &[String] {
        &self.facts
    }

    /// Embeddings aligned with [`facts`](Self::facts)
    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LengthEmbedder;

    impl Embedder for LengthEmbedder {
        fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    struct BrokenEmbedder;

    impl Embedder for BrokenEmbedder {
        fn encode_batch(&self, _: &[&str]) -> Result<Vec<Vec<f32>>> {
            Err(AssistantError::EmbeddingError("offline".to_string()))
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    #[test]
    fn test_build_aligns_embeddings() {
        let facts = vec!["ab".to_string(), "abcd".to_string()];
        let store = KnowledgeStore::build(facts, &LengthEmbedder).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.embeddings()[0], vec![2.0, 1.0]);
        assert_eq!(store.embeddings()[1], vec![4.0, 1.0]);
        assert_eq!(store.facts()[1], "abcd");
    }

    #[test]
    fn test_build_propagates_embedding_failure() {
        let result = KnowledgeStore::build(vec!["x".to_string()], &BrokenEmbedder);
        assert!(matches!(result, Err(AssistantError::EmbeddingError(_))));
    }

    #[test]
    fn test_from_parts_rejects_misaligned() {
        let result = KnowledgeStore::from_parts(vec!["a".to_string()], vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_store() {
        let store = KnowledgeStore::build(Vec::new(), &LengthEmbedder).unwrap();
        assert!(store.is_empty());
        assert!(store.facts().is_empty());
    }
}
