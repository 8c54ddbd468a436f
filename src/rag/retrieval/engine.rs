// Retrieval Engine for semantic search over the knowledge store
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::memory::{Embedder, KnowledgeStore};

/// Number of facts handed to the generator per question
pub const RETRIEVAL_TOP_K: usize = 5;

/// Retrieved fact with its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFact {
    /// Position in the corpus
    pub index: usize,
    pub text: String,
    pub score: f32,
}

/// Cosine similarity; zero-length or non-finite input scores 0.0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let sim = dot / (norm_a.sqrt() * norm_b.sqrt());
    if sim.is_finite() {
        sim
    } else {
        0.0
    }
}

/// Rank every fact against a query vector and keep the top `k`
///
/// Descending similarity, ties by ascending corpus index, so the ranking is a
/// deterministic total order and every top-k is a prefix of every top-(k+n).
pub fn rank(store: &KnowledgeStore, query: &[f32], k: usize) -> Vec<ScoredFact> {
    let mut scored: Vec<(usize, f32)> = store
        .embeddings()
        .iter()
        .enumerate()
        .map(|(index, emb)| (index, cosine_similarity(query, emb)))
        .collect();

    scored.sort_by(|a, b| match b.1.total_cmp(&a.1) {
        Ordering::Equal => a.0.cmp(&b.0),
        other => other,
    });
    scored.truncate(k.min(store.len()));

    scored
        .into_iter()
        .map(|(index, score)| ScoredFact {
            index,
            text: store.facts()[index].clone(),
            score,
        })
        .collect()
}

/// Retrieval engine for semantic search
///
/// Holds only shared read-only state; safe to call from many sessions.
#[derive(Clone)]
pub struct RetrievalEngine {
    store: Arc<KnowledgeStore>,
    embedder: Arc<dyn Embedder>,
}

impl RetrievalEngine {
    /// Create a retriever; `embedder` must be the one that built `store`
    pub fn new(store: Arc<KnowledgeStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// The `k` facts most similar to `query`, best first
    ///
    /// Never fails: an embedding error yields an empty result.
    pub fn retrieve(&self, query: &str, k: usize) -> Vec<String> {
        self.retrieve_scored(query, k)
            .into_iter()
            .map(|f| f.text)
            .collect()
    }

    /// Like [`retrieve`](Self::retrieve) but keeps index and score
    pub fn retrieve_scored(&self, query: &str, k: usize) -> Vec<ScoredFact> {
        match self.try_retrieve_scored(query, k) {
            Ok(facts) => facts,
            Err(e) => {
                warn!(error = %e, "query embedding failed, retrieving nothing");
                Vec::new()
            }
        }
    }

    /// [`retrieve_scored`](Self::retrieve_scored) on the blocking pool
    ///
    /// The embedding forward pass is CPU-bound, so it must not run on an
    /// async worker thread. A panicked embedding task also yields nothing.
    pub async fn retrieve_scored_async(&self, query: &str, k: usize) -> Vec<ScoredFact> {
        let engine = self.clone();
        let query = query.to_string();
        match tokio::task::spawn_blocking(move || engine.retrieve_scored(&query, k)).await {
            Ok(facts) => facts,
            Err(e) => {
                warn!(error = %e, "retrieval task failed, retrieving nothing");
                Vec::new()
            }
        }
    }

    /// Scored retrieval that reports embedding failures
    pub fn try_retrieve_scored(&self, query: &str, k: usize) -> Result<Vec<ScoredFact>> {
        if self.store.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vec = self.embedder.encode(query)?;
        let facts = rank(&self.store, &query_vec, k);

        debug!(
            k,
            returned = facts.len(),
            top_score = facts.first().map(|f| f.score).unwrap_or(0.0),
            "retrieved facts"
        );
        Ok(facts)
    }
}
