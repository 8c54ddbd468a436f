// Context builder for grounding prompts
use crate::rag::retrieval::ScoredFact;

/// Context builder for assembling fact lists
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextBuilder;

impl ContextBuilder {
    pub fn new() -> Self {
        ContextBuilder
    }

    /// `- fact` per line in the given order, as sent to the generator and validator
    pub fn build<S: AsRef<str>>(&self, facts: &[S]) -> String {
        facts
            .iter()
            .map(|fact| format!("- {}", fact.as_ref()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Numbered listing with similarity scores, for inspection
    pub fn build_scored(&self, facts: &[ScoredFact]) -> String {
        facts
            .iter()
            .enumerate()
            .map(|(i, f)| format!("{}. [{:.3}] {}", i + 1, f.score, f.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
