//! Pipeline outcome types shared by the session, REPL and CLI

use crate::validation::ValidationScore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Topic classification of an incoming question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    OnTopic,
    OffTopic,
    Manipulation,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::OnTopic => "on_topic",
            Category::OffTopic => "off_topic",
            Category::Manipulation => "manipulation",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the final answer was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A generated answer reached the validation threshold
    Accepted,
    /// No answer reached the threshold; the best one was good enough
    BestEffort,
    /// No answer was good enough; fixed safe reply
    SafeFallback,
    /// Single-escalation policy gave up after one attempt
    GenericFallback,
    /// Off-topic or manipulation refusal
    Refused,
}

impl Outcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Outcome::SafeFallback | Outcome::GenericFallback)
    }
}

/// Result of one pipeline turn
///
/// `answer` is what the user sees; the rest is for logging and debugging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub answer: String,
    pub category: Category,
    /// Query after contextualization (equals the input when unchanged)
    pub rewritten_query: String,
    /// Score of the returned answer, when it came from validation
    pub score: Option<ValidationScore>,
    /// Generate+validate cycles run
    pub attempts: usize,
    pub outcome: Outcome,
}

impl PipelineResult {
    /// Fixed refusal that skipped retrieval and generation
    pub fn refusal(answer: &str, category: Category, rewritten_query: String) -> Self {
        Self {
            answer: answer.to_string(),
            category,
            rewritten_query,
            score: None,
            attempts: 0,
            outcome: Outcome::Refused,
        }
    }
}
