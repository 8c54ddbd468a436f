//! Answer generator
//! Produces an answer grounded in the retrieved facts

use crate::agent::prompts;
use crate::config::ModelConfig;
use crate::models::TimedModel;
use crate::rag::ContextBuilder;
use tracing::{debug, warn};

/// Generates answers with the responder model
#[derive(Clone)]
pub struct AnswerGenerator {
    model: TimedModel,
    config: ModelConfig,
    context: ContextBuilder,
}

impl AnswerGenerator {
    pub fn new(model: TimedModel, config: ModelConfig) -> Self {
        Self {
            model,
            config,
            context: ContextBuilder::new(),
        }
    }

    /// Answer `query` from `facts`; a failed call yields the technical apology
    pub async fn generate(&self, query: &str, facts: &[String], last_answer: Option<&str>) -> String {
        let context = self.context.build(facts);
        let messages = prompts::generate_messages(query, &context, last_answer);

        match self.model.call(&messages, &self.config).await {
            Ok(answer) => {
                debug!(facts = facts.len(), chars = answer.chars().count(), "answer generated");
                answer
            }
            Err(e) => {
                warn!(error = %e, "generation failed, returning apology");
                prompts::TECHNICAL_APOLOGY.to_string()
            }
        }
    }
}
