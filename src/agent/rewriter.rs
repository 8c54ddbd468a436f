//! Query rewriter
//!
//! Turns a follow-up like "a gdzie ją postawić?" into a standalone question
//! by resolving pronouns against the last assistant answer.

use crate::agent::prompts;
use crate::config::ModelConfig;
use crate::models::TimedModel;
use tracing::{debug, warn};

/// Contextualizes follow-up questions using the responder model
#[derive(Clone)]
pub struct QueryRewriter {
    model: TimedModel,
    config: ModelConfig,
}

impl QueryRewriter {
    pub fn new(model: TimedModel, config: ModelConfig) -> Self {
        Self { model, config }
    }

    /// Standalone form of `query`; never fails
    ///
    /// Without a previous answer the query comes back unchanged and no
    /// model call is made. A failed call or an empty rewrite also returns
    /// the original query.
    pub async fn rewrite(&self, query: &str, last_answer: Option<&str>) -> String {
        let Some(last_answer) = last_answer else {
            return query.to_string();
        };

        let messages = prompts::rewrite_messages(query, last_answer);
        match self.model.call(&messages, &self.config).await {
            Ok(raw) => {
                let cleaned = clean_rewrite(&raw);
                if cleaned.is_empty() {
                    warn!("rewrite came back empty, keeping original query");
                    return query.to_string();
                }
                debug!(original = %query, rewritten = %cleaned, "query contextualized");
                cleaned.to_string()
            }
            Err(e) => {
                warn!(error = %e, "rewrite failed, keeping original query");
                query.to_string()
            }
        }
    }
}

/// Trim whitespace, then surrounding double quotes, then single quotes
fn clean_rewrite(raw: &str) -> &str {
    raw.trim().trim_matches('"').trim_matches('\'').trim()
}
