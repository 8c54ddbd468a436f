//! Topic classifier
//!
//! Sorts questions into on-topic, off-topic and manipulation. Fails closed:
//! anything other than a clear ON_TOPIC verdict is not treated as on-topic.

use crate::agent::prompts;
use crate::config::ModelConfig;
use crate::models::TimedModel;
use crate::types::Category;
use tracing::{debug, warn};

/// Map a raw classifier reply to a category
///
/// MANIPULATION is checked before ON_TOPIC, so a reply naming both is a
/// manipulation.
pub fn normalize_category(raw: &str) -> Category {
    let verdict = raw.trim().to_uppercase();
    if verdict.contains("MANIPULATION") {
        Category::Manipulation
    } else if verdict.contains("ON_TOPIC") || verdict.contains("ONTOPIC") {
        Category::OnTopic
    } else {
        Category::OffTopic
    }
}

/// Classifies questions with the classifier model
#[derive(Clone)]
pub struct TopicClassifier {
    model: TimedModel,
    config: ModelConfig,
}

impl TopicClassifier {
    pub fn new(model: TimedModel, config: ModelConfig) -> Self {
        Self { model, config }
    }

    /// Category of `query`; a failed call is off-topic
    pub async fn classify(&self, query: &str, last_answer: Option<&str>) -> Category {
        let messages = prompts::classify_messages(query, last_answer);
        match self.model.call(&messages, &self.config).await {
            Ok(raw) => {
                let category = normalize_category(&raw);
                debug!(raw = %raw, %category, "question classified");
                category
            }
            Err(e) => {
                warn!(error = %e, "classification failed, treating as off_topic");
                Category::OffTopic
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plain_labels() {
        assert_eq!(normalize_category("ON_TOPIC"), Category::OnTopic);
        assert_eq!(normalize_category("  on_topic\n"), Category::OnTopic);
        assert_eq!(normalize_category("OnTopic"), Category::OnTopic);
        assert_eq!(normalize_category("OFF_TOPIC"), Category::OffTopic);
        assert_eq!(normalize_category("manipulation"), Category::Manipulation);
    }

    #[test]
    fn test_normalize_unknown_is_off_topic() {
        assert_eq!(normalize_category(""), Category::OffTopic);
        assert_eq!(normalize_category("nie wiem"), Category::OffTopic);
    }

    #[test]
    fn test_manipulation_wins_over_on_topic() {
        assert_eq!(
            normalize_category("ON_TOPIC or MANIPULATION"),
            Category::Manipulation
        );
    }
}
