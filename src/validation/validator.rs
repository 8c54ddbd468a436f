//! Groundedness validator
//! Asks the validator model how well an answer is supported by the retrieved facts

use crate::agent::prompts;
use crate::config::ModelConfig;
use crate::errors::{AssistantError, Result};
use crate::models::TimedModel;
use crate::rag::ContextBuilder;
use crate::validation::types::ValidationScore;
use tracing::{debug, warn};

/// Parse a score from raw validator output
///
/// All ASCII digits are joined and read as one integer, then clamped to
/// 0..=10, so "8/10" reads as 810 and clamps to 10. No digits is a
/// [`AssistantError::ParseFailure`].
pub fn parse_score(raw: &str) -> Result<ValidationScore> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(AssistantError::ParseFailure(format!(
            "no digits in validator output: {:?}",
            raw
        )));
    }

    // Only overflow can fail here
    let value = digits.parse::<u64>().unwrap_or(u64::MAX);
    Ok(ValidationScore::new(value))
}

/// Scores answers 0-10 for groundedness
#[derive(Clone)]
pub struct GroundednessValidator {
    model: TimedModel,
    config: ModelConfig,
    context: ContextBuilder,
}

impl GroundednessValidator {
    /// Create validator backed by the validator model
    pub fn new(model: TimedModel, config: ModelConfig) -> Self {
        Self {
            model,
            config,
            context: ContextBuilder::new(),
        }
    }

    /// Score `answer` against `facts`; never fails
    ///
    /// Call failures and unparseable output give [`ValidationScore::NEUTRAL`].
    pub async fn validate(&self, query: &str, answer: &str, facts: &[String]) -> ValidationScore {
        match self.try_validate(query, answer, facts).await {
            Ok(score) => {
                debug!(score = score.value(), "answer scored");
                score
            }
            Err(e) => {
                warn!(error = %e, "validation failed, assuming neutral score");
                ValidationScore::NEUTRAL
            }
        }
    }

    async fn try_validate(&self, query: &str, answer: &str, facts: &[String]) -> Result<ValidationScore> {
        let context = self.context.build(facts);
        let messages = prompts::validate_messages(query, answer, &context);
        let raw = self.model.call(&messages, &self.config).await?;
        parse_score(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiType;
    use crate::models::ChatModel;
    use crate::types::ChatMessage;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    struct FixedModel(std::result::Result<&'static str, ()>);

    #[async_trait]
    impl ChatModel for FixedModel {
        async fn complete(&self, _: &[ChatMessage], _: &ModelConfig) -> Result<String> {
            self.0
                .map(str::to_string)
                .map_err(|_| AssistantError::CallFailure("offline".to_string()))
        }
    }

    fn validator(reply: std::result::Result<&'static str, ()>) -> GroundednessValidator {
        let model = TimedModel::new(Arc::new(FixedModel(reply)), Duration::from_secs(5));
        let config = ModelConfig {
            api_type: ApiType::LmStudio,
            name: "validator".to_string(),
            temperature: 0.0,
            max_tokens: 5,
        };
        GroundednessValidator::new(model, config)
    }

    #[test]
    fn test_parse_plain_number() {
        assert_eq!(parse_score("7").unwrap().value(), 7);
        assert_eq!(parse_score(" Ocena: 9 ").unwrap().value(), 9);
    }

    #[test]
    fn test_parse_joins_digits_and_clamps() {
        assert_eq!(parse_score("8/10").unwrap().value(), 10);
        assert_eq!(parse_score("15").unwrap().value(), 10);
        assert_eq!(parse_score("99999999999999999999999999").unwrap().value(), 10);
        assert_eq!(parse_score("0").unwrap().value(), 0);
    }

    #[test]
    fn test_parse_without_digits_fails() {
        assert!(matches!(parse_score("dobra"), Err(AssistantError::ParseFailure(_))));
        assert!(parse_score("").is_err());
    }

    #[tokio::test]
    async fn test_validate_uses_model_score() {
        let score = validator(Ok("8")).validate("q", "a", &[]).await;
        assert_eq!(score.value(), 8);
    }

    #[tokio::test]
    async fn test_validate_neutral_on_garbage() {
        let score = validator(Ok("świetna")).validate("q", "a", &[]).await;
        assert_eq!(score, ValidationScore::NEUTRAL);
    }

    #[tokio::test]
    async fn test_validate_neutral_on_call_failure() {
        let score = validator(Err(())).validate("q", "a", &[]).await;
        assert_eq!(score, ValidationScore::NEUTRAL);
    }
}
