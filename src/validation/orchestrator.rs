//! Validation orchestration and retry policy
//! Runs generate+validate cycles until an answer is good enough or attempts run out

use crate::agent::generator::AnswerGenerator;
use crate::agent::prompts::{GENERIC_FALLBACK, SAFE_FALLBACK};
use crate::agent::state::{StateEvent, TurnMachine};
use crate::config::{RetryPolicy, Settings};
use crate::errors::Result;
use crate::types::Outcome;
use crate::validation::types::ValidationScore;
use crate::validation::validator::GroundednessValidator;
use tracing::{debug, warn};

/// Lowest score a best-effort answer may have when nothing passed
pub const BEST_EFFORT_FLOOR: u8 = 4;

/// Best answer seen so far; replaced only by a strictly higher score
#[derive(Debug, Clone, Default)]
pub struct BestCandidate {
    best: Option<(ValidationScore, String)>,
}

impl BestCandidate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a candidate; returns true when it became the best
    pub fn offer(&mut self, score: ValidationScore, answer: &str) -> bool {
        let better = match &self.best {
            Some((best, _)) => score > *best,
            None => true,
        };
        if better {
            self.best = Some((score, answer.to_string()));
        }
        better
    }

    /// Best answer if it reaches `floor`
    pub fn into_answer_above(self, floor: u8) -> Option<(ValidationScore, String)> {
        self.best.filter(|(score, _)| score.meets(floor))
    }
}

/// Result of running the retry policy
#[derive(Debug, Clone)]
pub struct OrchestrationResult {
    pub answer: String,
    /// Score of `answer` when it is a generated answer
    pub score: Option<ValidationScore>,
    /// Score of each attempt in order
    pub attempt_scores: Vec<ValidationScore>,
    pub outcome: Outcome,
}

impl OrchestrationResult {
    pub fn total_attempts(&self) -> usize {
        self.attempt_scores.len()
    }

    fn fallback(answer: &str, attempt_scores: Vec<ValidationScore>, outcome: Outcome) -> Self {
        Self {
            answer: answer.to_string(),
            score: None,
            attempt_scores,
            outcome,
        }
    }
}

/// Validation orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOrchestrator {
    policy: RetryPolicy,
    max_retries: usize,
    threshold: u8,
}

impl ValidationOrchestrator {
    pub fn new(policy: RetryPolicy, max_retries: usize, threshold: u8) -> Self {
        Self {
            policy,
            max_retries,
            threshold,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.retry_policy,
            settings.max_retries,
            settings.validation_threshold,
        )
    }

    /// Produce a validated answer for `query` from `facts`
    ///
    /// `machine` must be in `Retrieve`; it is left in `Accept` or `Fallback`.
    pub async fn orchestrate(
        &self,
        machine: &mut TurnMachine,
        generator: &AnswerGenerator,
        validator: &GroundednessValidator,
        query: &str,
        facts: &[String],
        last_answer: Option<&str>,
    ) -> Result<OrchestrationResult> {
        match self.policy {
            RetryPolicy::KeepBest => {
                self.keep_best(machine, generator, validator, query, facts, last_answer)
                    .await
            }
            RetryPolicy::SingleEscalation => {
                self.single_escalation(machine, generator, validator, query, facts, last_answer)
                    .await
            }
        }
    }

    async fn keep_best(
        &self,
        machine: &mut TurnMachine,
        generator: &AnswerGenerator,
        validator: &GroundednessValidator,
        query: &str,
        facts: &[String],
        last_answer: Option<&str>,
    ) -> Result<OrchestrationResult> {
        let mut best = BestCandidate::new();
        let mut attempt_scores = Vec::with_capacity(self.max_retries);

        if self.max_retries == 0 {
            machine.fire(StateEvent::Exhausted)?;
        }

        for attempt in 1..=self.max_retries {
            machine.fire(if attempt == 1 {
                StateEvent::Retrieved
            } else {
                StateEvent::RetryAttempt
            })?;
            let answer = generator.generate(query, facts, last_answer).await;
            machine.fire(StateEvent::Generated)?;
            let score = validator.validate(query, &answer, facts).await;
            attempt_scores.push(score);

            debug!(
                attempt,
                max = self.max_retries,
                score = score.value(),
                threshold = self.threshold,
                "attempt scored"
            );

            if score.meets(self.threshold) {
                machine.fire(StateEvent::Passed)?;
                return Ok(OrchestrationResult {
                    answer,
                    score: Some(score),
                    attempt_scores,
                    outcome: Outcome::Accepted,
                });
            }
            best.offer(score, &answer);
            machine.fire(if attempt < self.max_retries {
                StateEvent::Failed
            } else {
                StateEvent::Exhausted
            })?;
        }

        Ok(match best.into_answer_above(BEST_EFFORT_FLOOR) {
            Some((score, answer)) => {
                warn!(score = score.value(), "no answer passed, using best effort");
                OrchestrationResult {
                    answer,
                    score: Some(score),
                    attempt_scores,
                    outcome: Outcome::BestEffort,
                }
            }
            None => {
                warn!(attempts = attempt_scores.len(), "no usable answer, using safe fallback");
                OrchestrationResult::fallback(SAFE_FALLBACK, attempt_scores, Outcome::SafeFallback)
            }
        })
    }

    async fn single_escalation(
        &self,
        machine: &mut TurnMachine,
        generator: &AnswerGenerator,
        validator: &GroundednessValidator,
        query: &str,
        facts: &[String],
        last_answer: Option<&str>,
    ) -> Result<OrchestrationResult> {
        machine.fire(StateEvent::Retrieved)?;
        let answer = generator.generate(query, facts, last_answer).await;
        machine.fire(StateEvent::Generated)?;
        let score = validator.validate(query, &answer, facts).await;
        debug!(score = score.value(), threshold = self.threshold, "single attempt scored");

        if score.meets(self.threshold) {
            machine.fire(StateEvent::Passed)?;
            return Ok(OrchestrationResult {
                answer,
                score: Some(score),
                attempt_scores: vec![score],
                outcome: Outcome::Accepted,
            });
        }

        machine.fire(StateEvent::Exhausted)?;
        warn!(score = score.value(), "answer rejected, escalating to generic reply");
        Ok(OrchestrationResult::fallback(
            GENERIC_FALLBACK,
            vec![score],
            Outcome::GenericFallback,
        ))
    }
}

impl Default for ValidationOrchestrator {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::state::PipelineState;
    use crate::config::{ApiType, ModelConfig};
    use crate::models::{ChatModel, TimedModel};
    use crate::types::Category;
    use crate::types::ChatMessage;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Answers "odpowiedź N" to generation and pops scripted scores for validation
    struct ScoreScript {
        scores: Mutex<VecDeque<&'static str>>,
        generated: Mutex<usize>,
    }

    #[async_trait]
    impl ChatModel for ScoreScript {
        async fn complete(&self, _: &[ChatMessage], config: &ModelConfig) -> Result<String> {
            if config.name == "validator" {
                Ok(self.scores.lock().unwrap().pop_front().unwrap_or("0").to_string())
            } else {
                let mut n = self.generated.lock().unwrap();
                *n += 1;
                Ok(format!("odpowiedź {}", n))
            }
        }
    }

    fn parts(scores: &[&'static str]) -> (AnswerGenerator, GroundednessValidator, Arc<ScoreScript>) {
        let script = Arc::new(ScoreScript {
            scores: Mutex::new(scores.iter().copied().collect()),
            generated: Mutex::new(0),
        });
        let timed = TimedModel::new(script.clone(), Duration::from_secs(5));
        let config = |name: &str| ModelConfig {
            api_type: ApiType::LmStudio,
            name: name.to_string(),
            temperature: 0.0,
            max_tokens: 10,
        };
        (
            AnswerGenerator::new(timed.clone(), config("responder")),
            GroundednessValidator::new(timed, config("validator")),
            script,
        )
    }

    async fn run(policy: RetryPolicy, max_retries: usize, scores: &[&'static str]) -> (OrchestrationResult, usize) {
        let (generator, validator, script) = parts(scores);
        let orchestrator = ValidationOrchestrator::new(policy, max_retries, 7);

        let mut machine = TurnMachine::new();
        machine.fire(StateEvent::Begin).unwrap();
        machine.fire(StateEvent::Rewritten).unwrap();
        machine.fire(StateEvent::Classified(Category::OnTopic)).unwrap();

        let result = orchestrator
            .orchestrate(&mut machine, &generator, &validator, "q", &[], None)
            .await
            .unwrap();

        let expected = if result.outcome == Outcome::Accepted {
            PipelineState::Accept
        } else {
            PipelineState::Fallback
        };
        assert_eq!(machine.state(), expected);

        let generated = *script.generated.lock().unwrap();
        (result, generated)
    }

    #[test]
    fn test_best_candidate_keeps_first_of_equal_scores() {
        let mut best = BestCandidate::new();
        assert!(best.offer(ValidationScore::new(5), "a"));
        assert!(!best.offer(ValidationScore::new(5), "b"));
        assert!(best.offer(ValidationScore::new(6), "c"));
        assert_eq!(
            best.into_answer_above(0),
            Some((ValidationScore::new(6), "c".to_string()))
        );
    }

    #[test]
    fn test_best_candidate_floor() {
        let mut best = BestCandidate::new();
        best.offer(ValidationScore::new(3), "a");
        assert!(best.clone().into_answer_above(BEST_EFFORT_FLOOR).is_none());
        best.offer(ValidationScore::new(4), "b");
        assert_eq!(best.into_answer_above(BEST_EFFORT_FLOOR).unwrap().1, "b");
    }

    #[tokio::test]
    async fn test_accepts_first_passing_attempt() {
        let (result, generated) = run(RetryPolicy::KeepBest, 3, &["3", "8", "10"]).await;
        assert_eq!(result.outcome, Outcome::Accepted);
        assert_eq!(result.answer, "odpowiedź 2");
        assert_eq!(result.total_attempts(), 2);
        assert_eq!(generated, 2);
    }

    #[tokio::test]
    async fn test_best_effort_when_nothing_passes() {
        let (result, _) = run(RetryPolicy::KeepBest, 3, &["5", "6", "4"]).await;
        assert_eq!(result.outcome, Outcome::BestEffort);
        assert_eq!(result.answer, "odpowiedź 2");
        assert_eq!(result.score, Some(ValidationScore::new(6)));
        assert_eq!(result.total_attempts(), 3);
    }

    #[tokio::test]
    async fn test_safe_fallback_below_floor() {
        let (result, _) = run(RetryPolicy::KeepBest, 3, &["2", "3", "1"]).await;
        assert_eq!(result.outcome, Outcome::SafeFallback);
        assert_eq!(result.answer, SAFE_FALLBACK);
        assert!(result.score.is_none());
    }

    #[tokio::test]
    async fn test_zero_retries_is_safe_fallback() {
        let (result, generated) = run(RetryPolicy::KeepBest, 0, &[]).await;
        assert_eq!(result.outcome, Outcome::SafeFallback);
        assert_eq!(result.total_attempts(), 0);
        assert_eq!(generated, 0);
    }

    #[tokio::test]
    async fn test_single_escalation_one_attempt() {
        let (result, generated) = run(RetryPolicy::SingleEscalation, 3, &["5", "10"]).await;
        assert_eq!(result.outcome, Outcome::GenericFallback);
        assert_eq!(result.answer, GENERIC_FALLBACK);
        assert_eq!(generated, 1);

        let (result, _) = run(RetryPolicy::SingleEscalation, 3, &["9"]).await;
        assert_eq!(result.outcome, Outcome::Accepted);
    }
}
