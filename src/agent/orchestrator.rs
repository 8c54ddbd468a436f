//! Response pipeline - main coordinator
//!
//! Drives one conversational turn through:
//! - Query rewriting against the last assistant answer
//! - Topic classification and refusals
//! - Retrieval of supporting facts
//! - Generation with validation and retries
//! - History append and trim

use crate::agent::classifier::TopicClassifier;
use crate::agent::generator::AnswerGenerator;
use crate::agent::history::ConversationHistory;
use crate::agent::prompts::{MANIPULATION_REPLY, OFF_TOPIC_REPLY, TECHNICAL_APOLOGY};
use crate::agent::rewriter::QueryRewriter;
use crate::agent::state::{StateEvent, TurnMachine};
use crate::config::{BotConfig, ModelRole};
use crate::errors::Result;
use crate::models::{ChatModel, TimedModel};
use crate::rag::{RetrievalEngine, RETRIEVAL_TOP_K};
use crate::telemetry::{PipelineEvent, TelemetryCollector};
use crate::types::{Category, Outcome, PipelineResult};
use crate::validation::{GroundednessValidator, ValidationOrchestrator};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info_span, warn, Instrument};
use uuid::Uuid;

/// Immutable pipeline parts shared by every session
pub struct ResponsePipeline {
    rewriter: QueryRewriter,
    classifier: TopicClassifier,
    retriever: RetrievalEngine,
    generator: AnswerGenerator,
    validator: GroundednessValidator,
    orchestrator: ValidationOrchestrator,
    max_history_pairs: usize,
}

impl ResponsePipeline {
    /// Assemble a pipeline from configuration, a chat model and a retriever
    pub fn new(config: &BotConfig, model: Arc<dyn ChatModel>, retriever: RetrievalEngine) -> Self {
        let timeout = Duration::from_secs(config.settings.request_timeout_secs);
        let timed = TimedModel::new(model, timeout);
        let responder = config.model(ModelRole::Responder).clone();

        Self {
            rewriter: QueryRewriter::new(timed.clone(), responder.clone()),
            classifier: TopicClassifier::new(
                timed.clone(),
                config.model(ModelRole::Classifier).clone(),
            ),
            retriever,
            generator: AnswerGenerator::new(timed.clone(), responder),
            validator: GroundednessValidator::new(timed, config.model(ModelRole::Validator).clone()),
            orchestrator: ValidationOrchestrator::from_settings(&config.settings),
            max_history_pairs: config.settings.max_history_pairs,
        }
    }

    /// Start a new conversation
    pub fn session(self: &Arc<Self>) -> Session {
        Session::new(Arc::clone(self))
    }

    /// Run one turn against `history`
    ///
    /// Errors only on an invalid state transition; every component failure
    /// has already been turned into a fallback reply.
    async fn run_turn(
        &self,
        history: &mut ConversationHistory,
        question: &str,
        telemetry: &TelemetryCollector,
    ) -> Result<PipelineResult> {
        let mut machine = TurnMachine::new();
        machine.fire(StateEvent::Begin)?;

        // Step 1: Rewrite against the newest assistant turn
        let last_answer = history.last_assistant_turn().map(str::to_string);
        let last_answer = last_answer.as_deref();
        let rewritten = self.rewriter.rewrite(question, last_answer).await;
        machine.fire(StateEvent::Rewritten)?;

        // Step 2: Classify
        let category = self.classifier.classify(&rewritten, last_answer).await;
        telemetry.record(PipelineEvent::Classified {
            category,
            rewritten: rewritten != question,
            timestamp: Instant::now(),
        });
        machine.fire(StateEvent::Classified(category))?;

        let result = match category {
            Category::Manipulation | Category::OffTopic => {
                let reply = if category == Category::Manipulation {
                    MANIPULATION_REPLY
                } else {
                    OFF_TOPIC_REPLY
                };
                machine.fire(StateEvent::Replied)?;
                PipelineResult::refusal(reply, category, rewritten)
            }
            Category::OnTopic => {
                // Step 3: Retrieve
                let scored = self
                    .retriever
                    .retrieve_scored_async(&rewritten, RETRIEVAL_TOP_K)
                    .await;
                telemetry.record(PipelineEvent::Retrieved {
                    facts: scored.len(),
                    top_score: scored.first().map(|f| f.score),
                    timestamp: Instant::now(),
                });
                let facts: Vec<String> = scored.into_iter().map(|f| f.text).collect();

                // Step 4: Generate and validate
                let outcome = self
                    .orchestrator
                    .orchestrate(
                        &mut machine,
                        &self.generator,
                        &self.validator,
                        &rewritten,
                        &facts,
                        last_answer,
                    )
                    .await?;

                for (i, score) in outcome.attempt_scores.iter().enumerate() {
                    telemetry.record(PipelineEvent::AttemptScored {
                        attempt: i + 1,
                        score: score.value(),
                        timestamp: Instant::now(),
                    });
                }
                if outcome.outcome.is_fallback() {
                    telemetry.record(PipelineEvent::FallbackUsed {
                        outcome: outcome.outcome,
                        timestamp: Instant::now(),
                    });
                }

                machine.fire(StateEvent::Answered)?;
                PipelineResult {
                    attempts: outcome.total_attempts(),
                    answer: outcome.answer,
                    category,
                    rewritten_query: rewritten,
                    score: outcome.score,
                    outcome: outcome.outcome,
                }
            }
        };

        // Step 5: Remember the original question, then trim
        history.append_exchange(question, &result.answer);
        machine.fire(StateEvent::Appended)?;
        let evicted = history.trim();
        machine.fire(StateEvent::Trimmed)?;

        debug!(
            path = %machine.path_string(),
            evicted,
            history_len = history.len(),
            "turn finished"
        );
        Ok(result)
    }
}

/// One conversation with the assistant
///
/// Owns its history; turns are strictly sequential through `&mut self`.
pub struct Session {
    id: Uuid,
    pipeline: Arc<ResponsePipeline>,
    history: ConversationHistory,
    telemetry: TelemetryCollector,
}

impl Session {
    pub fn new(pipeline: Arc<ResponsePipeline>) -> Self {
        let history = ConversationHistory::new(pipeline.max_history_pairs);
        Self {
            id: Uuid::new_v4(),
            pipeline,
            history,
            telemetry: TelemetryCollector::new(),
        }
    }

    /// Answer a question
    pub async fn ask(&mut self, question: &str) -> String {
        self.respond(question).await.answer
    }

    /// Answer a question, keeping the pipeline details
    pub async fn respond(&mut self, question: &str) -> PipelineResult {
        let started = Instant::now();
        self.telemetry.record(PipelineEvent::TurnStarted {
            question: question.to_string(),
            timestamp: started,
        });

        let span = info_span!("turn", session = %self.id, turn = self.history.turn_count() / 2 + 1);
        let result = match self
            .pipeline
            .run_turn(&mut self.history, question, &self.telemetry)
            .instrument(span)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "pipeline aborted, answering with apology");
                let mut result = PipelineResult::refusal(
                    TECHNICAL_APOLOGY,
                    Category::OffTopic,
                    question.to_string(),
                );
                result.outcome = Outcome::SafeFallback;
                self.history.append_exchange(question, TECHNICAL_APOLOGY);
                self.history.trim();
                result
            }
        };

        if result.outcome.is_fallback() {
            warn!(outcome = ?result.outcome, "answered with a fallback");
        }
        self.telemetry.record(PipelineEvent::TurnCompleted {
            outcome: result.outcome,
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Instant::now(),
        });
        result
    }

    /// Start over with just the preamble
    pub fn reset(&mut self) {
        self.history.reset();
        self.telemetry.reset();
        self.id = Uuid::new_v4();
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}
