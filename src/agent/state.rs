//! Response pipeline state machine
//!
//! One turn walks a fixed graph from `Start` to `Done`:
//! - Refusals: Classify → ManipulationReply | OffTopicReply → AppendHistory
//! - Answers: Classify → Retrieve → Generate → Validate, then Accept, a
//!   Retry back to Generate, or Fallback once attempts run out
//! - Every branch ends AppendHistory → Trim → Done

use crate::errors::{AssistantError, Result};
use crate::types::Category;
use serde::{Deserialize, Serialize};

/// Pipeline states for a single turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineState {
    Start,
    Rewrite,
    Classify,
    ManipulationReply,
    OffTopicReply,
    Retrieve,
    Generate,
    Validate,
    Accept,
    Retry,
    Fallback,
    AppendHistory,
    Trim,
    /// Terminal
    Done,
}

/// Events that trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    Begin,
    Rewritten,
    Classified(Category),
    /// Refusal text chosen
    Replied,
    Retrieved,
    Generated,
    /// Score reached the threshold
    Passed,
    /// Score below threshold, attempts remain
    Failed,
    /// No attempts left
    Exhausted,
    RetryAttempt,
    /// Final answer chosen
    Answered,
    Appended,
    Trimmed,
}

impl PipelineState {
    /// Attempt state transition with validation
    ///
    /// Valid transitions:
    /// 1.  Start             → Rewrite           (Begin)
    /// 2.  Rewrite           → Classify          (Rewritten)
    /// 3.  Classify          → ManipulationReply (Classified(Manipulation))
    /// 4.  Classify          → OffTopicReply     (Classified(OffTopic))
    /// 5.  Classify          → Retrieve          (Classified(OnTopic))
    /// 6.  *Reply            → AppendHistory     (Replied)
    /// 7.  Retrieve          → Generate          (Retrieved)
    /// 8.  Retrieve          → Fallback          (Exhausted, zero attempts allowed)
    /// 9.  Generate          → Validate          (Generated)
    /// 10. Validate          → Accept            (Passed)
    /// 11. Validate          → Retry             (Failed)
    /// 12. Validate          → Fallback          (Exhausted)
    /// 13. Retry             → Generate          (RetryAttempt)
    /// 14. Accept | Fallback → AppendHistory     (Answered)
    /// 15. AppendHistory     → Trim              (Appended)
    /// 16. Trim              → Done              (Trimmed)
    pub fn transition(&self, event: StateEvent) -> Result<PipelineState> {
        use PipelineState::*;
        use StateEvent::*;

        let next_state = match (self, event) {
            (Start, Begin) => Rewrite,
            (Rewrite, Rewritten) => Classify,

            (Classify, Classified(Category::Manipulation)) => ManipulationReply,
            (Classify, Classified(Category::OffTopic)) => OffTopicReply,
            (Classify, Classified(Category::OnTopic)) => Retrieve,
            (ManipulationReply | OffTopicReply, Replied) => AppendHistory,

            (Retrieve, Retrieved) => Generate,
            (Retrieve, Exhausted) => Fallback,
            (Generate, Generated) => Validate,
            (Validate, Passed) => Accept,
            (Validate, Failed) => Retry,
            (Validate, Exhausted) => Fallback,
            (Retry, RetryAttempt) => Generate,
            (Accept | Fallback, Answered) => AppendHistory,

            (AppendHistory, Appended) => Trim,
            (Trim, Trimmed) => Done,

            (from, event) => {
                return Err(AssistantError::InvalidTransition {
                    from: format!("{:?}", from),
                    event: format!("{:?}", event),
                });
            }
        };

        Ok(next_state)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PipelineState::Start => "start",
            PipelineState::Rewrite => "rewrite",
            PipelineState::Classify => "classify",
            PipelineState::ManipulationReply => "manipulation_reply",
            PipelineState::OffTopicReply => "off_topic_reply",
            PipelineState::Retrieve => "retrieve",
            PipelineState::Generate => "generate",
            PipelineState::Validate => "validate",
            PipelineState::Accept => "accept",
            PipelineState::Retry => "retry",
            PipelineState::Fallback => "fallback",
            PipelineState::AppendHistory => "append_history",
            PipelineState::Trim => "trim",
            PipelineState::Done => "done",
        }
    }
}

/// Walks one turn through the state machine and remembers the path
#[derive(Debug, Clone)]
pub struct TurnMachine {
    state: PipelineState,
    path: Vec<PipelineState>,
}

impl TurnMachine {
    pub fn new() -> Self {
        Self {
            state: PipelineState::Start,
            path: vec![PipelineState::Start],
        }
    }

    /// Apply an event, staying put on an invalid one
    pub fn fire(&mut self, event: StateEvent) -> Result<PipelineState> {
        let next = self.state.transition(event)?;
        self.state = next;
        self.path.push(next);
        Ok(next)
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// States visited so far, starting with `Start`
    pub fn path(&self) -> &[PipelineState] {
        &self.path
    }

    /// Compact "a > b > c" form for logs
    pub fn path_string(&self) -> String {
        self.path
            .iter()
            .map(PipelineState::display_name)
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

impl Default for TurnMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PipelineState::*;
    use StateEvent::*;

    fn walk(events: &[StateEvent]) -> Result<TurnMachine> {
        let mut machine = TurnMachine::new();
        for event in events {
            machine.fire(*event)?;
        }
        Ok(machine)
    }

    #[test]
    fn test_refusal_path() {
        let machine = walk(&[
            Begin,
            Rewritten,
            Classified(Category::OffTopic),
            Replied,
            Appended,
            Trimmed,
        ])
        .unwrap();
        assert_eq!(
            machine.path(),
            &[Start, Rewrite, Classify, OffTopicReply, AppendHistory, Trim, Done]
        );
        assert_eq!(machine.state(), Done);
    }

    #[test]
    fn test_retry_then_accept_path() {
        let machine = walk(&[
            Begin,
            Rewritten,
            Classified(Category::OnTopic),
            Retrieved,
            Generated,
            Failed,
            RetryAttempt,
            Generated,
            Passed,
            Answered,
            Appended,
            Trimmed,
        ])
        .unwrap();
        assert_eq!(machine.state(), Done);
        assert_eq!(
            machine.path_string(),
            "start > rewrite > classify > retrieve > generate > validate > retry > generate > validate > accept > append_history > trim > done"
        );
    }

    #[test]
    fn test_zero_attempts_goes_straight_to_fallback() {
        let machine = walk(&[Begin, Rewritten, Classified(Category::OnTopic), Exhausted]).unwrap();
        assert_eq!(machine.state(), Fallback);
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        assert!(matches!(
            Start.transition(Generated),
            Err(AssistantError::InvalidTransition { .. })
        ));
        assert!(ManipulationReply.transition(Retrieved).is_err());
        assert!(Accept.transition(RetryAttempt).is_err());
        assert!(Done.transition(Begin).is_err());
    }

    #[test]
    fn test_fire_keeps_state_on_error() {
        let mut machine = TurnMachine::new();
        assert!(machine.fire(Trimmed).is_err());
        assert_eq!(machine.state(), Start);
        assert_eq!(machine.path().len(), 1);
    }
}
