//! Conversational agent
//!
//! Pipeline components, the per-turn state machine, conversation history
//! and the session that ties them together.

pub mod classifier;
pub mod generator;
pub mod history;
pub mod orchestrator;
pub mod prompts;
pub mod rewriter;
pub mod state;

// Re-export commonly used types
pub use classifier::{normalize_category, TopicClassifier};
pub use generator::AnswerGenerator;
pub use history::ConversationHistory;
pub use orchestrator::{ResponsePipeline, Session};
pub use rewriter::QueryRewriter;
pub use state::{PipelineState, StateEvent, TurnMachine};
