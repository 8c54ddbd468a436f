//! Answer validation and retry orchestration
//! Scores answers for groundedness and decides which answer the user gets

pub mod types;
pub mod validator;
pub mod orchestrator;

pub use types::ValidationScore;
pub use validator::{parse_score, GroundednessValidator};
pub use orchestrator::{BestCandidate, OrchestrationResult, ValidationOrchestrator, BEST_EFFORT_FLOOR};
