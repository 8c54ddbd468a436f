//! Chat model access
//!
//! - `ChatModel` trait: the opaque completion service the pipeline calls
//! - `OpenAiCompatClient`: LM Studio / OpenAI HTTP implementation
//! - `TimedModel`: per-call deadline wrapper

pub mod client;
pub mod types;

// Re-export key types for convenience
pub use client::{ChatModel, OpenAiCompatClient, TimedModel};
