//! Type definitions module
//!
//! Core types for model communication and pipeline results.

pub mod messages;
pub mod pipeline;

// Re-export commonly used types
pub use messages::{ChatMessage, Role};
pub use pipeline::{Category, Outcome, PipelineResult};
