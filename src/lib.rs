//! ShopBuddy - grounded shop assistant for 'Zielony Doom'
//!
//! Answers customer questions about plants, care, delivery and returns
//! strictly from a fixed knowledge base, refusing off-topic and
//! manipulative questions.
//!
//! # Architecture
//!
//! - **memory**: knowledge corpus and sentence embeddings
//! - **rag**: cosine retrieval and context building
//! - **agent**: rewriter, classifier, generator, state machine, sessions
//! - **validation**: groundedness scoring and retry policy
//! - **models**: OpenAI-compatible chat client with timeouts
//! - **repl** / **cli**: interactive chat and command-line surface

pub mod errors;
pub mod config;
pub mod types;
pub mod models;
pub mod memory;
pub mod rag;
pub mod agent;
pub mod validation;
pub mod telemetry;
pub mod repl;
pub mod cli;

// Re-export commonly used types
pub use agent::{ResponsePipeline, Session};
pub use errors::{AssistantError, Result};
