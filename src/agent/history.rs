//! Bounded conversation history
//!
//! The system and developer turns that open every conversation are kept
//! apart and never evicted. Exchanges are trimmed to the newest
//! `max_pairs` user/assistant pairs.

use crate::agent::prompts;
use crate::config::DEFAULT_MAX_HISTORY_PAIRS;
use crate::types::{ChatMessage, Role};
use std::collections::VecDeque;

/// Conversation history with a protected preamble
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    /// Leading system/developer turns
    preamble: Vec<ChatMessage>,

    /// User and assistant turns, oldest first
    turns: VecDeque<ChatMessage>,

    /// Exchanges kept by `trim`
    max_pairs: usize,
}

impl ConversationHistory {
    /// Fresh history with the shop preamble
    pub fn new(max_pairs: usize) -> Self {
        Self::with_preamble(prompts::preamble().to_vec(), max_pairs)
    }

    /// History starting with a custom preamble
    pub fn with_preamble(preamble: Vec<ChatMessage>, max_pairs: usize) -> Self {
        Self {
            preamble,
            turns: VecDeque::with_capacity(max_pairs * 2 + 2),
            max_pairs,
        }
    }

    /// Record one exchange; does not trim
    pub fn append_exchange(&mut self, question: &str, answer: &str) {
        self.turns.push_back(ChatMessage::user(question));
        self.turns.push_back(ChatMessage::assistant(answer));
    }

    /// Drop the oldest turns beyond `max_pairs` exchanges; returns how many went
    pub fn trim(&mut self) -> usize {
        let max_turns = self.max_pairs * 2;
        let excess = self.turns.len().saturating_sub(max_turns);
        self.turns.drain(..excess);
        excess
    }

    /// Content of the newest assistant turn
    pub fn last_assistant_turn(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }

    /// Back to just the preamble
    pub fn reset(&mut self) {
        self.turns.clear();
    }

    pub fn preamble(&self) -> &[ChatMessage] {
        &self.preamble
    }

    /// The last `n` user/assistant turns
    pub fn last_n(&self, n: usize) -> Vec<&ChatMessage> {
        let start = self.turns.len().saturating_sub(n);
        self.turns.range(start..).collect()
    }

    /// Total messages including the preamble
    pub fn len(&self) -> usize {
        self.preamble.len() + self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// User/assistant turns only
    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY_PAIRS)
    }
}
