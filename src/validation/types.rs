//! Validation system type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Groundedness score of an answer, always within 0..=10
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationScore(u8);

impl ValidationScore {
    /// Highest possible score
    pub const MAX: u8 = 10;

    /// Score assumed when the validator cannot produce one
    pub const NEUTRAL: ValidationScore = ValidationScore(5);

    /// Create a score, clamping to 0..=10
    pub fn new(value: u64) -> Self {
        Self(value.min(Self::MAX as u64) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// True when the score reaches `threshold`
    pub fn meets(&self, threshold: u8) -> bool {
        self.0 >= threshold
    }
}

impl fmt::Display for ValidationScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}
