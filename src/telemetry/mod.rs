//! Telemetry for ShopBuddy sessions
//!
//! Collects per-turn pipeline events and running counters for `/stats`.

use crate::types::{Category, Outcome};
use chrono::{DateTime, Local};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Pipeline event types
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    TurnStarted {
        question: String,
        timestamp: Instant,
    },
    Classified {
        category: Category,
        rewritten: bool,
        timestamp: Instant,
    },
    Retrieved {
        facts: usize,
        top_score: Option<f32>,
        timestamp: Instant,
    },
    AttemptScored {
        attempt: usize,
        score: u8,
        timestamp: Instant,
    },
    FallbackUsed {
        outcome: Outcome,
        timestamp: Instant,
    },
    TurnCompleted {
        outcome: Outcome,
        duration_ms: u64,
        timestamp: Instant,
    },
}

/// Running session counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub turns: usize,
    pub on_topic: usize,
    pub off_topic: usize,
    pub manipulation: usize,
    pub attempts: usize,
    pub accepted: usize,
    pub fallbacks: usize,
}

/// Telemetry collector
///
/// Cheap to clone; clones share the same event log.
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<PipelineEvent>>>,
    stats: Arc<Mutex<PipelineStats>>,
    start_time: Instant,
    started_at: DateTime<Local>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(PipelineStats::default())),
            start_time: Instant::now(),
            started_at: Local::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: PipelineEvent) {
        {
            let mut stats = lock(&self.stats);
            match &event {
                PipelineEvent::TurnStarted { .. } => stats.turns += 1,
                PipelineEvent::Classified { category, .. } => match category {
                    Category::OnTopic => stats.on_topic += 1,
                    Category::OffTopic => stats.off_topic += 1,
                    Category::Manipulation => stats.manipulation += 1,
                },
                PipelineEvent::Retrieved { .. } => {}
                PipelineEvent::AttemptScored { .. } => stats.attempts += 1,
                PipelineEvent::FallbackUsed { .. } => stats.fallbacks += 1,
                PipelineEvent::TurnCompleted { outcome, .. } => {
                    if *outcome == Outcome::Accepted {
                        stats.accepted += 1;
                    }
                }
            }
        }

        lock(&self.events).push(event);
    }

    /// Get current statistics
    pub fn get_stats(&self) -> PipelineStats {
        lock(&self.stats).clone()
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Mean turn latency in ms and mean best retrieval score, from the event log
    fn averages(&self) -> (Option<u64>, Option<f32>) {
        let events = lock(&self.events);
        let durations: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::TurnCompleted { duration_ms, .. } => Some(*duration_ms),
                _ => None,
            })
            .collect();
        let top_scores: Vec<f32> = events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::Retrieved { top_score, .. } => *top_score,
                _ => None,
            })
            .collect();

        let mean_ms = (!durations.is_empty())
            .then(|| durations.iter().sum::<u64>() / durations.len() as u64);
        let mean_score = (!top_scores.is_empty())
            .then(|| top_scores.iter().sum::<f32>() / top_scores.len() as f32);
        (mean_ms, mean_score)
    }

    /// Share of on-topic turns that ended with an accepted answer
    pub fn acceptance_rate(&self) -> f64 {
        let stats = lock(&self.stats);
        if stats.on_topic == 0 {
            1.0
        } else {
            stats.accepted as f64 / stats.on_topic as f64
        }
    }

    /// Clear events and counters
    pub fn reset(&self) {
        lock(&self.events).clear();
        *lock(&self.stats) = PipelineStats::default();
    }

    /// Multi-line summary for the REPL
    pub fn summary(&self) -> String {
        let stats = self.get_stats();
        let elapsed = self.elapsed();
        let (mean_ms, mean_score) = self.averages();

        let mut out = String::new();
        out.push_str("Session Summary\n");
        out.push_str("─────────────────────────────────────\n");
        out.push_str(&format!("Started:           {}\n", self.started_at.format("%Y-%m-%d %H:%M:%S")));
        out.push_str(&format!("Duration:          {}s\n", elapsed.as_secs()));
        out.push_str(&format!("Questions:         {}\n", stats.turns));
        out.push_str(&format!(
            "Categories:        {} on / {} off / {} manipulation\n",
            stats.on_topic, stats.off_topic, stats.manipulation
        ));
        out.push_str(&format!("Attempts:          {}\n", stats.attempts));
        out.push_str(&format!("Acceptance rate:   {:.1}%\n", self.acceptance_rate() * 100.0));
        out.push_str(&format!("Fallbacks:         {}\n", stats.fallbacks));
        if let Some(ms) = mean_ms {
            out.push_str(&format!("Avg turn time:     {}ms\n", ms));
        }
        if let Some(score) = mean_score {
            out.push_str(&format!("Avg top match:     {:.3}\n", score));
        }
        out
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}
