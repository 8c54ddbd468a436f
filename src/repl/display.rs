//! Terminal output for the chat
//!
//! Spinner while the pipeline works, colored answers and notices

use crate::types::{Category, Outcome, PipelineResult};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Owns the spinner and prints everything the REPL shows
pub struct DisplayManager {
    current_bar: Option<ProgressBar>,
    update_interval: Duration,
}

impl DisplayManager {
    pub fn new() -> Self {
        DisplayManager {
            current_bar: None,
            update_interval: Duration::from_millis(100),
        }
    }

    /// Show welcome banner
    pub fn show_banner(&self, version: &str, mode: &str, model: &str) {
        let width = 64;
        println!("\n{}", "=".repeat(width).green());
        println!(
            "{}",
            format!("  ShopBuddy {} - asystent sklepu 'Zielony Doom'", version)
                .bold()
                .green()
        );
        println!("{}", format!("  Tryb: {} | Model: {}", mode, model).dimmed());
        println!("{}\n", "=".repeat(width).green());
        println!(
            "Zadaj pytanie o rośliny ({} - lista poleceń, {} - wyjście)\n",
            "/help".green(),
            "/exit".green()
        );
    }

    /// Spinner shown while a question is being answered
    pub fn start_thinking(&mut self) -> ProgressBar {
        self.finish_current();

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Szukam odpowiedzi...");
        pb.enable_steady_tick(self.update_interval);

        self.current_bar = Some(pb.clone());
        pb
    }

    /// Finish current spinner
    pub fn finish_current(&mut self) {
        if let Some(pb) = self.current_bar.take() {
            pb.finish_and_clear();
        }
    }

    /// Print the answer; with `details` also how it was produced
    pub fn show_answer(&mut self, result: &PipelineResult, details: bool) {
        self.finish_current();

        let label = match result.category {
            Category::OnTopic if !result.outcome.is_fallback() => "Bot:".green().bold(),
            Category::OnTopic => "Bot:".yellow().bold(),
            Category::OffTopic | Category::Manipulation => "Bot:".red().bold(),
        };
        println!("{} {}", label, result.answer);

        if details {
            println!("{}", format_details(result).dimmed());
        }
        println!();
    }

    /// Non-fatal problem worth telling the user about
    pub fn show_warning(&mut self, warning: &str) {
        self.finish_current();
        println!("{} {}", "Uwaga:".yellow().bold(), warning.yellow());
    }
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}

/// One-line summary of a pipeline result
pub fn format_details(result: &PipelineResult) -> String {
    let score = result
        .score
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    let outcome = match result.outcome {
        Outcome::Accepted => "accepted",
        Outcome::BestEffort => "best effort",
        Outcome::SafeFallback => "safe fallback",
        Outcome::GenericFallback => "generic fallback",
        Outcome::Refused => "refused",
    };
    format!(
        "  [{} | {} | score {} | attempts {} | query: {}]",
        result.category, outcome, score, result.attempts, result.rewritten_query
    )
}
