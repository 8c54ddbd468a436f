//! Command-line argument parsing for ShopBuddy
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ShopBuddy - grounded shop assistant for 'Zielony Doom'
#[derive(Parser, Debug)]
#[command(name = "shopbuddy")]
#[command(version)]
#[command(about = "Retrieval-grounded plant shop assistant", long_about = None)]
pub struct Args {
    /// Configuration file path (default: ~/.shopbuddy/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only in the log)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Force debug mode regardless of the configuration
    #[arg(long, global = true)]
    pub debug: bool,

    /// Subcommand (chat when omitted)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start interactive chat
    Chat,

    /// Answer one question and exit
    Ask {
        /// The question, in Polish
        question: String,
    },

    /// Show the facts retrieved for a query, with scores
    Retrieve {
        query: String,

        /// Number of facts
        #[arg(short, long, default_value_t = 5)]
        k: usize,
    },

    /// Display the resolved configuration (API keys masked)
    Config,

    /// Write a default configuration file
    InitConfig,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Subcommand to run, chat when none was given
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Chat)
    }
}

impl Verbosity {
    /// Default tracing filter when RUST_LOG is not set
    ///
    /// Debug mode raises normal verbosity to debug.
    pub fn log_filter(&self, debug_mode: bool) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal if debug_mode => "debug",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "debug",
            Verbosity::VeryVerbose => "trace",
        }
    }

    /// Check if answers should carry pipeline details
    pub fn show_details(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }
}
