//! Slash commands available in the chat
//!
//! Everything starting with `/` is a command; anything else is a question
//! for the assistant.

use crate::agent::Session;
use crate::types::Role;
use anyhow::Result;
use colored::*;

/// Messages shown by `/history` without an argument
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Built-in chat commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    /// Start a new conversation
    Reset,
    History { limit: Option<usize> },
    Stats,
    Exit,
    Unknown { input: String },
}

/// Aliases, argument hint and help line per command, in help order
const COMMAND_TABLE: &[(&[&str], &str, &str)] = &[
    (&["help", "h", "pomoc"], "", "Pokaż tę listę"),
    (&["reset", "new"], "", "Zacznij nową rozmowę"),
    (&["history"], "[n]", "Ostatnie n wiadomości (domyślnie 10)"),
    (&["stats", "status"], "", "Statystyki tej rozmowy"),
    (&["exit", "quit", "q"], "", "Zakończ"),
];

fn lookup(name: &str, arg: Option<&str>) -> Option<Command> {
    let (aliases, _, _) = COMMAND_TABLE.iter().find(|(aliases, _, _)| aliases.contains(&name))?;
    Some(match aliases[0] {
        "help" => Command::Help,
        "reset" => Command::Reset,
        "history" => Command::History {
            limit: arg.and_then(|s| s.parse().ok()),
        },
        "stats" => Command::Stats,
        _ => Command::Exit,
    })
}

/// Parses and runs slash commands against a session
#[derive(Debug, Default)]
pub struct CommandHandler;

impl CommandHandler {
    pub fn new() -> Self {
        CommandHandler
    }

    /// Parse a line; anything unrecognised is [`Command::Unknown`]
    pub fn parse(&self, input: &str) -> Command {
        let unknown = || Command::Unknown {
            input: input.to_string(),
        };

        let Some(body) = input.trim().strip_prefix('/') else {
            return unknown();
        };
        let mut words = body.split_whitespace();
        let Some(name) = words.next() else {
            return unknown();
        };

        lookup(&name.to_lowercase(), words.next()).unwrap_or_else(unknown)
    }

    /// Run a command; `Ok(false)` ends the chat
    pub fn execute(&mut self, command: Command, session: &mut Session) -> Result<bool> {
        match command {
            Command::Help => self.show_help(),
            Command::Exit => {
                println!("{}", "Do zobaczenia!".green());
                return Ok(false);
            }
            Command::Reset => {
                session.reset();
                println!("{}", "Nowa rozmowa. Historia wyczyszczona.".yellow());
            }
            Command::History { limit } => {
                self.show_history(session, limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
            }
            Command::Stats => println!("\n{}", session.telemetry().summary().cyan()),
            Command::Unknown { input } => {
                println!("{} {}", "Nieznane polecenie:".red(), input);
                println!("Wpisz {} aby zobaczyć listę poleceń", "/help".cyan());
            }
        }
        Ok(true)
    }

    fn show_help(&self) {
        println!("\n{}", "Polecenia:".bold().cyan());
        for (aliases, hint, description) in COMMAND_TABLE {
            let names = aliases
                .iter()
                .map(|a| format!("/{}", a))
                .collect::<Vec<_>>()
                .join(", ");
            let usage = format!("{} {}", names, hint);
            println!("  {:<28} {}", usage.trim_end().green(), description);
        }
        println!(
            "\nPytania wpisuj bez ukośnika. {} kończy rozmowę, {} czyści linię.\n",
            "Ctrl-D".cyan(),
            "Ctrl-C".cyan()
        );
    }

    /// Print the newest conversation turns
    fn show_history(&self, session: &Session, limit: usize) {
        let turns = session.history().last_n(limit);
        if turns.is_empty() {
            println!("{}", "Brak wiadomości.".yellow());
            return;
        }

        println!("\n{}", format!("Ostatnie wiadomości ({}):", turns.len()).bold().cyan());
        for message in turns {
            let who = match message.role {
                Role::User => "Ty: ".green(),
                Role::Assistant => "Bot:".cyan(),
                Role::System | Role::Developer => "Sys:".dimmed(),
            };
            println!("  {} {}", who, message.content);
        }
        println!();
    }
}

/// True for lines addressed to the REPL rather than the assistant
pub fn is_command(input: &str) -> bool {
    input.trim_start().starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slash_lines_are_commands() {
        assert!(is_command(" /stats"));
        assert!(!is_command("Jak podlewać monsterę?"));
    }

    #[test]
    fn test_aliases() {
        let handler = CommandHandler::new();
        assert_eq!(handler.parse("/pomoc"), Command::Help);
        assert_eq!(handler.parse("/new"), Command::Reset);
        assert_eq!(handler.parse("/status"), Command::Stats);
        assert_eq!(handler.parse("/EXIT"), Command::Exit);
        assert_eq!(handler.parse("/quit"), Command::Exit);
    }

    #[test]
    fn test_history_limit_argument() {
        let handler = CommandHandler::new();
        assert_eq!(handler.parse("/history"), Command::History { limit: None });
        assert_eq!(handler.parse("/history 4"), Command::History { limit: Some(4) });
        assert_eq!(handler.parse("/history abc"), Command::History { limit: None });
    }

    #[test]
    fn test_unrecognised_lines() {
        let handler = CommandHandler::new();
        assert!(matches!(handler.parse("/files"), Command::Unknown { .. }));
        assert!(matches!(handler.parse("/"), Command::Unknown { .. }));
        assert!(matches!(handler.parse("monstera"), Command::Unknown { .. }));
    }

    #[test]
    fn test_every_table_entry_parses() {
        let handler = CommandHandler::new();
        for (aliases, _, _) in COMMAND_TABLE {
            for alias in *aliases {
                let command = handler.parse(&format!("/{}", alias));
                assert!(!matches!(command, Command::Unknown { .. }), "/{} unknown", alias);
            }
        }
    }
}
