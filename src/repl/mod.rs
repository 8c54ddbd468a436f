//! REPL (Read-Eval-Print Loop) module for interactive chat
//!
//! Reads questions, hands them to a [`Session`], and prints the answers.
//! Lines starting with `/` are built-in commands.

pub mod commands;
pub mod display;
pub mod input;

use anyhow::Result;
use std::path::PathBuf;
use tracing::debug;

use crate::agent::Session;
use crate::repl::commands::{is_command, CommandHandler};
pub use crate::repl::display::DisplayManager;
use crate::repl::input::InputHandler;

/// REPL session coordinator
pub struct ReplSession {
    input_handler: InputHandler,
    command_handler: CommandHandler,
    display_manager: DisplayManager,
    session: Session,
    show_details: bool,
}

impl ReplSession {
    /// Create REPL session around a conversation
    pub fn new(session: Session) -> Result<Self> {
        Ok(Self::assemble(InputHandler::new()?, session))
    }

    /// Create REPL session with persistent input history
    pub fn with_history(session: Session, history_path: PathBuf) -> Result<Self> {
        Ok(Self::assemble(InputHandler::with_history(history_path)?, session))
    }

    fn assemble(input_handler: InputHandler, session: Session) -> Self {
        ReplSession {
            input_handler,
            command_handler: CommandHandler::new(),
            display_manager: DisplayManager::new(),
            session,
            show_details: false,
        }
    }

    /// Print category, score and attempts under each answer
    pub fn set_show_details(&mut self, enable: bool) {
        self.show_details = enable;
    }

    pub fn show_welcome(&self, version: &str, mode: &str, model: &str) {
        self.display_manager.show_banner(version, mode, model);
    }

    /// Run until `/exit` or EOF
    pub async fn run(&mut self) -> Result<()> {
        loop {
            let Some(line) = self.input_handler.read_line()? else {
                break;
            };
            if !self.handle_input(&line).await? {
                break;
            }
        }

        if let Err(e) = self.save() {
            self.display_manager.show_warning(&format!("{:#}", e));
        }
        Ok(())
    }

    /// Handle user input (command or question)
    ///
    /// Returns true if session should continue, false to exit
    pub async fn handle_input(&mut self, input: &str) -> Result<bool> {
        if input.trim().is_empty() {
            return Ok(true);
        }

        if is_command(input) {
            let command = self.command_handler.parse(input);
            debug!(?command, "repl command");
            return self.command_handler.execute(command, &mut self.session);
        }

        self.display_manager.start_thinking();
        let result = self.session.respond(input.trim()).await;
        self.display_manager.show_answer(&result, self.show_details);
        Ok(true)
    }

    /// Save input history
    pub fn save(&mut self) -> Result<()> {
        self.input_handler.save_history()
    }
}
