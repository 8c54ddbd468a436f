//! Line input for the chat, backed by rustyline
//!
//! Questions typed in earlier sessions are available with the arrow keys
//! when a history file is configured.

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::{Path, PathBuf};

/// Prompt shown before each question
pub const DEFAULT_PROMPT: &str = "Ty: ";

/// Line editor with optional on-disk history
pub struct InputHandler {
    editor: DefaultEditor,
    history_file: Option<PathBuf>,
    prompt: String,
}

impl InputHandler {
    pub fn new() -> Result<Self> {
        Ok(InputHandler {
            editor: DefaultEditor::new().context("failed to initialize line editor")?,
            history_file: None,
            prompt: DEFAULT_PROMPT.to_string(),
        })
    }

    /// Editor that loads `file` now and writes it back on [`save_history`](Self::save_history)
    pub fn with_history(file: PathBuf) -> Result<Self> {
        let mut handler = Self::new()?;
        // A missing or corrupt file starts an empty history
        if file.is_file() {
            let _ = handler.editor.load_history(&file);
        }
        handler.history_file = Some(file);
        Ok(handler)
    }

    /// Next trimmed line
    ///
    /// `Ok(None)` means end of input (Ctrl-D). Ctrl-C abandons the line
    /// being typed and yields an empty string, which the REPL skips.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        let line = match self.editor.readline(&self.prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => return Ok(Some(String::new())),
            Err(ReadlineError::Eof) => return Ok(None),
            Err(err) => return Err(err).context("terminal input failed"),
        };

        let line = line.trim();
        if !line.is_empty() {
            let _ = self.editor.add_history_entry(line);
        }
        Ok(Some(line.to_string()))
    }

    /// Write history to the configured file, creating its directory
    pub fn save_history(&mut self) -> Result<()> {
        let Some(file) = self.history_file.as_deref() else {
            return Ok(());
        };
        ensure_parent(file)?;
        self.editor
            .save_history(file)
            .with_context(|| format!("cannot save history to {}", file.display()))
    }
}

fn ensure_parent(file: &Path) -> Result<()> {
    match file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create {}", dir.display())),
        _ => Ok(()),
    }
}
