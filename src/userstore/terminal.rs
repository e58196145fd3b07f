//! Terminal interaction: output, screen clearing and the keypress pause.
//!
//! The session only talks to a [`Terminal`]. [`ConsoleTerminal`] is the
//! real one; [`RecordingTerminal`] captures output and never blocks, so
//! whole sessions can run in tests.

use crate::commands::{CmdMessage, MessageLevel};
use colored::Colorize;
use console::Term;
use std::io::BufRead;

const PAUSE_PROMPT: &str = "\nPresione una tecla para continuar . . .";

pub trait Terminal {
    fn clear(&mut self);

    /// Blocks until the user acknowledges.
    fn pause(&mut self);

    fn emit(&mut self, message: &CmdMessage);

    fn emit_all(&mut self, messages: &[CmdMessage]) {
        for message in messages {
            self.emit(message);
        }
    }
}

pub struct ConsoleTerminal {
    term: Term,
    pause_enabled: bool,
}

impl ConsoleTerminal {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
            pause_enabled: true,
        }
    }

    /// Turns the pause into a no-op, for unattended runs.
    pub fn without_pause(mut self) -> Self {
        self.pause_enabled = false;
        self
    }

    fn wait_for_key(&self) -> std::io::Result<()> {
        if self.term.is_term() {
            self.term.read_key().map(|_| ())
        } else {
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| ())
        }
    }
}

impl Default for ConsoleTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for ConsoleTerminal {
    fn clear(&mut self) {
        if !self.term.is_term() {
            return;
        }
        if let Err(e) = self.term.clear_screen() {
            tracing::debug!("could not clear screen: {}", e);
        }
    }

    fn pause(&mut self) {
        if !self.pause_enabled {
            return;
        }
        println!("{}", PAUSE_PROMPT);
        if let Err(e) = self.wait_for_key() {
            tracing::debug!("pause interrupted: {}", e);
        }
    }

    fn emit(&mut self, message: &CmdMessage) {
        let line = message.to_string();
        match message.level {
            MessageLevel::Info => println!("{}", line),
            MessageLevel::Success => println!("{}", line.green()),
            MessageLevel::Warning => println!("{}", line.yellow()),
            MessageLevel::Error => println!("{}", line.red()),
        }
    }
}

/// Keeps every emitted line and counts clears and pauses.
#[derive(Debug, Default)]
pub struct RecordingTerminal {
    pub lines: Vec<String>,
    pub messages: Vec<CmdMessage>,
    pub clears: usize,
    pub pauses: usize,
}

impl RecordingTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> String {
        self.lines.join("\n")
    }

    pub fn errors(&self) -> Vec<&CmdMessage> {
        self.messages
            .iter()
            .filter(|m| m.level == MessageLevel::Error)
            .collect()
    }
}

impl Terminal for RecordingTerminal {
    fn clear(&mut self) {
        self.clears += 1;
    }

    fn pause(&mut self) {
        self.pauses += 1;
    }

    fn emit(&mut self, message: &CmdMessage) {
        self.lines.push(message.to_string());
        self.messages.push(message.clone());
    }
}
