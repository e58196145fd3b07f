//! # Command Layer
//!
//! The record editor: update, append and remove over any [`Roster`]
//! document. Each command mutates the document in place and returns a
//! [`CmdResult`] describing what happened.
//!
//! Commands never print. The session turns the returned messages into
//! terminal output, which keeps every command testable against an in-memory
//! document.
//!
//! - [`update`]: set the age of the first record with a given id
//! - [`append`]: add a record at the end of the collection
//! - [`remove`]: remove records by id (per-format semantics)
//!
//! A command whose target does not exist changes nothing and returns no
//! message.
//!
//! [`Roster`]: crate::store::Roster

use serde::Serialize;
use std::fmt;

pub mod append;
pub mod remove;
pub mod update;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// Error messages are shown with an `ERROR` prefix.
impl fmt::Display for CmdMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            MessageLevel::Error => write!(f, "ERROR {}", self.content),
            _ => write!(f, "{}", self.content),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    /// Number of records touched.
    pub affected: usize,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_affected(mut self, affected: usize) -> Self {
        self.affected = affected;
        self
    }
}
