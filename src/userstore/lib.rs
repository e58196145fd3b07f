//! # Userstore Architecture
//!
//! Userstore keeps a short list of users (`id`, `nombre`, `edad`) in a JSON
//! or an XML file and walks it through a fixed editing session: initialize
//! the working file from an origin, load it, show it, update a record, append
//! one, remove one, and save.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (main.rs, args.rs)                                     │
//! │  - Parses arguments, loads config, installs logging         │
//! │  - Picks the formats to run and the real terminal           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Session (session.rs)                                       │
//! │  - The linear state machine, generic over store + terminal  │
//! │  - Turns errors into console reports, decides on aborts     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Commands (commands/*.rs) and Presenter (presenter.rs)      │
//! │  - Update, append, remove over any `Roster` document        │
//! │  - Return messages and lines, never print                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage (store/)                                           │
//! │  - `DocumentStore` trait: load, save, initialize            │
//! │  - JsonStore, XmlStore                                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only the terminal implementations write to stdout. Everything below the
//! session returns `Result` or plain data.
//!
//! ## Testing
//!
//! Stores are tested against temp directories, commands and the presenter
//! against in-memory documents, and whole sessions with a
//! [`terminal::RecordingTerminal`] whose pause is a no-op.
//!
//! ## Module Overview
//!
//! - [`session`]: the session state machine
//! - [`store`]: storage abstraction and the JSON/XML implementations
//! - [`commands`]: the record editor
//! - [`presenter`]: listing rendering
//! - [`terminal`]: console output, clear and pause
//! - [`config`]: run configuration
//! - [`model`]: `User` and format types
//! - [`error`]: error types

pub mod commands;
pub mod config;
pub mod error;
pub mod model;
pub mod presenter;
pub mod session;
pub mod store;
pub mod terminal;
