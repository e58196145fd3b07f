//! # Storage Layer
//!
//! Each persisted format is a [`DocumentStore`]: it knows how to load, save
//! and initialize a document of its own type. The document type implements
//! [`Roster`], the record-level capabilities the session needs (listing,
//! update, append, remove).
//!
//! ## Implementations
//!
//! - [`json::JsonStore`]: a JSON object with a `"usuarios"` array. Records are
//!   looked up by key.
//! - [`xml::XmlStore`]: a root element with `<usuario>` children. Records are
//!   looked up by child element.
//!
//! Both keep the whole document in memory, not just the records, so content
//! the tool does not understand is written back untouched.
//!
//! ## Format Differences
//!
//! The two formats intentionally disagree in a few places:
//!
//! | Behavior              | JSON                      | XML                     |
//! |-----------------------|---------------------------|-------------------------|
//! | initialize            | parse and re-serialize    | byte copy               |
//! | remove by id          | every match               | first match only        |
//! | failed init / load    | abort the session         | fall back to empty doc  |
//!
//! The last row is exposed as [`DocumentStore::recovery`].

use crate::error::{FileRole, Result, StoreError};
use crate::model::{FormatKind, User, UserView};
use std::fs;
use std::path::Path;
use uuid::Uuid;

pub mod json;
pub mod xml;

/// Record-level operations over a loaded document.
pub trait Roster {
    /// The records in document order, or `None` when the document has no
    /// user collection at all.
    fn users(&self) -> Option<Vec<UserView>>;

    /// Set the age of the first record with `id`. Returns whether a record
    /// matched.
    fn update_age(&mut self, id: i64, edad: i64) -> bool;

    /// Add `user` at the end of the collection. Returns false if the
    /// document has no place to hold it.
    fn append(&mut self, user: &User) -> bool;

    /// Remove records with `id`. Returns how many were removed.
    fn remove(&mut self, id: i64) -> usize;
}

/// What a session does when initialization or loading fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPolicy {
    /// Stop the session.
    Abort,
    /// Keep going with whatever working file exists, or an empty document.
    FallBackToEmpty,
}

pub trait DocumentStore {
    type Document: Roster;

    fn kind(&self) -> FormatKind;

    fn recovery(&self) -> RecoveryPolicy;

    /// Read and parse the document at `path`.
    fn load(&self, path: &Path) -> Result<Self::Document>;

    /// Replace the file at `path` with `doc`.
    fn save(&self, path: &Path, doc: &Self::Document) -> Result<()>;

    /// Validate `origin` and copy it to `destination`.
    fn initialize(&self, origin: &Path, destination: &Path) -> Result<()>;

    /// A document with an empty user collection.
    fn empty_document(&self) -> Self::Document;
}

/// Reads the raw bytes of a document, mapping absence to `MissingFile`.
pub(crate) fn read_document(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(StoreError::missing(path, FileRole::Working));
    }
    fs::read(path).map_err(StoreError::Io)
}

/// Writes `content` to a temporary sibling of `path` and renames it into
/// place.
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let tmp_file = dir.join(format!(".{}-{}.tmp", file_name, Uuid::new_v4()));

    let written = fs::write(&tmp_file, content).and_then(|()| fs::rename(&tmp_file, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_file);
        return Err(StoreError::Io(e));
    }
    tracing::debug!(path = %path.display(), bytes = content.len(), "document written");
    Ok(())
}
