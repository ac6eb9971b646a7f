//! Note domain model.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - `title` is non-blank after trim.
//! - `parent_id` never equals `id`. Deeper cycles are rejected by the service.

use crate::model::folder::FolderId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a note.
pub type NoteId = Uuid;

/// Title used when a note is created without a usable one.
pub const DEFAULT_NOTE_TITLE: &str = "New note";

/// A titled markdown document, optionally nested and optionally foldered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    /// Raw markdown source.
    pub content: String,
    /// `None` means root-level note.
    pub parent_id: Option<NoteId>,
    pub folder_id: Option<FolderId>,
    /// Epoch ms, assigned by storage. Zero until persisted.
    pub created_at: i64,
    /// Epoch ms, assigned by storage. Zero until persisted.
    pub updated_at: i64,
}

impl Note {
    /// Creates a root-level note with a generated stable ID.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title, content)
    }

    /// Creates a note with a caller-provided stable ID.
    pub fn with_id(id: NoteId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            content: content.into(),
            parent_id: None,
            folder_id: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Returns whether this note sits at the top of the hierarchy.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Checks the invariants that can be verified without storage access.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.title.trim().is_empty() {
            return Err(NoteValidationError::BlankTitle);
        }
        if self.parent_id == Some(self.id) {
            return Err(NoteValidationError::SelfParent(self.id));
        }
        Ok(())
    }
}

/// Violations reported by [`Note::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    BlankTitle,
    SelfParent(NoteId),
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "note title must not be blank"),
            Self::SelfParent(id) => write!(f, "note {id} cannot be its own parent"),
        }
    }
}

impl Error for NoteValidationError {}
